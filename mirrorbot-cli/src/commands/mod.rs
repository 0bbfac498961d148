//! Subcommand implementations and shared wiring.

pub mod files;
pub mod pages;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use colored::Colorize;

use mirrorbot_client::MediaWikiClient;
use mirrorbot_core::config::Config;
use mirrorbot_core::types::SyncOutcome;
use mirrorbot_engine::{Orchestrator, SiteHandle, TitleReport, TitleStatus};

/// Resolve the config path: explicit flag, then `./config.json`, then
/// `~/.mirrorbot/config.json`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let local = PathBuf::from("config.json");
    if local.exists() {
        return Ok(local);
    }
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".mirrorbot").join("config.json"))
}

/// Load the config and build the orchestrator over HTTP clients.
pub fn build_orchestrator(config: &Config) -> Orchestrator<MediaWikiClient> {
    let sites = config
        .sites()
        .into_iter()
        .map(|site| {
            let client = MediaWikiClient::new(site.clone());
            (site.id.clone(), SiteHandle { site, client })
        })
        .collect();
    Orchestrator::new(sites)
}

/// The lookback day for discovery: the previous calendar day, local time.
pub fn lookback_date() -> Result<NaiveDate> {
    Local::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .context("cannot compute the previous calendar day")
}

/// Print one line per title plus one per propagation target.
pub fn print_reports(reports: &[TitleReport]) {
    for report in reports {
        let title = &report.title;
        match &report.status {
            TitleStatus::Excluded { label } => {
                println!("{} {title} — excluded ({label})", "·".dimmed());
            }
            TitleStatus::NotFound => {
                println!("{} {title} — not found on any site", "✗".red());
            }
            TitleStatus::AlreadySynchronized { site } => {
                println!("{} {title} — already synchronized (newest on {site})", "·".dimmed());
            }
            TitleStatus::Propagated { source, outcomes } => {
                println!("{} {title} (source: {source})", "✓".green());
                for (site, outcome) in outcomes {
                    match outcome {
                        SyncOutcome::Updated => println!("  {}  {site}: updated", "✎".green()),
                        SyncOutcome::Skipped(reason) => {
                            println!("  {}  {site}: skipped ({reason})", "·".dimmed());
                        }
                        SyncOutcome::Failed(reason) => {
                            println!("  {}  {site}: failed ({reason})", "✗".red());
                        }
                    }
                }
            }
            TitleStatus::Failed { detail } => {
                println!("{} {title} — failed: {detail}", "✗".red());
            }
        }
    }

    let updated = reports
        .iter()
        .filter_map(|r| match &r.status {
            TitleStatus::Propagated { outcomes, .. } => Some(
                outcomes
                    .iter()
                    .filter(|(_, o)| matches!(o, SyncOutcome::Updated))
                    .count(),
            ),
            _ => None,
        })
        .sum::<usize>();
    println!(
        "{} title(s) processed, {} write(s)",
        reports.len(),
        updated
    );
}
