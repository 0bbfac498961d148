//! `mirrorbot pages` — synchronize wiki pages across all configured sites.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mirrorbot_core::config::Config;

use super::{build_orchestrator, lookback_date, print_reports, resolve_config_path};

/// Arguments for `mirrorbot pages`.
#[derive(Args, Debug)]
pub struct PagesArgs {
    /// Explicit titles to synchronize. Falls back to the config's `pages`
    /// list, then to titles discovered from yesterday's recent changes.
    pub titles: Vec<String>,

    /// Path to the config file (default: ./config.json, then
    /// ~/.mirrorbot/config.json).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl PagesArgs {
    pub fn run(self) -> Result<()> {
        let path = resolve_config_path(self.config)?;
        let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;
        let orchestrator = build_orchestrator(&config);

        let titles: Vec<String> = if !self.titles.is_empty() {
            self.titles
        } else if let Some(pages) = config.pages.clone() {
            pages.into_iter().filter(|t| !t.trim().is_empty()).collect()
        } else {
            let date = lookback_date()?;
            tracing::info!("discovering pages changed on {date}");
            orchestrator
                .discover_changed_pages(date)
                .into_iter()
                .map(|record| record.title)
                .collect()
        };

        if titles.is_empty() {
            println!("No recently changed pages; nothing to do.");
            return Ok(());
        }

        let reports = orchestrator.sync_pages(&titles);
        print_reports(&reports);
        Ok(())
    }
}
