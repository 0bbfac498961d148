//! `mirrorbot files` — synchronize files uploaded on the previous day.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mirrorbot_core::config::Config;

use super::{build_orchestrator, lookback_date, print_reports, resolve_config_path};

/// Arguments for `mirrorbot files`.
#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Path to the config file (default: ./config.json, then
    /// ~/.mirrorbot/config.json).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl FilesArgs {
    pub fn run(self) -> Result<()> {
        let path = resolve_config_path(self.config)?;
        let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;
        let orchestrator = build_orchestrator(&config);

        let date = lookback_date()?;
        tracing::info!("synchronizing files uploaded on {date}");
        let reports = orchestrator.sync_files(date);
        if reports.is_empty() {
            println!("No recently uploaded files; nothing to do.");
            return Ok(());
        }
        print_reports(&reports);
        Ok(())
    }
}
