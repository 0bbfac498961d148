//! mirrorbot — keep page and file content consistent across independently
//! editable wiki sites.
//!
//! # Usage
//!
//! ```text
//! mirrorbot pages [TITLE]... [--config <path>]
//! mirrorbot files [--config <path>]
//! ```
//!
//! Configuration errors abort before any network activity; per-title
//! failures during a batch are logged and do not abort the run.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{files::FilesArgs, pages::PagesArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mirrorbot",
    version,
    about = "Synchronize wiki pages and files across sites",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize wiki pages (explicit titles, or yesterday's changes).
    Pages(PagesArgs),

    /// Synchronize files uploaded yesterday.
    Files(FilesArgs),
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Pages(args) => args.run(),
        Commands::Files(args) => args.run(),
    }
}
