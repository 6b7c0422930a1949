//! review-pulse CLI
//!
//! Ingests app-store reviews, extracts topic mentions with a language
//! model, consolidates them into a stable canonical taxonomy, and reports
//! daily trend counts.
//!
//! # Usage
//!
//! ```bash
//! pulse import reviews.json
//! pulse run --from 2025-06-01 --to 2025-06-30
//! pulse report --date 2025-06-30 --window 30
//! pulse status --from 2025-06-01 --to 2025-06-30
//! pulse topics
//! ```
//!
//! # Configuration
//!
//! Loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/review-pulse/config.toml)
//! 3. Environment variables (PULSE_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            ref from,
            ref to,
            force,
            ref db_path,
        } => {
            let settings = commands::load_settings(&cli, db_path.as_deref())?;
            commands::handle_run(&settings, *from, *to, force).await?;
        }
        Commands::Report {
            ref date,
            window,
            ref db_path,
            ref output_dir,
        } => {
            let mut settings = commands::load_settings(&cli, db_path.as_deref())?;
            if let Some(dir) = output_dir {
                settings.output_dir = dir.clone();
            }
            commands::handle_report(&settings, *date, window)?;
        }
        Commands::Status {
            ref from,
            ref to,
            ref db_path,
        } => {
            let settings = commands::load_settings(&cli, db_path.as_deref())?;
            commands::handle_status(&settings, *from, *to)?;
        }
        Commands::Topics {
            ref name,
            limit,
            ref db_path,
        } => {
            let settings = commands::load_settings(&cli, db_path.as_deref())?;
            commands::handle_topics(&settings, name.as_deref(), limit)?;
        }
        Commands::Import {
            ref file,
            ref db_path,
        } => {
            let settings = commands::load_settings(&cli, db_path.as_deref())?;
            commands::handle_import(&settings, file)?;
        }
    }

    Ok(())
}
