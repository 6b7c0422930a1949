//! CLI argument parsing for the pulse binary.
//!
//! CLI flags have the highest configuration precedence; they are applied
//! on top of the loaded settings by the command handlers.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// review-pulse
///
/// App-store review topic mining: extract, consolidate, and trend.
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides ~/.config/review-pulse/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Pipeline commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a window of days: extract, consolidate, store
    Run {
        /// First day of the window (inclusive), e.g. 2025-06-01
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the window (inclusive)
        #[arg(long)]
        to: NaiveDate,

        /// Delete and reprocess days that are already stored
        #[arg(long)]
        force: bool,

        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Generate the trend report artifacts (CSV pivot + text summary)
    Report {
        /// Target date; the window trails back from here (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Window length in days (default from config)
        #[arg(long)]
        window: Option<u32>,

        /// Override database path
        #[arg(long)]
        db_path: Option<String>,

        /// Override report output directory
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Show per-day processing states over a range
    Status {
        /// First day of the range (inclusive)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the range (inclusive)
        #[arg(long)]
        to: NaiveDate,

        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Show the canonical topic taxonomy
    Topics {
        /// Show the daily history of one topic instead of the overview
        #[arg(long)]
        name: Option<String>,

        /// Maximum topics listed
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Import reviews from a JSON file into the review store
    Import {
        /// JSON file: an array of {review_id, date, rating, text}
        file: PathBuf,

        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },
}
