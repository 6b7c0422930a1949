//! Command handlers for the pulse binary.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use pulse_embeddings::{HashingEmbedder, TextEmbedder};
use pulse_pipeline::BatchOrchestrator;
use pulse_storage::Storage;
use pulse_topics::{ChatApiClient, ChatApiConfig};
use pulse_trends::{write_report, TrendMatrix};
use pulse_types::{ReprocessPolicy, Review, Settings};

use crate::cli::Cli;

/// Load settings, apply CLI overrides, initialize logging, validate.
pub fn load_settings(cli: &Cli, db_path_override: Option<&str>) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(log_level) = cli.log_level.as_deref() {
        settings.log_level = log_level.to_string();
    }
    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }

    init_logging(&settings)?;
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let storage = Storage::open(&db_path).context("Failed to open storage")?;
    Ok(Arc::new(storage))
}

fn build_embedder(settings: &Settings) -> Result<Arc<dyn TextEmbedder>> {
    let embedder = HashingEmbedder::new(settings.consolidation.embedding_dimension)
        .context("Failed to build embedder")?;
    Ok(Arc::new(embedder))
}

/// Process `[from, to]` day by day.
pub async fn handle_run(
    settings: &Settings,
    from: NaiveDate,
    to: NaiveDate,
    force: bool,
) -> Result<()> {
    let mut settings = settings.clone();
    if force {
        settings.batch.reprocess = ReprocessPolicy::Replace;
    }

    let storage = open_storage(&settings)?;
    let embedder = build_embedder(&settings)?;
    let api_config =
        ChatApiConfig::from_settings(&settings.api).context("Extraction client not configured")?;
    let client = ChatApiClient::new(api_config).context("Failed to build extraction client")?;

    let mut orchestrator = BatchOrchestrator::new(storage, client, embedder, &settings)
        .context("Failed to initialize orchestrator")?;

    // The fixed inter-call delay is on the critical path: surface the
    // worst-case extraction time before committing to a long window.
    let days = (to - from).num_days().max(0) as u64 + 1;
    let calls_per_day = (settings.batch.daily_review_cap as u64)
        .div_ceil(settings.extraction.chunk_size as u64);
    let max_delay_secs =
        days * calls_per_day * settings.extraction.call_delay().as_secs();
    println!(
        "Processing {} days (up to {} model calls, at least {}s of rate-limit delay)",
        days,
        days * calls_per_day,
        max_delay_secs
    );

    let summary = orchestrator.run(from, to).await?;

    println!("Batch run complete: {} to {}", from, to);
    println!("  days processed: {}", summary.days_processed);
    println!("  days skipped:   {}", summary.days_skipped);
    println!("  days rejected:  {}", summary.days_rejected);
    println!("  days failed:    {}", summary.days_failed);
    println!("  records:        {}", summary.records_written);
    Ok(())
}

/// Build and write the trend report for a trailing window.
pub fn handle_report(
    settings: &Settings,
    date: Option<NaiveDate>,
    window: Option<u32>,
) -> Result<()> {
    let target_date = date.unwrap_or_else(|| Utc::now().date_naive());
    let window_days = window.unwrap_or(settings.trends.window_days);
    if window_days == 0 {
        anyhow::bail!("window must be > 0");
    }
    let start_date = target_date - Duration::days(window_days as i64 - 1);

    let storage = open_storage(settings)?;
    let records = storage
        .records_in_window(start_date, target_date)
        .context("Failed to read records")?;

    let matrix = TrendMatrix::build(&records, target_date, window_days);
    if matrix.is_empty() {
        // An empty window is a result, not an error.
        println!(
            "No topic records between {} and {}; nothing to report.",
            start_date, target_date
        );
        return Ok(());
    }

    let report = write_report(&matrix, &settings.output_dir(), settings.trends.top_n)
        .context("Failed to write report artifacts")?;

    println!("Trend report for {} to {}", start_date, target_date);
    println!("  topics:   {}", matrix.rows.len());
    println!("  mentions: {}", matrix.total_mentions());
    println!("  report:   {}", report.report_path.display());
    println!("  summary:  {}", report.summary_path.display());
    Ok(())
}

/// Print per-day processing states for a range.
pub fn handle_status(settings: &Settings, from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        anyhow::bail!("--from {} is after --to {}", from, to);
    }
    let storage = open_storage(settings)?;

    println!("{:<12} {:<14} {:>8}", "date", "state", "records");
    let mut date = from;
    loop {
        match storage.day_status(date)? {
            Some(status) => {
                println!(
                    "{:<12} {:<14} {:>8}",
                    date.to_string(),
                    status.state.to_string(),
                    status.record_count
                )
            }
            None => println!("{:<12} {:<14} {:>8}", date.to_string(), "pending", "-"),
        }
        if date >= to {
            break;
        }
        date = date.succ_opt().context("date overflow")?;
    }
    Ok(())
}

/// Print the canonical taxonomy, or one topic's daily history.
pub fn handle_topics(settings: &Settings, name: Option<&str>, limit: usize) -> Result<()> {
    let storage = open_storage(settings)?;

    if let Some(name) = name {
        let history = storage.topic_history(name)?;
        if history.is_empty() {
            println!("No records for topic \"{}\".", name);
            return Ok(());
        }
        println!("History for \"{}\":", name);
        for (date, count) in history {
            println!("  {}  {:>5}", date, count);
        }
        return Ok(());
    }

    let stats = storage.stats()?;
    println!(
        "{} reviews, {} records, {} canonical topics",
        stats.review_count, stats.record_count, stats.topic_count
    );

    let topics = storage.load_topics()?;
    if topics.is_empty() {
        return Ok(());
    }

    // Authoritative counts come from the append-only record log, not
    // from registration-time bookkeeping.
    let mut rows: Vec<(String, NaiveDate, u64)> = Vec::new();
    for topic in &topics {
        let total: u64 = storage
            .topic_history(&topic.canonical_name)?
            .iter()
            .map(|(_, count)| *count)
            .sum();
        rows.push((topic.canonical_name.clone(), topic.first_seen, total));
    }
    rows.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    println!("{} canonical topics ({} shown)", rows.len(), rows.len().min(limit));
    println!("{:<44} {:<12} {:>8}", "topic", "first seen", "records");
    for (name, first_seen, total) in rows.into_iter().take(limit) {
        println!("{:<44} {:<12} {:>8}", name, first_seen.to_string(), total);
    }
    Ok(())
}

/// Import reviews from a JSON array file into the review store.
pub fn handle_import(settings: &Settings, file: &Path) -> Result<()> {
    let body = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let reviews: Vec<Review> =
        serde_json::from_str(&body).context("Expected a JSON array of reviews")?;

    let (valid, invalid): (Vec<Review>, Vec<Review>) =
        reviews.into_iter().partition(|r| r.has_valid_rating());
    for review in &invalid {
        warn!(
            review_id = %review.review_id,
            rating = review.rating,
            "Skipping review with out-of-range rating"
        );
    }

    let storage = open_storage(settings)?;
    let count = storage.put_reviews(&valid).context("Failed to store reviews")?;
    info!(count, skipped = invalid.len(), "Imported reviews");

    println!(
        "Imported {} reviews ({} skipped) from {}",
        count,
        invalid.len(),
        file.display()
    );
    Ok(())
}
