//! The batch orchestrator.
//!
//! A day is atomic from the caller's perspective: its records, the
//! canonical topics it touched, and its terminal status commit in one
//! WriteBatch, or nothing commits at all. After a failed day the
//! in-memory vector store is reloaded from disk so registrations the
//! failed day made cannot leak into later days.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use pulse_embeddings::TextEmbedder;
use pulse_storage::Storage;
use pulse_topics::{
    CompletionClient, ConsolidationEngine, TopicExtractionAgent, TopicVectorStore,
};
use pulse_types::{DayState, DayStatus, ReprocessPolicy, Settings};

use crate::error::PipelineError;

/// Outcome counts for one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Days that committed records
    pub days_processed: u64,
    /// Days with no reviews
    pub days_skipped: u64,
    /// Days refused because they were already terminal (Reject policy)
    pub days_rejected: u64,
    /// Days that failed and remain pending for retry
    pub days_failed: u64,
    /// Total records written across the run
    pub records_written: u64,
}

enum DayOutcome {
    Stored(u64),
    Skipped,
    Rejected,
}

/// Drives day-by-day processing over a calendar window.
pub struct BatchOrchestrator<C: CompletionClient> {
    storage: Arc<Storage>,
    agent: TopicExtractionAgent<C>,
    engine: ConsolidationEngine,
    embedder: Arc<dyn TextEmbedder>,
    daily_review_cap: usize,
    reprocess: ReprocessPolicy,
}

impl<C: CompletionClient> BatchOrchestrator<C> {
    /// Create an orchestrator, loading the persisted canonical taxonomy
    /// into the vector store.
    pub fn new(
        storage: Arc<Storage>,
        client: C,
        embedder: Arc<dyn TextEmbedder>,
        settings: &Settings,
    ) -> Result<Self, PipelineError> {
        let topics = storage.load_topics()?;
        info!(topics = topics.len(), "Loaded canonical taxonomy");

        let store = TopicVectorStore::from_topics(embedder.clone(), topics);
        let engine =
            ConsolidationEngine::new(store, settings.consolidation.similarity_threshold);
        let agent = TopicExtractionAgent::new(client, settings.extraction.clone());

        Ok(Self {
            storage,
            agent,
            engine,
            embedder,
            daily_review_cap: settings.batch.daily_review_cap,
            reprocess: settings.batch.reprocess,
        })
    }

    /// Process every day in `[start, end]`, one at a time.
    ///
    /// One bad day does not block the window: it is counted as failed and
    /// the loop continues. Fatal errors (authentication) abort the run
    /// immediately.
    pub async fn run(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunSummary, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        info!(start = %start, end = %end, "Starting batch run");
        let mut summary = RunSummary::default();

        let mut date = start;
        loop {
            match self.process_day(date).await {
                Ok(DayOutcome::Stored(written)) => {
                    summary.days_processed += 1;
                    summary.records_written += written;
                }
                Ok(DayOutcome::Skipped) => summary.days_skipped += 1,
                Ok(DayOutcome::Rejected) => summary.days_rejected += 1,
                Err(e) if e.is_fatal() => {
                    error!(date = %date, error = %e, "Fatal error, aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(date = %date, error = %e, "Day failed, will retry on a later run");
                    summary.days_failed += 1;
                    self.reload_store()?;
                }
            }

            if date >= end {
                break;
            }
            date = date
                .succ_opt()
                .ok_or_else(|| PipelineError::InvalidRange("date overflow".to_string()))?;
        }

        info!(
            processed = summary.days_processed,
            skipped = summary.days_skipped,
            rejected = summary.days_rejected,
            failed = summary.days_failed,
            records = summary.records_written,
            "Batch run complete"
        );
        Ok(summary)
    }

    async fn process_day(&mut self, date: NaiveDate) -> Result<DayOutcome, PipelineError> {
        if let Some(status) = self.storage.day_status(date)? {
            match self.reprocess {
                ReprocessPolicy::Reject => {
                    info!(
                        date = %date,
                        state = %status.state,
                        "Day already terminal, refusing to reprocess"
                    );
                    return Ok(DayOutcome::Rejected);
                }
                ReprocessPolicy::Replace => {
                    let deleted = self.storage.delete_day_records(date)?;
                    info!(date = %date, deleted, "Replacing previously stored day");
                }
            }
        }

        let reviews = self
            .storage
            .reviews_for_day(date, self.daily_review_cap)?;
        if reviews.is_empty() {
            let status = DayStatus::new(date, DayState::Skipped, 0);
            self.storage.commit_day(&status, &[], &[])?;
            info!(date = %date, "No reviews, day skipped");
            return Ok(DayOutcome::Skipped);
        }
        debug!(date = %date, state = %DayState::Fetched, reviews = reviews.len(), "Day advanced");

        let mentions = self.agent.extract(&reviews, date).await?;
        debug!(date = %date, state = %DayState::Extracted, mentions = mentions.len(), "Day advanced");

        let records = self.engine.consolidate(&mentions)?;
        debug!(date = %date, state = %DayState::Consolidated, records = records.len(), "Day advanced");

        let touched = self.engine.store_mut().drain_touched();
        let status = DayStatus::new(date, DayState::Stored, records.len() as u64);
        let written = self.storage.commit_day(&status, &records, &touched)?;

        info!(
            date = %date,
            state = %DayState::Stored,
            records = written,
            topics_touched = touched.len(),
            "Day committed"
        );
        Ok(DayOutcome::Stored(written))
    }

    /// Rebuild the vector store from committed state, discarding any
    /// in-memory registrations a failed day made.
    fn reload_store(&mut self) -> Result<(), PipelineError> {
        let topics = self.storage.load_topics()?;
        debug!(topics = topics.len(), "Reloaded canonical taxonomy after failure");
        self.engine
            .reset_store(TopicVectorStore::from_topics(self.embedder.clone(), topics));
        Ok(())
    }
}
