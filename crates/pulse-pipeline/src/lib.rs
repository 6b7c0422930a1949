//! # pulse-pipeline
//!
//! Day-by-day batch orchestration for review-pulse.
//!
//! Walks a calendar window one day at a time: fetch reviews (capped),
//! extract raw mentions, consolidate them against the canonical taxonomy,
//! and commit the day atomically. A failed day is logged and retried on a
//! later run without blocking the rest of the window, while an
//! authentication failure aborts the run early, since every subsequent
//! call would fail identically.

pub mod error;
pub mod orchestrator;

pub use error::PipelineError;
pub use orchestrator::{BatchOrchestrator, RunSummary};
