//! # pulse-types
//!
//! Shared domain types for the review-pulse pipeline.
//!
//! This crate defines the core data structures used throughout the system:
//! - Reviews: immutable app-store review records
//! - Topic mentions: raw LLM extractions and their consolidated forms
//! - Canonical topics: the de-duplicated, stable topic taxonomy
//! - Day states: the batch checkpoint machinery
//! - Settings: layered configuration

pub mod batch;
pub mod config;
pub mod error;
pub mod review;
pub mod topic;

pub use batch::{DayState, DayStatus, ReprocessPolicy};
pub use config::{
    ApiSettings, BatchSettings, ConsolidationSettings, ExtractionSettings, Settings, TrendSettings,
};
pub use error::PulseError;
pub use review::Review;
pub use topic::{CanonicalTopic, ConsolidatedRecord, RawTopicMention, TopicCategory};
