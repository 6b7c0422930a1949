//! # pulse-topics
//!
//! Topic extraction and consolidation for review-pulse.
//!
//! This crate turns batches of raw reviews into consolidated topic
//! records. A model call extracts raw mentions per review; the
//! consolidation engine then resolves each mention against the canonical
//! topic taxonomy by embedding similarity, merging into an existing topic
//! or registering a new one.
//!
//! ## Features
//! - Chunked extraction with fixed inter-call delay (external rate limit)
//! - Defensive JSON location in model output (tolerates surrounding prose)
//! - Strict per-entry response validation, non-conforming entries skipped
//! - Linear-scan vector store with per-name embedding cache
//! - Deterministic merge tie-break (earliest first_seen, lowest id)

pub mod consolidate;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod similarity;
pub mod store;

pub use consolidate::ConsolidationEngine;
pub use error::TopicsError;
pub use extraction::{matches_seed_topic, TopicExtractionAgent};
pub use llm::{ChatApiClient, ChatApiConfig, CompletionClient, NoOpClient};
pub use similarity::{cosine_similarity, SIMILARITY_EPSILON};
pub use store::{NearestTopic, TopicVectorStore};
