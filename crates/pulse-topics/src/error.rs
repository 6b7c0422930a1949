//! Topic error types.

use thiserror::Error;

/// Errors that can occur during topic extraction and consolidation.
#[derive(Debug, Error)]
pub enum TopicsError {
    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] pulse_embeddings::EmbeddingError),

    /// Extraction API authentication failure. Fatal: every subsequent
    /// call would fail identically, so the caller should abort the run.
    #[error("Extraction API authentication failed: {0}")]
    Auth(String),

    /// Extraction API transport failure or timeout. Degraded-data: the
    /// affected chunk contributes zero mentions.
    #[error("Extraction API error: {0}")]
    Api(String),

    /// Model output could not be parsed. Degraded-data, per chunk.
    #[error("Response parse error: {0}")]
    Parse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
