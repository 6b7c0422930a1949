//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Invalid embedder configuration
    #[error("Invalid embedder configuration: {0}")]
    InvalidConfig(String),

    /// Embedding generation failed
    #[error("Embedding failed: {0}")]
    Generation(String),
}
