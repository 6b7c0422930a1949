//! Trend reporting error types.

use thiserror::Error;

/// Errors that can occur while writing trend report artifacts.
#[derive(Debug, Error)]
pub enum TrendsError {
    /// Filesystem error writing an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
