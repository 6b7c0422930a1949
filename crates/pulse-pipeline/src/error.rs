//! Pipeline error types.

use thiserror::Error;

/// Errors that can occur while orchestrating a batch run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] pulse_storage::StorageError),

    /// Extraction or consolidation failure
    #[error("Topics error: {0}")]
    Topics(#[from] pulse_topics::TopicsError),

    /// Invalid date range
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}

impl PipelineError {
    /// Whether this error makes every subsequent day fail identically,
    /// so the run should abort instead of degrading day by day.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Topics(pulse_topics::TopicsError::Auth(_))
        )
    }
}
