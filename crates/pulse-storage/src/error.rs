//! Storage error types.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Column family missing from the opened database
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Malformed storage key
    #[error("Key error: {0}")]
    Key(String),
}
