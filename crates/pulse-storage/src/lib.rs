//! Storage layer for the review-pulse pipeline.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for reviews, records, topics, and day status
//! - Date-prefixed keys for efficient range scans
//! - Atomic per-day commits via WriteBatch (a day's records, its touched
//!   canonical topics, and its terminal status land together or not at all)
//! - Idempotent, existence-checked record writes (no duplicate credit for
//!   the same (review, canonical topic) pair)
//! - Batch-date and (topic, date) secondary index entries

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
