//! Key encoding and decoding for the storage layer.
//!
//! Key formats (ISO dates are fixed-width, so lexicographic order is
//! chronological and prefix iteration gives efficient range scans):
//! - review:        `rev:{date}:{review_id}`
//! - record:        `rec:{date}:{review_id}:{canonical_id}`
//! - batch index:   `batch:{batch_date}:{review_id}:{canonical_id}`
//!   (value: the primary record key)
//! - topic index:   `topic:{canonical_name}:{date}:{review_id}`
//! - canonical:     `topic:{canonical_id}` (in the topics column family)
//! - day status:    `day:{date}`

use chrono::NaiveDate;

use crate::error::StorageError;

/// ISO date width used in every key ("2025-06-01" is 10 bytes).
const DATE_WIDTH: usize = 10;

/// Key for a stored review.
pub fn review_key(date: NaiveDate, review_id: &str) -> String {
    format!("rev:{}:{}", date, review_id)
}

/// Prefix covering all reviews for one day.
pub fn review_day_prefix(date: NaiveDate) -> String {
    format!("rev:{}:", date)
}

/// Primary key for a consolidated record.
pub fn record_key(date: NaiveDate, review_id: &str, canonical_id: &str) -> String {
    format!("rec:{}:{}:{}", date, review_id, canonical_id)
}

/// Prefix covering all records whose review date is the given day.
pub fn record_day_prefix(date: NaiveDate) -> String {
    format!("rec:{}:", date)
}

/// Secondary index key by batch date.
pub fn batch_index_key(batch_date: NaiveDate, review_id: &str, canonical_id: &str) -> String {
    format!("batch:{}:{}:{}", batch_date, review_id, canonical_id)
}

/// Prefix covering all records committed by one day's batch.
pub fn batch_day_prefix(batch_date: NaiveDate) -> String {
    format!("batch:{}:", batch_date)
}

/// Secondary index key by (canonical name, date).
pub fn topic_index_key(canonical_name: &str, date: NaiveDate, review_id: &str) -> String {
    format!("topic:{}:{}:{}", canonical_name, date, review_id)
}

/// Prefix covering one canonical topic's whole history.
pub fn topic_name_prefix(canonical_name: &str) -> String {
    format!("topic:{}:", canonical_name)
}

/// Key for a canonical topic entry.
pub fn canonical_topic_key(canonical_id: &str) -> String {
    format!("topic:{}", canonical_id)
}

/// Prefix covering all canonical topic entries.
pub const CANONICAL_TOPIC_PREFIX: &str = "topic:";

/// Key for a day-status checkpoint.
pub fn day_status_key(date: NaiveDate) -> String {
    format!("day:{}", date)
}

/// Parse a primary record key into (date, review_id, canonical_id).
///
/// review_ids may themselves contain ':' so the canonical id (a ULID,
/// colon-free) is taken from the right and the date from its fixed
/// position on the left.
pub fn parse_record_key(bytes: &[u8]) -> Result<(NaiveDate, String, String), StorageError> {
    let s = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::Key(format!("invalid UTF-8 in record key: {}", e)))?;
    let rest = s
        .strip_prefix("rec:")
        .ok_or_else(|| StorageError::Key(format!("not a record key: {}", s)))?;

    if rest.len() < DATE_WIDTH + 1 {
        return Err(StorageError::Key(format!("record key too short: {}", s)));
    }
    let (date_part, tail) = rest.split_at(DATE_WIDTH);
    let date: NaiveDate = date_part
        .parse()
        .map_err(|e| StorageError::Key(format!("bad date in record key {}: {}", s, e)))?;
    let tail = tail
        .strip_prefix(':')
        .ok_or_else(|| StorageError::Key(format!("malformed record key: {}", s)))?;

    let (review_id, canonical_id) = tail
        .rsplit_once(':')
        .ok_or_else(|| StorageError::Key(format!("malformed record key: {}", s)))?;

    Ok((date, review_id.to_string(), canonical_id.to_string()))
}

/// Parse the date component of a topic index key, given the scan prefix
/// that was used to reach it.
pub fn parse_topic_index_date(bytes: &[u8], prefix_len: usize) -> Result<NaiveDate, StorageError> {
    let s = std::str::from_utf8(bytes)
        .map_err(|e| StorageError::Key(format!("invalid UTF-8 in topic index key: {}", e)))?;
    if s.len() < prefix_len + DATE_WIDTH {
        return Err(StorageError::Key(format!("topic index key too short: {}", s)));
    }
    s[prefix_len..prefix_len + DATE_WIDTH]
        .parse()
        .map_err(|e| StorageError::Key(format!("bad date in topic index key {}: {}", s, e)))
}
