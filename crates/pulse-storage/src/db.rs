//! RocksDB wrapper for review-pulse storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Atomic per-day commits: records, touched canonical topics, index
//!   entries, and the terminal day status in one WriteBatch
//! - Idempotent record writes keyed by (date, review_id, canonical_id)
//! - Range reads for trend aggregation and day-status inspection

use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use tracing::{debug, info};

use chrono::NaiveDate;
use pulse_types::{CanonicalTopic, ConsolidatedRecord, DayStatus, Review};

use crate::column_families::{build_cf_descriptors, CF_DAYS, CF_RECORDS, CF_REVIEWS, CF_TOPICS};
use crate::error::StorageError;
use crate::keys;

/// Counts of what the store currently holds.
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    /// Stored reviews
    pub review_count: u64,
    /// Consolidated records
    pub record_count: u64,
    /// Canonical topics
    pub topic_count: u64,
}

/// Main storage interface for review-pulse.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating it if necessary.
    ///
    /// Universal compaction suits the append-only record workload.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_compaction_style(rocksdb::DBCompactionStyle::Universal);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Iterate all (key, value) pairs under a prefix in a column family.
    fn scan_prefix<'a>(
        &'a self,
        cf: &'a ColumnFamily,
        prefix: &str,
    ) -> impl Iterator<Item = Result<(Box<[u8]>, Box<[u8]>), StorageError>> + 'a {
        let prefix_bytes = prefix.as_bytes().to_vec();
        self.db
            .iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward))
            .map(|item| item.map_err(StorageError::from))
            .take_while(move |item| match item {
                Ok((key, _)) => key.starts_with(&prefix_bytes),
                Err(_) => true,
            })
    }

    // --- Reviews ---

    /// Store a batch of reviews. Re-importing the same review overwrites
    /// it in place (reviews are immutable upstream, so this is a no-op in
    /// practice).
    pub fn put_reviews(&self, reviews: &[Review]) -> Result<u64, StorageError> {
        let reviews_cf = self.cf(CF_REVIEWS)?;
        let mut batch = WriteBatch::default();

        for review in reviews {
            let key = keys::review_key(review.date, &review.review_id);
            let value = serde_json::to_vec(review)?;
            batch.put_cf(reviews_cf, key.as_bytes(), &value);
        }

        let count = reviews.len() as u64;
        self.db.write(batch)?;
        debug!(count, "Stored reviews");
        Ok(count)
    }

    /// Fetch up to `cap` reviews for one day, ordered by review id.
    pub fn reviews_for_day(
        &self,
        date: NaiveDate,
        cap: usize,
    ) -> Result<Vec<Review>, StorageError> {
        let reviews_cf = self.cf(CF_REVIEWS)?;
        let prefix = keys::review_day_prefix(date);

        let mut reviews = Vec::new();
        for item in self.scan_prefix(reviews_cf, &prefix) {
            let (_, value) = item?;
            reviews.push(serde_json::from_slice::<Review>(&value)?);
            if reviews.len() >= cap {
                break;
            }
        }
        Ok(reviews)
    }

    // --- Day commits ---

    /// Commit one day atomically: consolidated records (with their batch
    /// and topic index entries), every canonical topic the day touched,
    /// and the terminal day status, in a single WriteBatch.
    ///
    /// Records whose (date, review_id, canonical_id) key already exists
    /// are skipped, so re-committing is idempotent. Returns the number of
    /// records actually written.
    pub fn commit_day(
        &self,
        status: &DayStatus,
        records: &[ConsolidatedRecord],
        topics: &[CanonicalTopic],
    ) -> Result<u64, StorageError> {
        let records_cf = self.cf(CF_RECORDS)?;
        let topics_cf = self.cf(CF_TOPICS)?;
        let days_cf = self.cf(CF_DAYS)?;

        let mut batch = WriteBatch::default();
        let mut written = 0u64;

        for record in records {
            let primary = keys::record_key(record.date, &record.review_id, &record.canonical_id);
            if self.db.get_cf(records_cf, primary.as_bytes())?.is_some() {
                debug!(key = %primary, "Record already exists, skipping");
                continue;
            }

            let value = serde_json::to_vec(record)?;
            batch.put_cf(records_cf, primary.as_bytes(), &value);

            let by_batch =
                keys::batch_index_key(record.batch_date, &record.review_id, &record.canonical_id);
            batch.put_cf(records_cf, by_batch.as_bytes(), primary.as_bytes());

            let by_topic =
                keys::topic_index_key(&record.canonical_name, record.date, &record.review_id);
            batch.put_cf(records_cf, by_topic.as_bytes(), b"");

            written += 1;
        }

        for topic in topics {
            let key = keys::canonical_topic_key(&topic.canonical_id);
            let value = serde_json::to_vec(topic)?;
            batch.put_cf(topics_cf, key.as_bytes(), &value);
        }

        let status_key = keys::day_status_key(status.date);
        let status_value = serde_json::to_vec(status)?;
        batch.put_cf(days_cf, status_key.as_bytes(), &status_value);

        self.db.write(batch)?;
        debug!(
            date = %status.date,
            state = %status.state,
            written,
            topics = topics.len(),
            "Committed day"
        );
        Ok(written)
    }

    /// Get the persisted status for one day, if it reached a terminal
    /// state.
    pub fn day_status(&self, date: NaiveDate) -> Result<Option<DayStatus>, StorageError> {
        let days_cf = self.cf(CF_DAYS)?;
        let key = keys::day_status_key(date);
        match self.db.get_cf(days_cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Count the records committed by one day's batch.
    pub fn day_record_count(&self, batch_date: NaiveDate) -> Result<u64, StorageError> {
        let records_cf = self.cf(CF_RECORDS)?;
        let prefix = keys::batch_day_prefix(batch_date);
        let mut count = 0u64;
        for item in self.scan_prefix(records_cf, &prefix) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Delete every record committed by one day's batch, including index
    /// entries and the day's status checkpoint. Used by the Replace
    /// reprocess policy. Returns the number of records deleted.
    pub fn delete_day_records(&self, batch_date: NaiveDate) -> Result<u64, StorageError> {
        let records_cf = self.cf(CF_RECORDS)?;
        let days_cf = self.cf(CF_DAYS)?;
        let prefix = keys::batch_day_prefix(batch_date);

        let mut batch = WriteBatch::default();
        let mut deleted = 0u64;

        for item in self.scan_prefix(records_cf, &prefix) {
            let (index_key, primary_key) = item?;

            if let Some(value) = self.db.get_cf(records_cf, &primary_key)? {
                let record: ConsolidatedRecord = serde_json::from_slice(&value)?;
                let by_topic =
                    keys::topic_index_key(&record.canonical_name, record.date, &record.review_id);
                batch.delete_cf(records_cf, by_topic.as_bytes());
            }

            batch.delete_cf(records_cf, &primary_key);
            batch.delete_cf(records_cf, &index_key);
            deleted += 1;
        }

        let status_key = keys::day_status_key(batch_date);
        batch.delete_cf(days_cf, status_key.as_bytes());

        self.db.write(batch)?;
        info!(date = %batch_date, deleted, "Deleted day records");
        Ok(deleted)
    }

    // --- Canonical topics ---

    /// Load the full canonical topic taxonomy.
    pub fn load_topics(&self) -> Result<Vec<CanonicalTopic>, StorageError> {
        let topics_cf = self.cf(CF_TOPICS)?;
        let mut topics = Vec::new();
        for item in self.scan_prefix(topics_cf, keys::CANONICAL_TOPIC_PREFIX) {
            let (_, value) = item?;
            topics.push(serde_json::from_slice::<CanonicalTopic>(&value)?);
        }
        Ok(topics)
    }

    // --- Trend reads ---

    /// Fetch all consolidated records whose review date falls in
    /// `[start, end]`, in date order.
    pub fn records_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ConsolidatedRecord>, StorageError> {
        let records_cf = self.cf(CF_RECORDS)?;
        let mut records = Vec::new();

        let mut date = start;
        while date <= end {
            let prefix = keys::record_day_prefix(date);
            for item in self.scan_prefix(records_cf, &prefix) {
                let (_, value) = item?;
                records.push(serde_json::from_slice::<ConsolidatedRecord>(&value)?);
            }
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        Ok(records)
    }

    /// Per-day mention counts for one canonical topic, via the
    /// (topic, date) index.
    pub fn topic_history(
        &self,
        canonical_name: &str,
    ) -> Result<Vec<(NaiveDate, u64)>, StorageError> {
        let records_cf = self.cf(CF_RECORDS)?;
        let prefix = keys::topic_name_prefix(canonical_name);

        let mut history: Vec<(NaiveDate, u64)> = Vec::new();
        for item in self.scan_prefix(records_cf, &prefix) {
            let (key, _) = item?;
            let date = keys::parse_topic_index_date(&key, prefix.len())?;
            match history.last_mut() {
                Some((last_date, count)) if *last_date == date => *count += 1,
                _ => history.push((date, 1)),
            }
        }
        Ok(history)
    }

    /// Count what the store holds.
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let reviews_cf = self.cf(CF_REVIEWS)?;
        let records_cf = self.cf(CF_RECORDS)?;

        let mut stats = StorageStats::default();
        for item in self.scan_prefix(reviews_cf, "rev:") {
            item?;
            stats.review_count += 1;
        }
        for item in self.scan_prefix(records_cf, "rec:") {
            item?;
            stats.record_count += 1;
        }
        stats.topic_count = self.load_topics()?.len() as u64;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_types::{DayState, TopicCategory};
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn open_temp() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn record(review_id: &str, canonical_id: &str, name: &str, date: &str) -> ConsolidatedRecord {
        ConsolidatedRecord {
            review_id: review_id.to_string(),
            canonical_id: canonical_id.to_string(),
            canonical_name: name.to_string(),
            category: TopicCategory::Issue,
            date: day(date),
            batch_date: day(date),
            is_seed: false,
            is_new: false,
        }
    }

    fn topic(canonical_id: &str, name: &str, date: &str) -> CanonicalTopic {
        CanonicalTopic::new(canonical_id, name, vec![1.0, 0.0], day(date))
    }

    #[test]
    fn test_reviews_round_trip_with_cap() {
        let (_dir, storage) = open_temp();
        let reviews: Vec<Review> = (0..5)
            .map(|i| Review::new(format!("r{}", i), day("2025-06-01"), 4, "fine"))
            .collect();
        storage.put_reviews(&reviews).unwrap();

        let all = storage.reviews_for_day(day("2025-06-01"), 100).unwrap();
        assert_eq!(all.len(), 5);

        let capped = storage.reviews_for_day(day("2025-06-01"), 3).unwrap();
        assert_eq!(capped.len(), 3);

        let other_day = storage.reviews_for_day(day("2025-06-02"), 100).unwrap();
        assert!(other_day.is_empty());
    }

    #[test]
    fn test_commit_day_is_idempotent() {
        let (_dir, storage) = open_temp();
        let records = vec![
            record("r1", "T1", "Delivery issue", "2025-06-01"),
            record("r2", "T1", "Delivery issue", "2025-06-01"),
        ];
        let topics = vec![topic("T1", "Delivery issue", "2025-06-01")];
        let status = DayStatus::new(day("2025-06-01"), DayState::Stored, 2);

        let written = storage.commit_day(&status, &records, &topics).unwrap();
        assert_eq!(written, 2);

        // Re-committing the same day writes nothing new.
        let written_again = storage.commit_day(&status, &records, &topics).unwrap();
        assert_eq!(written_again, 0);
        assert_eq!(storage.day_record_count(day("2025-06-01")).unwrap(), 2);
    }

    #[test]
    fn test_day_status_round_trip() {
        let (_dir, storage) = open_temp();
        assert!(storage.day_status(day("2025-06-01")).unwrap().is_none());

        let status = DayStatus::new(day("2025-06-01"), DayState::Skipped, 0);
        storage.commit_day(&status, &[], &[]).unwrap();

        let loaded = storage.day_status(day("2025-06-01")).unwrap().unwrap();
        assert_eq!(loaded.state, DayState::Skipped);
        assert_eq!(loaded.record_count, 0);
    }

    #[test]
    fn test_delete_day_records_clears_everything() {
        let (_dir, storage) = open_temp();
        let records = vec![
            record("r1", "T1", "Delivery issue", "2025-06-01"),
            record("r2", "T2", "Food quality issue", "2025-06-01"),
        ];
        let topics = vec![
            topic("T1", "Delivery issue", "2025-06-01"),
            topic("T2", "Food quality issue", "2025-06-01"),
        ];
        let status = DayStatus::new(day("2025-06-01"), DayState::Stored, 2);
        storage.commit_day(&status, &records, &topics).unwrap();

        let deleted = storage.delete_day_records(day("2025-06-01")).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(storage.day_record_count(day("2025-06-01")).unwrap(), 0);
        assert!(storage.day_status(day("2025-06-01")).unwrap().is_none());
        assert!(storage
            .records_in_window(day("2025-06-01"), day("2025-06-01"))
            .unwrap()
            .is_empty());
        assert!(storage.topic_history("Delivery issue").unwrap().is_empty());

        // The taxonomy itself is append-only and survives.
        assert_eq!(storage.load_topics().unwrap().len(), 2);
    }

    #[test]
    fn test_records_in_window_spans_days() {
        let (_dir, storage) = open_temp();
        for (date, review) in [("2025-06-01", "r1"), ("2025-06-02", "r2"), ("2025-06-04", "r3")] {
            let status = DayStatus::new(day(date), DayState::Stored, 1);
            storage
                .commit_day(&status, &[record(review, "T1", "Delivery issue", date)], &[])
                .unwrap();
        }

        let window = storage
            .records_in_window(day("2025-06-01"), day("2025-06-03"))
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].review_id, "r1");
        assert_eq!(window[1].review_id, "r2");
    }

    #[test]
    fn test_topic_history_counts_per_day() {
        let (_dir, storage) = open_temp();
        let records = vec![
            record("r1", "T1", "Delivery issue", "2025-06-01"),
            record("r2", "T1", "Delivery issue", "2025-06-01"),
            record("r3", "T1", "Delivery issue", "2025-06-02"),
        ];
        let status = DayStatus::new(day("2025-06-01"), DayState::Stored, 3);
        storage.commit_day(&status, &records, &[]).unwrap();

        let history = storage.topic_history("Delivery issue").unwrap();
        assert_eq!(history, vec![(day("2025-06-01"), 2), (day("2025-06-02"), 1)]);
    }

    #[test]
    fn test_topics_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let storage = Storage::open(dir.path()).unwrap();
            let status = DayStatus::new(day("2025-06-01"), DayState::Stored, 0);
            storage
                .commit_day(&status, &[], &[topic("T1", "Delivery issue", "2025-06-01")])
                .unwrap();
        }
        let storage = Storage::open(dir.path()).unwrap();
        let topics = storage.load_topics().unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].canonical_name, "Delivery issue");
    }
}
