//! Trend matrix aggregation.
//!
//! Groups consolidated records by (canonical name, date) and pivots into
//! a dense matrix: one row per topic, one column per date in the window,
//! zero-filled for absent combinations. Rows sort descending by the most
//! recent date's count, then by window total, then by name, so output is
//! reproducible regardless of record insertion order.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use pulse_types::ConsolidatedRecord;

/// One topic's counts across the window.
#[derive(Debug, Clone, Serialize)]
pub struct TopicTrendRow {
    /// Canonical topic name
    pub canonical_name: String,
    /// One count per date in the window, zero-filled
    pub counts: Vec<u64>,
    /// Sum of counts over the window
    pub total: u64,
}

impl TopicTrendRow {
    /// Count on the most recent date of the window.
    pub fn latest(&self) -> u64 {
        self.counts.last().copied().unwrap_or(0)
    }
}

/// Dense (topics x dates) mention-count matrix for a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct TrendMatrix {
    /// First date of the window (inclusive)
    pub start_date: NaiveDate,
    /// Last date of the window (inclusive); the "trending now" column
    pub end_date: NaiveDate,
    /// Every date in the window, in order; dense, never sparse
    pub dates: Vec<NaiveDate>,
    /// Topic rows, sorted by most-recent-day count desc, total desc, name
    pub rows: Vec<TopicTrendRow>,
}

impl TrendMatrix {
    /// Build the matrix for `[target_date - window_days + 1, target_date]`.
    ///
    /// Records outside the window are ignored. Zero records in the window
    /// yields an empty matrix, a valid value rather than an error.
    pub fn build(
        records: &[ConsolidatedRecord],
        target_date: NaiveDate,
        window_days: u32,
    ) -> Self {
        let start_date = target_date - Duration::days(window_days as i64 - 1);
        let width = window_days as usize;

        let dates: Vec<NaiveDate> = (0..window_days)
            .map(|offset| start_date + Duration::days(offset as i64))
            .collect();

        let mut counts_by_topic: HashMap<&str, Vec<u64>> = HashMap::new();
        for record in records {
            if record.date < start_date || record.date > target_date {
                continue;
            }
            let index = (record.date - start_date).num_days() as usize;
            counts_by_topic
                .entry(record.canonical_name.as_str())
                .or_insert_with(|| vec![0; width])[index] += 1;
        }

        let mut rows: Vec<TopicTrendRow> = counts_by_topic
            .into_iter()
            .map(|(name, counts)| {
                let total = counts.iter().sum();
                TopicTrendRow {
                    canonical_name: name.to_string(),
                    counts,
                    total,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.latest()
                .cmp(&a.latest())
                .then(b.total.cmp(&a.total))
                .then(a.canonical_name.cmp(&b.canonical_name))
        });

        Self {
            start_date,
            end_date: target_date,
            dates,
            rows,
        }
    }

    /// Whether the window held no records at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total mentions across all cells.
    pub fn total_mentions(&self) -> u64 {
        self.rows.iter().map(|r| r.total).sum()
    }

    /// Top `n` topics by total frequency over the window.
    pub fn top_overall(&self, n: usize) -> Vec<(&str, u64)> {
        let mut by_total: Vec<&TopicTrendRow> = self.rows.iter().collect();
        by_total.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then(a.canonical_name.cmp(&b.canonical_name))
        });
        by_total
            .into_iter()
            .take(n)
            .map(|row| (row.canonical_name.as_str(), row.total))
            .collect()
    }

    /// Top `n` topics by the most recent day's count ("trending now").
    pub fn trending_now(&self, n: usize) -> Vec<(&str, u64)> {
        // Rows are already sorted by the most recent day's count.
        self.rows
            .iter()
            .take(n)
            .map(|row| (row.canonical_name.as_str(), row.latest()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_types::TopicCategory;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(name: &str, date: &str) -> ConsolidatedRecord {
        ConsolidatedRecord {
            review_id: format!("r-{}-{}", name, date),
            canonical_id: format!("id-{}", name),
            canonical_name: name.to_string(),
            category: TopicCategory::Issue,
            date: day(date),
            batch_date: day(date),
            is_seed: false,
            is_new: false,
        }
    }

    #[test]
    fn test_empty_records_is_empty_matrix() {
        let matrix = TrendMatrix::build(&[], day("2025-06-03"), 3);
        assert!(matrix.is_empty());
        assert_eq!(matrix.dates.len(), 3);
        assert_eq!(matrix.total_mentions(), 0);
    }

    #[test]
    fn test_window_bounds() {
        let matrix = TrendMatrix::build(&[], day("2025-06-30"), 30);
        assert_eq!(matrix.start_date, day("2025-06-01"));
        assert_eq!(matrix.end_date, day("2025-06-30"));
        assert_eq!(matrix.dates.len(), 30);
    }

    #[test]
    fn test_zero_filled_middle_day() {
        // Three-day window with no records on day 2: the pivot has an
        // explicit zero column, not a missing one.
        let records = vec![
            record("Delivery issue", "2025-06-01"),
            record("Delivery issue", "2025-06-03"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);

        assert_eq!(matrix.dates.len(), 3);
        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.rows[0].counts, vec![1, 0, 1]);
    }

    #[test]
    fn test_cell_sum_equals_record_count_in_window() {
        let records = vec![
            record("Delivery issue", "2025-06-01"),
            record("Delivery issue", "2025-06-02"),
            record("Food quality", "2025-06-02"),
            record("Food quality", "2025-06-03"),
            record("App crash", "2025-05-20"), // outside window
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);

        let cell_sum: u64 = matrix
            .rows
            .iter()
            .flat_map(|r| r.counts.iter())
            .sum();
        assert_eq!(cell_sum, 4);
        assert_eq!(matrix.total_mentions(), 4);
    }

    #[test]
    fn test_rows_sorted_by_most_recent_day() {
        let records = vec![
            record("Quiet topic", "2025-06-01"),
            record("Quiet topic", "2025-06-01"),
            record("Quiet topic", "2025-06-01"),
            record("Hot topic", "2025-06-03"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);

        assert_eq!(matrix.rows[0].canonical_name, "Hot topic");
        assert_eq!(matrix.rows[1].canonical_name, "Quiet topic");
    }

    #[test]
    fn test_order_independence() {
        let mut records = vec![
            record("A", "2025-06-01"),
            record("B", "2025-06-02"),
            record("B", "2025-06-03"),
            record("C", "2025-06-03"),
        ];
        let forward = TrendMatrix::build(&records, day("2025-06-03"), 3);
        records.reverse();
        let backward = TrendMatrix::build(&records, day("2025-06-03"), 3);

        let names_f: Vec<&str> = forward.rows.iter().map(|r| r.canonical_name.as_str()).collect();
        let names_b: Vec<&str> = backward.rows.iter().map(|r| r.canonical_name.as_str()).collect();
        assert_eq!(names_f, names_b);
        assert_eq!(
            forward.rows[0].counts,
            backward.rows[0].counts
        );
    }

    #[test]
    fn test_top_overall_by_window_total() {
        let records = vec![
            record("A", "2025-06-01"),
            record("A", "2025-06-02"),
            record("A", "2025-06-02"),
            record("B", "2025-06-03"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);

        let top = matrix.top_overall(2);
        assert_eq!(top, vec![("A", 3), ("B", 1)]);
    }

    #[test]
    fn test_trending_now_uses_latest_day() {
        let records = vec![
            record("A", "2025-06-01"),
            record("A", "2025-06-01"),
            record("B", "2025-06-03"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);

        let trending = matrix.trending_now(1);
        assert_eq!(trending, vec![("B", 1)]);
    }

    #[test]
    fn test_top_lists_respect_n() {
        let records = vec![
            record("A", "2025-06-03"),
            record("B", "2025-06-03"),
            record("C", "2025-06-03"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);
        assert_eq!(matrix.top_overall(2).len(), 2);
        assert_eq!(matrix.trending_now(2).len(), 2);
    }
}
