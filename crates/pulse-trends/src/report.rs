//! Trend report artifacts.
//!
//! Writes two files per report: a CSV pivot (one row per topic, one
//! column per date, dense) and a plain-text summary with the top-N
//! overall and trending-now lists.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::aggregate::TrendMatrix;
use crate::error::TrendsError;

/// Paths of the written artifacts.
#[derive(Debug, Clone)]
pub struct TrendReport {
    /// CSV pivot table
    pub report_path: PathBuf,
    /// Human-readable summary
    pub summary_path: PathBuf,
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(matrix: &TrendMatrix) -> String {
    let mut out = String::from("topic");
    for date in &matrix.dates {
        out.push(',');
        out.push_str(&date.to_string());
    }
    out.push('\n');

    for row in &matrix.rows {
        out.push_str(&csv_field(&row.canonical_name));
        for count in &row.counts {
            out.push(',');
            out.push_str(&count.to_string());
        }
        out.push('\n');
    }
    out
}

fn render_summary(matrix: &TrendMatrix, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str("TREND ANALYSIS SUMMARY\n");
    out.push_str("======================\n\n");
    out.push_str(&format!(
        "Date range:     {} to {}\n",
        matrix.start_date, matrix.end_date
    ));
    out.push_str(&format!("Total topics:   {}\n", matrix.rows.len()));
    out.push_str(&format!("Total mentions: {}\n\n", matrix.total_mentions()));

    out.push_str(&format!("Top {} topics (overall frequency):\n", top_n));
    for (rank, (name, count)) in matrix.top_overall(top_n).iter().enumerate() {
        out.push_str(&format!(
            "{:2}. {:<40} {:>5} mentions\n",
            rank + 1,
            name,
            count
        ));
    }

    out.push_str(&format!("\nTrending now ({}):\n", matrix.end_date));
    for (rank, (name, count)) in matrix.trending_now(top_n).iter().enumerate() {
        out.push_str(&format!(
            "{:2}. {:<40} {:>5} mentions\n",
            rank + 1,
            name,
            count
        ));
    }

    out
}

/// Write the CSV pivot and text summary into `output_dir`.
pub fn write_report(
    matrix: &TrendMatrix,
    output_dir: &Path,
    top_n: usize,
) -> Result<TrendReport, TrendsError> {
    fs::create_dir_all(output_dir)?;

    let report_path = output_dir.join(format!("trend_report_{}.csv", matrix.end_date));
    let summary_path = output_dir.join(format!("trend_summary_{}.txt", matrix.end_date));

    fs::write(&report_path, render_csv(matrix))?;
    fs::write(&summary_path, render_summary(matrix, top_n))?;

    info!(
        report = %report_path.display(),
        summary = %summary_path.display(),
        topics = matrix.rows.len(),
        "Wrote trend report"
    );

    Ok(TrendReport {
        report_path,
        summary_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_types::{ConsolidatedRecord, TopicCategory};
    use tempfile::TempDir;

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
    fn test_csv_has_header_and_zero_cells() {
        let records = vec![
            record("Delivery issue", "2025-06-01"),
            record("Delivery issue", "2025-06-03"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-03"), 3);
        let csv = render_csv(&matrix);

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("topic,2025-06-01,2025-06-02,2025-06-03"));
        assert_eq!(lines.next(), Some("Delivery issue,1,0,1"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_quotes_awkward_topic_names() {
        let records = vec![record("Pricing, fees \"hidden\"", "2025-06-01")];
        let matrix = TrendMatrix::build(&records, day("2025-06-01"), 1);
        let csv = render_csv(&matrix);
        assert!(csv.contains("\"Pricing, fees \"\"hidden\"\"\",1"));
    }

    #[test]
    fn test_summary_lists_top_topics() {
        let records = vec![
            record("Delivery issue", "2025-06-01"),
            record("Delivery issue", "2025-06-02"),
            record("App crash", "2025-06-02"),
        ];
        let matrix = TrendMatrix::build(&records, day("2025-06-02"), 2);
        let summary = render_summary(&matrix, 10);

        assert!(summary.contains("Total topics:   2"));
        assert!(summary.contains("Total mentions: 3"));
        assert!(summary.contains("Delivery issue"));
        assert!(summary.contains("Trending now (2025-06-02):"));
    }

    #[test]
    fn test_write_report_creates_both_artifacts() {
        let dir = TempDir::new().unwrap();
        let records = vec![record("Delivery issue", "2025-06-01")];
        let matrix = TrendMatrix::build(&records, day("2025-06-01"), 1);

        let report = write_report(&matrix, dir.path(), 5).unwrap();
        assert!(report.report_path.exists());
        assert!(report.summary_path.exists());

        let csv = fs::read_to_string(&report.report_path).unwrap();
        assert!(csv.starts_with("topic,2025-06-01"));
    }

    #[test]
    fn test_empty_window_writes_empty_pivot() {
        let dir = TempDir::new().unwrap();
        let matrix = TrendMatrix::build(&[], day("2025-06-03"), 3);

        let report = write_report(&matrix, dir.path(), 5).unwrap();
        let csv = fs::read_to_string(&report.report_path).unwrap();
        // Header only: an empty result, not an error.
        assert_eq!(csv.lines().count(), 1);
    }
}
