//! # pulse-trends
//!
//! Trend aggregation and report artifacts for review-pulse.
//!
//! Pure, order-independent transformations over persisted consolidated
//! records: a dense (topics x dates) pivot matrix with zero-filled cells,
//! top-N lists, and the on-disk CSV + text summary artifacts. Given the
//! same record set, output is identical regardless of insertion order.

pub mod aggregate;
pub mod error;
pub mod report;

pub use aggregate::{TopicTrendRow, TrendMatrix};
pub use error::TrendsError;
pub use report::{write_report, TrendReport};
