//! Batch day-state types.
//!
//! A day moves Pending -> Fetched -> Extracted -> Consolidated -> Stored,
//! or straight to Skipped when it has no reviews. Only the terminal states
//! are persisted: a day commits atomically, so after a crash any
//! non-terminal day is indistinguishable from Pending and is safely
//! retried.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Processing state of a single calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    /// Not yet processed (or a prior attempt failed before commit)
    Pending,
    /// Reviews fetched from the store
    Fetched,
    /// Raw mentions extracted
    Extracted,
    /// Mentions resolved to canonical topics
    Consolidated,
    /// Records committed
    Stored,
    /// No reviews that day
    Skipped,
}

impl DayState {
    /// Terminal states are persisted; everything else is in-process only.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DayState::Stored | DayState::Skipped)
    }
}

impl std::fmt::Display for DayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DayState::Pending => "pending",
            DayState::Fetched => "fetched",
            DayState::Extracted => "extracted",
            DayState::Consolidated => "consolidated",
            DayState::Stored => "stored",
            DayState::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Persisted checkpoint for one processed day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayStatus {
    /// The calendar day this status covers
    pub date: NaiveDate,
    /// Terminal state reached
    pub state: DayState,
    /// Number of consolidated records committed for the day
    pub record_count: u64,
    /// When the terminal state was recorded
    pub updated_at: DateTime<Utc>,
}

impl DayStatus {
    /// Create a terminal status stamped now.
    pub fn new(date: NaiveDate, state: DayState, record_count: u64) -> Self {
        Self {
            date,
            state,
            record_count,
            updated_at: Utc::now(),
        }
    }
}

/// Policy for a day that already reached a terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReprocessPolicy {
    /// Refuse to reprocess; the day keeps its committed records (default)
    #[default]
    Reject,
    /// Delete the day's prior records, then reprocess
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(DayState::Stored.is_terminal());
        assert!(DayState::Skipped.is_terminal());
        assert!(!DayState::Pending.is_terminal());
        assert!(!DayState::Fetched.is_terminal());
        assert!(!DayState::Extracted.is_terminal());
        assert!(!DayState::Consolidated.is_terminal());
    }

    #[test]
    fn test_day_status_round_trip() {
        let status = DayStatus::new("2025-06-03".parse().unwrap(), DayState::Stored, 17);
        let json = serde_json::to_string(&status).unwrap();
        let parsed: DayStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state, DayState::Stored);
        assert_eq!(parsed.record_count, 17);
    }

    #[test]
    fn test_reprocess_policy_default_rejects() {
        assert_eq!(ReprocessPolicy::default(), ReprocessPolicy::Reject);
    }

    #[test]
    fn test_state_wire_form_is_snake_case() {
        let json = serde_json::to_string(&DayState::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }
}
