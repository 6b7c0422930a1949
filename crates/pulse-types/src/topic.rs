//! Topic data types.
//!
//! A raw mention is one LLM extraction tied to one review. Consolidation
//! resolves each mention to a canonical topic, producing the append-only
//! consolidated records that trend reporting is built from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category of an extracted topic mention.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TopicCategory {
    /// A problem the reviewer experienced
    Issue,
    /// A feature or change the reviewer wants
    Request,
    /// General feedback, neither issue nor request
    Feedback,
}

impl TopicCategory {
    /// Parse from the model's lowercase wire form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "issue" => Some(TopicCategory::Issue),
            "request" => Some(TopicCategory::Request),
            "feedback" => Some(TopicCategory::Feedback),
            _ => None,
        }
    }

    /// Wire form used in persisted records and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicCategory::Issue => "issue",
            TopicCategory::Request => "request",
            TopicCategory::Feedback => "feedback",
        }
    }
}

impl std::fmt::Display for TopicCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw topic mention extracted by the model for a single review.
///
/// Transient: always passed through consolidation before storage, never
/// persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTopicMention {
    /// Review this mention is tied to
    pub review_id: String,
    /// Topic name as the model phrased it
    pub topic_name: String,
    /// issue / request / feedback
    pub category: TopicCategory,
    /// Date of the source review
    pub date: NaiveDate,
    /// Date of the batch that produced this mention
    pub batch_date: NaiveDate,
    /// Whether the name matched a seed topic (substring heuristic)
    pub is_seed: bool,
}

/// A canonical topic: the de-duplicated, stable representation of a theme.
///
/// Created once by the consolidation engine, never renamed (renames would
/// break historical trend continuity), embedding immutable. The only
/// permitted mutation is incrementing `mention_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTopic {
    /// Unique identifier (ULID)
    pub canonical_id: String,
    /// Stable display name, fixed at creation
    pub canonical_name: String,
    /// Embedding of the canonical name, fixed at creation
    pub embedding: Vec<f32>,
    /// Date of the batch whose mention created this topic
    pub first_seen: NaiveDate,
    /// Number of mentions resolved to this topic
    pub mention_count: u64,
}

impl CanonicalTopic {
    /// Create a new canonical topic from its founding mention.
    ///
    /// The founding mention counts, so `mention_count` starts at 1.
    pub fn new(
        canonical_id: impl Into<String>,
        canonical_name: impl Into<String>,
        embedding: Vec<f32>,
        first_seen: NaiveDate,
    ) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            canonical_name: canonical_name.into(),
            embedding,
            first_seen,
            mention_count: 1,
        }
    }
}

/// One persisted (review, resolved canonical topic) pair. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    /// Review the mention came from
    pub review_id: String,
    /// Canonical topic the mention resolved to
    pub canonical_id: String,
    /// Canonical name, denormalized for reporting scans
    pub canonical_name: String,
    /// issue / request / feedback
    pub category: TopicCategory,
    /// Date of the source review
    pub date: NaiveDate,
    /// Date of the batch that produced the record
    pub batch_date: NaiveDate,
    /// Seed-topic flag carried from the raw mention
    pub is_seed: bool,
    /// Whether this mention created its canonical topic
    pub is_new: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(TopicCategory::parse("issue"), Some(TopicCategory::Issue));
        assert_eq!(
            TopicCategory::parse("request"),
            Some(TopicCategory::Request)
        );
        assert_eq!(
            TopicCategory::parse("feedback"),
            Some(TopicCategory::Feedback)
        );
        assert_eq!(TopicCategory::parse("complaint"), None);
        assert_eq!(TopicCategory::parse("Issue"), None);
    }

    #[test]
    fn test_category_wire_form() {
        let json = serde_json::to_string(&TopicCategory::Request).unwrap();
        assert_eq!(json, "\"request\"");
        let parsed: TopicCategory = serde_json::from_str("\"feedback\"").unwrap();
        assert_eq!(parsed, TopicCategory::Feedback);
    }

    #[test]
    fn test_new_topic_counts_founding_mention() {
        let topic = CanonicalTopic::new(
            "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "Delivery issue",
            vec![1.0, 0.0],
            "2025-06-01".parse().unwrap(),
        );
        assert_eq!(topic.mention_count, 1);
        assert_eq!(topic.canonical_name, "Delivery issue");
    }
}
