//! Review data types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An immutable app-store review.
///
/// Owned by the read-only review store; the pipeline never mutates reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Unique review identifier from the store
    pub review_id: String,
    /// Calendar date the review was posted
    pub date: NaiveDate,
    /// Star rating, 1..=5
    pub rating: u8,
    /// Free-text review body
    pub text: String,
}

impl Review {
    /// Create a new review.
    pub fn new(
        review_id: impl Into<String>,
        date: NaiveDate,
        rating: u8,
        text: impl Into<String>,
    ) -> Self {
        Self {
            review_id: review_id.into(),
            date,
            rating,
            text: text.into(),
        }
    }

    /// Check the rating is in the valid 1..=5 range.
    pub fn has_valid_rating(&self) -> bool {
        (1..=5).contains(&self.rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_valid_rating_bounds() {
        let mut review = Review::new("r1", day("2025-06-01"), 1, "ok");
        assert!(review.has_valid_rating());
        review.rating = 5;
        assert!(review.has_valid_rating());
        review.rating = 0;
        assert!(!review.has_valid_rating());
        review.rating = 6;
        assert!(!review.has_valid_rating());
    }

    #[test]
    fn test_review_serialization_round_trip() {
        let review = Review::new("r42", day("2025-06-15"), 3, "delivery was late");
        let json = serde_json::to_string(&review).unwrap();
        let parsed: Review = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.review_id, "r42");
        assert_eq!(parsed.date, day("2025-06-15"));
        assert_eq!(parsed.rating, 3);
    }
}
