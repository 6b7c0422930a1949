//! Topic extraction from review batches.
//!
//! Serializes fixed-size review chunks into an extraction prompt, calls
//! the completion client, and defensively parses the response. Parsing is
//! strict per entry (required fields, allowed categories) but lenient per
//! response (extra fields tolerated, JSON located inside surrounding
//! prose). A chunk that fails entirely contributes zero mentions and the
//! pipeline continues.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pulse_types::{ExtractionSettings, RawTopicMention, Review, TopicCategory};

use crate::error::TopicsError;
use crate::llm::CompletionClient;

/// System prompt pinning the response format.
pub const SYSTEM_PROMPT: &str = "You are an expert at analyzing app reviews \
and extracting topics. Always respond with valid JSON.";

/// Seed-topic flag heuristic: case-insensitive substring containment.
///
/// Deliberately crude: "service" inside "Service timing request" flags
/// unrelated names sharing common words. Kept as a single named rule so it
/// can be swapped for exact or embedding-based matching without touching
/// the parser.
pub fn matches_seed_topic(topic_name: &str, seed_topics: &[String]) -> bool {
    let lowered = topic_name.to_lowercase();
    seed_topics
        .iter()
        .any(|seed| lowered.contains(&seed.to_lowercase()))
}

/// Locate the first balanced `{...}` substring in model output.
///
/// String-literal and escape aware, so braces inside JSON strings do not
/// unbalance the scan. Returns None when no complete object is present.
pub fn locate_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// One topic entry as the model returns it. Unknown extra fields are
/// tolerated; the model's own `is_new` guess is ignored, since whether a
/// topic is new is decided by consolidation, not by the model.
#[derive(Debug, Deserialize)]
struct WireTopic {
    topic_name: String,
    category: String,
    review_ids: Vec<String>,
}

#[derive(Serialize)]
struct PromptReview<'a> {
    id: &'a str,
    text: &'a str,
    rating: u8,
}

/// Turns review batches into raw topic mentions via the completion client.
pub struct TopicExtractionAgent<C: CompletionClient> {
    client: C,
    settings: ExtractionSettings,
}

impl<C: CompletionClient> TopicExtractionAgent<C> {
    /// Create a new extraction agent.
    pub fn new(client: C, settings: ExtractionSettings) -> Self {
        Self { client, settings }
    }

    /// Extract raw topic mentions from one day's reviews.
    ///
    /// Degraded chunks (transport failure, unparseable output) contribute
    /// zero mentions; only [`TopicsError::Auth`] propagates, since every
    /// later call would fail the same way.
    pub async fn extract(
        &self,
        reviews: &[Review],
        batch_date: NaiveDate,
    ) -> Result<Vec<RawTopicMention>, TopicsError> {
        if reviews.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            count = reviews.len(),
            batch_date = %batch_date,
            "Extracting topics"
        );

        let chunk_count = reviews.len().div_ceil(self.settings.chunk_size);
        let mut mentions = Vec::new();

        for (index, chunk) in reviews.chunks(self.settings.chunk_size).enumerate() {
            debug!(chunk = index + 1, of = chunk_count, "Processing chunk");

            match self.process_chunk(chunk, batch_date).await {
                Ok(mut chunk_mentions) => mentions.append(&mut chunk_mentions),
                Err(TopicsError::Auth(message)) => return Err(TopicsError::Auth(message)),
                Err(e) => {
                    warn!(
                        chunk = index + 1,
                        error = %e,
                        "Chunk degraded to zero mentions"
                    );
                }
            }

            // Fixed inter-call delay to respect the external rate limit.
            tokio::time::sleep(self.settings.call_delay()).await;
        }

        info!(
            mentions = mentions.len(),
            batch_date = %batch_date,
            "Extraction complete"
        );
        Ok(mentions)
    }

    async fn process_chunk(
        &self,
        chunk: &[Review],
        batch_date: NaiveDate,
    ) -> Result<Vec<RawTopicMention>, TopicsError> {
        let prompt = self.build_prompt(chunk)?;
        let response = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        self.parse_response(&response, chunk, batch_date)
    }

    fn build_prompt(&self, chunk: &[Review]) -> Result<String, TopicsError> {
        let reviews: Vec<PromptReview<'_>> = chunk
            .iter()
            .map(|r| PromptReview {
                id: &r.review_id,
                text: &r.text,
                rating: r.rating,
            })
            .collect();
        let reviews_json =
            serde_json::to_string(&reviews).map_err(|e| TopicsError::Parse(e.to_string()))?;

        Ok(format!(
            r#"Analyze these app reviews and extract specific topics/issues/requests mentioned.

SEED TOPICS (use as reference, but identify new ones too):
{seed_topics}

REVIEWS (JSON):
{reviews_json}

INSTRUCTIONS:
1. For each review, identify ALL topics mentioned
2. Consolidate similar phrases (e.g., "late delivery", "delayed order" -> "Delivery issue")
3. Categorize as: issue, request, or feedback
4. Create clear, concise topic names (max 5 words)
5. Map each topic to review IDs where it appears

OUTPUT (Valid JSON only):
{{
  "topics": [
    {{
      "topic_name": "clear topic name",
      "category": "issue|request|feedback",
      "review_ids": ["review_id1", "review_id2"],
      "is_new": true
    }}
  ]
}}

Respond with ONLY the JSON, no other text."#,
            seed_topics = self.settings.seed_topics.join(", "),
        ))
    }

    fn parse_response(
        &self,
        response: &str,
        chunk: &[Review],
        batch_date: NaiveDate,
    ) -> Result<Vec<RawTopicMention>, TopicsError> {
        let json_str = locate_json(response)
            .ok_or_else(|| TopicsError::Parse("no JSON object in response".to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(json_str).map_err(|e| TopicsError::Parse(e.to_string()))?;
        let entries = value
            .get("topics")
            .and_then(|t| t.as_array())
            .ok_or_else(|| TopicsError::Parse("missing topics array".to_string()))?;

        let review_by_id: HashMap<&str, &Review> = chunk
            .iter()
            .map(|r| (r.review_id.as_str(), r))
            .collect();

        let mut mentions = Vec::new();
        for entry in entries {
            let topic: WireTopic = match serde_json::from_value(entry.clone()) {
                Ok(topic) => topic,
                Err(e) => {
                    warn!(error = %e, "Skipping non-conforming topic entry");
                    continue;
                }
            };

            let topic_name = topic.topic_name.trim().to_string();
            if topic_name.is_empty() {
                warn!("Skipping topic entry with empty name");
                continue;
            }

            let category = match TopicCategory::parse(&topic.category) {
                Some(category) => category,
                None => {
                    warn!(category = %topic.category, "Skipping topic entry with unknown category");
                    continue;
                }
            };

            let is_seed = matches_seed_topic(&topic_name, &self.settings.seed_topics);

            for review_id in &topic.review_ids {
                let Some(review) = review_by_id.get(review_id.as_str()) else {
                    // The model hallucinated a review id: drop the link,
                    // keep the topic's other links.
                    debug!(review_id = %review_id, "Dropping link to unknown review id");
                    continue;
                };
                mentions.push(RawTopicMention {
                    review_id: review_id.clone(),
                    topic_name: topic_name.clone(),
                    category,
                    date: review.date,
                    batch_date,
                    is_seed,
                });
            }
        }

        Ok(mentions)
    }
}
