//! The topic consolidation engine.
//!
//! Resolves raw mentions against the canonical taxonomy in input order.
//! Order matters, because an earlier mention in the same batch can become
//! the canonical anchor for later ones. At or above the similarity
//! threshold a mention merges into the existing topic; below it a new
//! canonical topic is registered, irreversibly.

use std::collections::HashSet;

use tracing::{debug, info};

use pulse_types::{ConsolidatedRecord, RawTopicMention};

use crate::error::TopicsError;
use crate::store::TopicVectorStore;

/// Resolves raw mentions to consolidated records.
pub struct ConsolidationEngine {
    store: TopicVectorStore,
    similarity_threshold: f32,
}

impl ConsolidationEngine {
    /// Create an engine over the given store and threshold.
    pub fn new(store: TopicVectorStore, similarity_threshold: f32) -> Self {
        Self {
            store,
            similarity_threshold,
        }
    }

    /// The underlying vector store.
    pub fn store(&self) -> &TopicVectorStore {
        &self.store
    }

    /// Mutable access to the store, for persistence snapshots.
    pub fn store_mut(&mut self) -> &mut TopicVectorStore {
        &mut self.store
    }

    /// Replace the store wholesale. Used after a failed day commit to
    /// discard uncommitted in-memory registrations and reload from disk.
    pub fn reset_store(&mut self, store: TopicVectorStore) {
        self.store = store;
    }

    /// Consolidate a batch of raw mentions, in input order.
    ///
    /// Emits one record per (review, resolved canonical topic); a pair
    /// already emitted in this run is dropped without crediting the topic
    /// again. An empty input yields an empty output.
    pub fn consolidate(
        &mut self,
        mentions: &[RawTopicMention],
    ) -> Result<Vec<ConsolidatedRecord>, TopicsError> {
        let mut records = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for mention in mentions {
            let nearest = self.store.nearest(&mention.topic_name)?;

            let (canonical_id, canonical_name, is_new) = match nearest {
                Some(hit) if hit.similarity >= self.similarity_threshold => {
                    let pair = (mention.review_id.clone(), hit.canonical_id.clone());
                    if !seen.insert(pair) {
                        debug!(
                            review_id = %mention.review_id,
                            canonical = %hit.canonical_name,
                            "Duplicate (review, topic) pair dropped"
                        );
                        continue;
                    }
                    debug!(
                        mention = %mention.topic_name,
                        canonical = %hit.canonical_name,
                        similarity = hit.similarity,
                        "Merged mention"
                    );
                    self.store.increment(&hit.canonical_id);
                    (hit.canonical_id, hit.canonical_name, false)
                }
                _ => {
                    let topic = self
                        .store
                        .register(&mention.topic_name, mention.batch_date)?;
                    seen.insert((mention.review_id.clone(), topic.canonical_id.clone()));
                    (topic.canonical_id, topic.canonical_name, true)
                }
            };

            records.push(ConsolidatedRecord {
                review_id: mention.review_id.clone(),
                canonical_id,
                canonical_name,
                category: mention.category,
                date: mention.date,
                batch_date: mention.batch_date,
                is_seed: mention.is_seed,
                is_new,
            });
        }

        info!(
            mentions = mentions.len(),
            records = records.len(),
            topics = self.store.len(),
            "Consolidation complete"
        );
        Ok(records)
    }
}
