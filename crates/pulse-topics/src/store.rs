//! The canonical topic vector store.
//!
//! Holds the full canonical taxonomy in memory (a few hundred entries at
//! most) and answers nearest-neighbor queries by linear scan; no
//! approximate index is warranted at this scale. Entries are append-only:
//! an embedding is computed once at registration and never edited.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use ulid::Ulid;

use pulse_embeddings::{Embedding, TextEmbedder};
use pulse_types::CanonicalTopic;

use crate::error::TopicsError;
use crate::similarity::{cosine_similarity, similarity_ties};

/// Result of a nearest-topic query.
#[derive(Debug, Clone)]
pub struct NearestTopic {
    /// Canonical topic identifier
    pub canonical_id: String,
    /// Canonical topic name
    pub canonical_name: String,
    /// Cosine similarity of the query to this topic's embedding
    pub similarity: f32,
}

/// In-memory canonical topic store with embedding-based lookup.
pub struct TopicVectorStore {
    embedder: Arc<dyn TextEmbedder>,
    topics: Vec<CanonicalTopic>,
    /// Per-name embedding cache; embedding is a pure function of the name
    embed_cache: HashMap<String, Embedding>,
    /// Ids of topics created or incremented since the last drain
    touched: HashSet<String>,
}

impl TopicVectorStore {
    /// Create an empty store.
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self::from_topics(embedder, Vec::new())
    }

    /// Create a store seeded with previously persisted topics.
    pub fn from_topics(embedder: Arc<dyn TextEmbedder>, topics: Vec<CanonicalTopic>) -> Self {
        let embed_cache = topics
            .iter()
            .map(|t| (t.canonical_name.clone(), t.embedding.clone()))
            .collect();
        Self {
            embedder,
            topics,
            embed_cache,
            touched: HashSet::new(),
        }
    }

    /// Number of canonical topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether the store holds no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// All canonical topics, in registration order.
    pub fn topics(&self) -> &[CanonicalTopic] {
        &self.topics
    }

    fn embed_cached(&mut self, name: &str) -> Result<Embedding, TopicsError> {
        if let Some(embedding) = self.embed_cache.get(name) {
            return Ok(embedding.clone());
        }
        let embedding = self.embedder.embed(name)?;
        self.embed_cache.insert(name.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Find the canonical topic nearest to `name`, or None if the store
    /// is empty.
    ///
    /// Ties within [`crate::similarity::SIMILARITY_EPSILON`] break to the
    /// earliest `first_seen`, then the lowest `canonical_id`, so results
    /// are reproducible across runs on identical input.
    pub fn nearest(&mut self, name: &str) -> Result<Option<NearestTopic>, TopicsError> {
        if self.topics.is_empty() {
            return Ok(None);
        }

        let query = self.embed_cached(name)?;

        let mut best: Option<(usize, f32)> = None;
        for (index, topic) in self.topics.iter().enumerate() {
            let similarity = cosine_similarity(&query, &topic.embedding);
            match best {
                None => best = Some((index, similarity)),
                Some((best_index, best_similarity)) => {
                    if similarity_ties(similarity, best_similarity) {
                        let current = &self.topics[best_index];
                        let challenger = (&topic.first_seen, &topic.canonical_id);
                        let incumbent = (&current.first_seen, &current.canonical_id);
                        if challenger < incumbent {
                            best = Some((index, best_similarity.max(similarity)));
                        }
                    } else if similarity > best_similarity {
                        best = Some((index, similarity));
                    }
                }
            }
        }

        Ok(best.map(|(index, similarity)| {
            let topic = &self.topics[index];
            NearestTopic {
                canonical_id: topic.canonical_id.clone(),
                canonical_name: topic.canonical_name.clone(),
                similarity,
            }
        }))
    }

    /// Register a brand-new canonical topic named after `name`.
    ///
    /// The registration is irreversible: the entry anchors all future
    /// mentions similar enough to it.
    pub fn register(
        &mut self,
        name: &str,
        first_seen: NaiveDate,
    ) -> Result<CanonicalTopic, TopicsError> {
        let embedding = self.embed_cached(name)?;
        let canonical_id = Ulid::new().to_string();
        let topic = CanonicalTopic::new(canonical_id.clone(), name, embedding, first_seen);

        debug!(name, id = %canonical_id, "Registered canonical topic");
        self.topics.push(topic.clone());
        self.touched.insert(canonical_id);
        Ok(topic)
    }

    /// Increment a topic's mention count.
    pub fn increment(&mut self, canonical_id: &str) {
        if let Some(topic) = self
            .topics
            .iter_mut()
            .find(|t| t.canonical_id == canonical_id)
        {
            topic.mention_count += 1;
            self.touched.insert(canonical_id.to_string());
        }
    }

    /// Take a snapshot of every topic created or incremented since the
    /// last drain, clearing the touched set. The orchestrator persists
    /// exactly these entries with the day's records.
    pub fn drain_touched(&mut self) -> Vec<CanonicalTopic> {
        let ids = std::mem::take(&mut self.touched);
        self.topics
            .iter()
            .filter(|t| ids.contains(&t.canonical_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_embeddings::HashingEmbedder;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store() -> TopicVectorStore {
        let embedder: Arc<dyn TextEmbedder> =
            Arc::new(HashingEmbedder::with_default_dimension().unwrap());
        TopicVectorStore::new(embedder)
    }

    #[test]
    fn test_empty_store_has_no_nearest() {
        let mut store = store();
        assert!(store.nearest("late delivery").unwrap().is_none());
    }

    #[test]
    fn test_nearest_finds_similar_name() {
        let mut store = store();
        store.register("late delivery", day("2025-06-01")).unwrap();
        store.register("food was cold", day("2025-06-01")).unwrap();

        let nearest = store.nearest("delivery was late").unwrap().unwrap();
        assert_eq!(nearest.canonical_name, "late delivery");
        assert!(nearest.similarity > 0.99);
    }

    #[test]
    fn test_register_assigns_distinct_ids() {
        let mut store = store();
        let a = store.register("late delivery", day("2025-06-01")).unwrap();
        let b = store.register("food was cold", day("2025-06-01")).unwrap();
        assert_ne!(a.canonical_id, b.canonical_id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_tie_breaks_to_earliest_first_seen() {
        let embedder: Arc<dyn TextEmbedder> =
            Arc::new(HashingEmbedder::with_default_dimension().unwrap());
        // Two topics with identical embeddings but different first_seen.
        let embedding = embedder.embed("late delivery").unwrap();
        let older = CanonicalTopic::new("02LATER", "late delivery", embedding.clone(), day("2025-06-01"));
        let newer = CanonicalTopic::new("01EARLY", "late delivery", embedding, day("2025-06-05"));
        let mut store = TopicVectorStore::from_topics(embedder, vec![newer, older]);

        let nearest = store.nearest("late delivery").unwrap().unwrap();
        assert_eq!(nearest.canonical_id, "02LATER");
    }

    #[test]
    fn test_tie_breaks_to_lowest_id_on_same_date() {
        let embedder: Arc<dyn TextEmbedder> =
            Arc::new(HashingEmbedder::with_default_dimension().unwrap());
        let embedding = embedder.embed("late delivery").unwrap();
        let b = CanonicalTopic::new("0B", "late delivery", embedding.clone(), day("2025-06-01"));
        let a = CanonicalTopic::new("0A", "late delivery", embedding, day("2025-06-01"));
        let mut store = TopicVectorStore::from_topics(embedder, vec![b, a]);

        let nearest = store.nearest("late delivery").unwrap().unwrap();
        assert_eq!(nearest.canonical_id, "0A");
    }

    #[test]
    fn test_increment_and_drain_touched() {
        let mut store = store();
        let topic = store.register("late delivery", day("2025-06-01")).unwrap();
        store.increment(&topic.canonical_id);
        store.increment(&topic.canonical_id);

        let touched = store.drain_touched();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].mention_count, 3);

        // Drained: nothing touched until the next mutation.
        assert!(store.drain_touched().is_empty());
        store.increment(&topic.canonical_id);
        assert_eq!(store.drain_touched().len(), 1);
    }

    #[test]
    fn test_embeddings_are_cached_per_name() {
        let mut store = store();
        store.register("late delivery", day("2025-06-01")).unwrap();
        let first = store.nearest("delivery was late").unwrap().unwrap();
        let second = store.nearest("delivery was late").unwrap().unwrap();
        assert_eq!(first.similarity, second.similarity);
        assert!(store.embed_cache.contains_key("delivery was late"));
    }
}
