//! Hashed bag-of-features embedder for short topic names.
//!
//! Pipeline: lowercase, strip punctuation, drop English stopwords, then
//! feature-hash token unigrams (weight 1.0) and character trigrams
//! (weight 0.5) into a fixed-dimension vector with a sign bit taken from
//! the hash, and L2-normalize. Trigrams let "delayed" and "delay" share
//! mass; the sign bit keeps unrelated names near-orthogonal in
//! expectation.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

use crate::error::EmbeddingError;
use crate::model::{Embedding, TextEmbedder};

/// Default embedding dimension.
pub const DEFAULT_DIMENSION: usize = 256;

const TOKEN_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic hashing embedder for topic names.
pub struct HashingEmbedder {
    dimension: usize,
    stopwords: HashSet<String>,
}

impl HashingEmbedder {
    /// Create an embedder with the given dimension and English stopwords.
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "dimension must be > 0".to_string(),
            ));
        }
        let stopwords = get(LANGUAGE::English).into_iter().collect();
        Ok(Self {
            dimension,
            stopwords,
        })
    }

    /// Create an embedder with the default dimension.
    pub fn with_default_dimension() -> Result<Self, EmbeddingError> {
        Self::new(DEFAULT_DIMENSION)
    }

    /// Tokenize: lowercase, punctuation to spaces, drop stopwords.
    ///
    /// A name made entirely of stopwords keeps its raw tokens so it still
    /// embeds to something rather than a zero vector.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let raw: Vec<String> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();

        let filtered: Vec<String> = raw
            .iter()
            .filter(|t| !self.stopwords.contains(*t))
            .cloned()
            .collect();

        if filtered.is_empty() {
            raw
        } else {
            filtered
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a64(feature.as_bytes());
        let index = (hash % self.dimension as u64) as usize;
        let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

impl TextEmbedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in self.tokenize(text) {
            self.add_feature(&mut vector, &format!("tok:{}", token), TOKEN_WEIGHT);

            let chars: Vec<char> = token.chars().collect();
            if chars.len() >= 3 {
                for window in chars.windows(3) {
                    let gram: String = window.iter().collect();
                    self.add_feature(&mut vector, &format!("tri:{}", gram), TRIGRAM_WEIGHT);
                }
            }
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

/// FNV-1a 64-bit hash. Stable across platforms and Rust versions, unlike
/// the standard library's default hasher.
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Normalize a vector to unit length in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in v.iter_mut() {
            *val /= norm;
        }
    }
}
