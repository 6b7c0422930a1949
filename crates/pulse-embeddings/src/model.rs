//! Embedder trait and types.

use crate::error::EmbeddingError;

/// An embedding vector.
pub type Embedding = Vec<f32>;

/// Trait for text embedders.
///
/// Implementations must be deterministic: embedding the same text twice
/// must return the same vector, within and across process runs. Merge
/// decisions are irreversible, so a drifting embedder would silently
/// change the taxonomy.
pub trait TextEmbedder: Send + Sync {
    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed a piece of text into a unit-length vector.
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}
