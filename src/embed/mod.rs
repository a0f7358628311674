//! # Embedder Trait
//!
//! The contract between the graph engine and whatever turns text into
//! vectors: a remote model, a local ONNX runtime, or the built-in
//! [`HashingEmbedder`].
//!
//! Implementations must be deterministic for identical input, otherwise
//! builds are not reproducible. Calls may be slow (network-bound); they are
//! async so a caller can cancel by dropping the future.

pub mod hashing;

use async_trait::async_trait;

pub use hashing::HashingEmbedder;

/// Why a single text could not be embedded.
///
/// During a build this is recoverable: the trace is skipped and reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmbeddingFailure {
    #[error("input has no embeddable tokens")]
    EmptyInput,

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("embedding has dimension {got}, expected {expected}")]
    Dimension { expected: usize, got: usize },

    #[error("embedding component {index} is not finite")]
    NonFinite { index: usize },
}

/// Text → fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text. The result must have length `dimension()`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingFailure>;

    /// Dimensionality of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed and check the returned length and values.
    async fn embed_checked(&self, text: &str) -> Result<Vec<f32>, EmbeddingFailure> {
        let vector = self.embed(text).await?;
        if vector.len() != self.dimension() {
            return Err(EmbeddingFailure::Dimension {
                expected: self.dimension(),
                got: vector.len(),
            });
        }
        if let Some(index) = vector.iter().position(|x| !x.is_finite()) {
            return Err(EmbeddingFailure::NonFinite { index });
        }
        Ok(vector)
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < 1e-8 || norm_b < 1e-8 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
