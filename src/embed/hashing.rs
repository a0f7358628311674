//! Local bag-of-words embedder using the hashing trick.
//!
//! Each lowercase word token is hashed (FNV-1a, stable across platforms and
//! releases) into one of `dimension` buckets; the count vector is then
//! L2-normalized. Texts sharing many words score high cosine similarity,
//! identical texts score exactly the same vector.

use async_trait::async_trait;

use super::{Embedder, EmbeddingFailure};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub const DEFAULT_DIMENSION: usize = 256;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// # Panics
    /// If `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self { dimension }
    }

    /// Synchronous core, shared by the trait impl and tests.
    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingFailure> {
        let mut vector = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
            tokens += 1;
        }

        if tokens == 0 {
            return Err(EmbeddingFailure::EmptyInput);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut vector {
            *x /= norm;
        }
        Ok(vector)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingFailure> {
        self.embed_sync(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::cosine_similarity;

    #[test]
    fn test_deterministic_and_normalized() {
        let e = HashingEmbedder::default();
        let a = e.embed_sync("Awareness includes self reflection").unwrap();
        let b = e.embed_sync("Awareness includes self reflection").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let e = HashingEmbedder::default();
        let a = e.embed_sync("Metacognition, helps!").unwrap();
        let b = e.embed_sync("metacognition helps").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_overlap_scores_higher() {
        let e = HashingEmbedder::default();
        let base = e.embed_sync("reflection requires metacognition").unwrap();
        let near = e.embed_sync("metacognition requires practice").unwrap();
        let far = e.embed_sync("emotional memory strengthens recall").unwrap();
        assert!(cosine_similarity(&base, &near) > cosine_similarity(&base, &far));
    }

    #[test]
    fn test_empty_input() {
        let e = HashingEmbedder::new(16);
        assert_eq!(e.embed_sync("  ...  "), Err(EmbeddingFailure::EmptyInput));
    }

    #[test]
    fn test_non_ascii_tokens() {
        let e = HashingEmbedder::new(64);
        let v = e.embed_sync("Осознанность включает саморефлексию").unwrap();
        assert_eq!(v.len(), 64);
    }

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
