//! Deterministic feature-hashing embedder
//!
//! [`HashingEmbedder`] maps each lowercased alphanumeric token to a vector
//! bucket by FNV hash, with a hash-derived sign, then L2-normalizes the
//! accumulated counts. No model files, no network, and identical input always
//! yields the identical vector, which makes it both a usable offline provider
//! and the standard test double for the retrieval pipeline. Texts sharing
//! tokens land mass in the same buckets, so cosine similarity tracks term
//! overlap.
//!
//! Text with no tokens (empty or punctuation-only) embeds to the zero vector.

use std::hash::Hasher;

use async_trait::async_trait;
use fnv::FnvHasher;
use half::f16;

use crate::embedding::{EmbeddingBatch, EmbeddingProvider};
use crate::error::Result;

/// Default vector dimension, matching the MiniLM deployment profile.
pub const DEFAULT_HASH_DIMENSION: usize = 384;

/// Offline embedding provider built on signed feature hashing.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSION)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Hash one text into a normalized fixed-dimension vector.
    pub fn embed_sync(&self, text: &str) -> Vec<f16> {
        let mut buckets = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let mut hasher = FnvHasher::default();
            hasher.write(token.as_bytes());
            let hash: u64 = hasher.finish();
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            buckets[bucket] += sign;
        }

        let norm: f32 = buckets.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut buckets {
                *value /= norm;
            }
        }
        buckets.into_iter().map(f16::from_f32).collect()
    }
}

/// Lowercased alphanumeric tokens, in input order.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        let embeddings = texts.iter().map(|t| self.embed_sync(t)).collect();
        Ok(EmbeddingBatch::new(embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "feature-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f16], b: &[f16]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x.to_f32() * y.to_f32()).sum()
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_sync("Tuition fees are due in July.");
        let b = embedder.embed_sync("Tuition fees are due in July.");
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[test]
    fn test_normalized_unit_length() {
        let embedder = HashingEmbedder::new(64);
        let v = embedder.embed_sync("hostel mess timings");
        let norm = dot(&v, &v).sqrt();
        assert!((norm - 1.0).abs() < 0.01, "norm was {norm}");
    }

    #[test]
    fn test_token_free_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(32);
        let v = embedder.embed_sync("!!! ... ???");
        assert!(v.iter().all(|x| x.to_f32() == 0.0));
    }

    #[test]
    fn test_shared_tokens_give_positive_similarity() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_sync("tuition fee schedule");
        let b = embedder.embed_sync("tuition fee amount");
        // Two shared tokens outweigh any single-bucket collision.
        assert!(dot(&a, &b) > 0.0);

        let identical = embedder.embed_sync("tuition fee schedule");
        assert!((dot(&a, &identical) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_sync("Placement drives, every winter!");
        let b = embedder.embed_sync("placement drives every winter");
        assert_eq!(a, b);
    }

    #[test]
    fn test_async_trait_surface() {
        let embedder = HashingEmbedder::default();
        let single = tokio_test::block_on(embedder.embed_text("library hours")).unwrap();
        assert_eq!(single.len(), embedder.embedding_dimension());

        let texts = vec!["admissions open".to_string(), "fees due".to_string()];
        let batch = tokio_test::block_on(embedder.embed_texts(&texts)).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.dimension, 384);
        assert_eq!(embedder.provider_name(), "feature-hash");
    }
}
