//! Dense embedding index with brute-force cosine search.
//!
//! Rows are f16 embeddings stored in chunk ordinal order, so a search result
//! ordinal addresses the same chunk in every sibling index. Scores are
//! clamped to [0, 1]; rows with no positive similarity never surface, which
//! keeps an irrelevant corpus from producing candidates at all.

use half::f16;

use super::scoring::clamp_unit;
use crate::error::{Result, RetrieverError};

/// Dense index: one embedding row per chunk, ordinal order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    rows: Vec<Vec<f16>>,
}

impl VectorIndex {
    /// An empty index for the given embedding dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: Vec::new(),
        }
    }

    /// Build from pre-computed rows, rejecting any row of the wrong width.
    pub fn from_rows(dimension: usize, rows: Vec<Vec<f16>>) -> Result<Self> {
        for (ordinal, row) in rows.iter().enumerate() {
            if row.len() != dimension {
                return Err(RetrieverError::index_build(format!(
                    "embedding row {ordinal} has dimension {} but the index expects {dimension}",
                    row.len()
                )));
            }
        }
        Ok(Self { dimension, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rows(&self) -> &[Vec<f16>] {
        &self.rows
    }

    /// The `limit` most similar rows to `query`, scores clamped to [0, 1].
    ///
    /// Results are `(ordinal, score)` sorted by score descending; equal
    /// scores keep ascending ordinal order. Zero-similarity rows are
    /// dropped.
    pub fn search(&self, query: &[f16], limit: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(ordinal, row)| {
                let score = clamp_unit(cosine_similarity(query, row));
                (score > 0.0).then_some((ordinal, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

/// Cosine similarity between two f16 vectors.
///
/// Returns 0.0 for mismatched lengths or a zero-norm operand.
pub fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f32::from(*x) * f32::from(*y))
        .sum();

    let norm_a: f32 = a.iter().map(|x| f32::from(*x).powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| f32::from(*x).powi(2)).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f32]) -> Vec<f16> {
        values.iter().map(|&x| f16::from_f32(x)).collect()
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = v(&[1.0, 0.0, 0.0]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = v(&[1.0, 0.0]);
        let b = v(&[0.0, 1.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        let a = v(&[1.0, 0.0]);
        let b = v(&[1.0, 0.0, 0.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = v(&[0.0, 0.0]);
        let b = v(&[1.0, 0.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_from_rows_rejects_wrong_dimension() {
        let rows = vec![v(&[1.0, 0.0, 0.0]), v(&[1.0, 0.0])];
        let err = VectorIndex::from_rows(3, rows).unwrap_err();
        assert!(err.to_string().contains("dimension 2"));
    }

    #[test]
    fn test_search_ranks_by_similarity_and_drops_zeros() {
        let index = VectorIndex::from_rows(
            2,
            vec![v(&[0.0, 1.0]), v(&[1.0, 0.0]), v(&[1.0, 1.0])],
        )
        .unwrap();

        let results = index.search(&v(&[1.0, 0.0]), 10);
        // Row 0 is orthogonal to the query and must not appear.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!((results[0].1 - 1.0).abs() < 1e-3);
        assert_eq!(results[1].0, 2);
        assert!(results[1].1 > 0.0 && results[1].1 < 1.0);
    }

    #[test]
    fn test_search_clamps_negative_similarity_away() {
        let index = VectorIndex::from_rows(2, vec![v(&[-1.0, 0.0])]).unwrap();
        assert!(index.search(&v(&[1.0, 0.0]), 10).is_empty());
    }

    #[test]
    fn test_search_respects_limit() {
        let index = VectorIndex::from_rows(
            1,
            vec![v(&[1.0]), v(&[0.5]), v(&[0.25])],
        )
        .unwrap();
        assert_eq!(index.search(&v(&[1.0]), 2).len(), 2);
    }

    #[test]
    fn test_empty_index_search() {
        let index = VectorIndex::new(384);
        assert!(index.is_empty());
        assert!(index.search(&v(&[1.0]), 10).is_empty());
    }
}
