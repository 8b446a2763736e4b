//! Hybrid score fusion.
//!
//! Semantic and keyword search each produce `(ordinal, score)` pairs with
//! scores in [0, 1]. Fusion merges the two lists by chunk ordinal:
//!
//! - found by both legs: `hybrid = semantic_weight * s + keyword_weight * k`
//! - semantic only: `hybrid = semantic_weight * s`
//! - keyword only: `hybrid = keyword_weight * k`
//!
//! The merged list is sorted by hybrid score descending with a stable sort,
//! so equal scores keep semantic-pass insertion order.

use serde::Serialize;

use super::chunker::Chunk;

/// Default weight on the dense embedding leg.
pub const SEMANTIC_WEIGHT: f32 = 0.7;
/// Default weight on the TF-IDF leg.
pub const KEYWORD_WEIGHT: f32 = 0.3;

/// Relative weighting of the two retrieval legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub semantic: f32,
    pub keyword: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            semantic: SEMANTIC_WEIGHT,
            keyword: KEYWORD_WEIGHT,
        }
    }
}

/// Which retrieval leg(s) produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Semantic,
    Keyword,
    Hybrid,
}

/// A scored chunk returned from hybrid search.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    /// Cosine score from the embedding leg, when that leg found the chunk
    pub semantic_score: Option<f32>,
    /// Cosine score from the TF-IDF leg, when that leg found the chunk
    pub keyword_score: Option<f32>,
    pub hybrid_score: f32,
    pub search_type: SearchType,
}

/// Fusion output before chunks are attached: ordinal-addressed scores.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub ordinal: usize,
    pub semantic_score: Option<f32>,
    pub keyword_score: Option<f32>,
    pub hybrid_score: f32,
    pub search_type: SearchType,
}

/// Clamp a similarity into [0, 1]; non-finite values become 0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Merge per-leg results by ordinal into weighted hybrid candidates.
pub fn fuse(
    semantic: &[(usize, f32)],
    keyword: &[(usize, f32)],
    weights: FusionWeights,
) -> Vec<FusedCandidate> {
    let mut fused: Vec<FusedCandidate> = Vec::with_capacity(semantic.len() + keyword.len());
    let mut by_ordinal = std::collections::HashMap::with_capacity(semantic.len());

    for &(ordinal, score) in semantic {
        by_ordinal.insert(ordinal, fused.len());
        fused.push(FusedCandidate {
            ordinal,
            semantic_score: Some(score),
            keyword_score: None,
            hybrid_score: weights.semantic * score,
            search_type: SearchType::Semantic,
        });
    }

    for &(ordinal, score) in keyword {
        match by_ordinal.get(&ordinal) {
            Some(&position) => {
                let candidate = &mut fused[position];
                candidate.keyword_score = Some(score);
                candidate.hybrid_score += weights.keyword * score;
                candidate.search_type = SearchType::Hybrid;
            }
            None => fused.push(FusedCandidate {
                ordinal,
                semantic_score: None,
                keyword_score: Some(score),
                hybrid_score: weights.keyword * score,
                search_type: SearchType::Keyword,
            }),
        }
    }

    fused.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(0.5), 0.5);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
        assert_eq!(clamp_unit(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_fuse_both_legs() {
        let fused = fuse(&[(0, 0.8)], &[(0, 0.5)], FusionWeights::default());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].ordinal, 0);
        assert_eq!(fused[0].semantic_score, Some(0.8));
        assert_eq!(fused[0].keyword_score, Some(0.5));
        assert!((fused[0].hybrid_score - 0.71).abs() < 1e-6);
        assert_eq!(fused[0].search_type, SearchType::Hybrid);
    }

    #[test]
    fn test_fuse_semantic_only() {
        let fused = fuse(&[(1, 0.9)], &[], FusionWeights::default());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].keyword_score, None);
        assert!((fused[0].hybrid_score - 0.63).abs() < 1e-6);
        assert_eq!(fused[0].search_type, SearchType::Semantic);
    }

    #[test]
    fn test_fuse_keyword_only() {
        let fused = fuse(&[], &[(2, 0.5)], FusionWeights::default());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].semantic_score, None);
        assert!((fused[0].hybrid_score - 0.15).abs() < 1e-6);
        assert_eq!(fused[0].search_type, SearchType::Keyword);
    }

    #[test]
    fn test_fuse_sorts_descending() {
        let fused = fuse(&[(0, 0.5), (1, 0.9)], &[], FusionWeights::default());
        assert_eq!(fused[0].ordinal, 1);
        assert_eq!(fused[1].ordinal, 0);
    }

    #[test]
    fn test_fuse_equal_scores_keep_semantic_first() {
        // 0.7 * 0.3 and 0.3 * 0.7 are the same f32, so the stable sort
        // decides: the semantic-pass candidate stays ahead.
        let fused = fuse(&[(0, 0.3)], &[(1, 0.7)], FusionWeights::default());
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].hybrid_score, fused[1].hybrid_score);
        assert_eq!(fused[0].ordinal, 0);
        assert_eq!(fused[1].ordinal, 1);
    }

    #[test]
    fn test_search_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SearchType::Hybrid).unwrap(),
            "\"hybrid\""
        );
    }
}
