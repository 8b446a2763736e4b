//! Immutable hybrid search index over one generation of the corpus.
//!
//! A [`SearchIndex`] bundles the chunk list, the dense embedding index and
//! the TF-IDF keyword index, all addressed by the same ordinal. It is built
//! once and never mutated; the engine swaps whole generations behind an
//! `Arc`, so in-flight queries keep the generation they started on.

use chrono::{DateTime, Utc};
use half::f16;
use itertools::Itertools;

use super::chunker::Chunk;
use super::keyword_index::{KeywordIndex, TfidfConfig, TfidfModel};
use super::scoring::{self, FusionWeights, RetrievalResult};
use super::snapshot::Snapshot;
use super::vector_index::VectorIndex;
use crate::error::{Result, RetrieverError};

/// One fully-built generation of the hybrid index.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    chunks: Vec<Chunk>,
    vector: VectorIndex,
    keyword: KeywordIndex,
    weights: FusionWeights,
    fingerprint: String,
    built_at: Option<DateTime<Utc>>,
}

impl SearchIndex {
    /// A never-built placeholder that answers every search with nothing.
    pub fn empty(dimension: usize) -> Self {
        Self {
            chunks: Vec::new(),
            vector: VectorIndex::new(dimension),
            keyword: KeywordIndex::build(&[], TfidfConfig::default()),
            weights: FusionWeights::default(),
            fingerprint: String::new(),
            built_at: None,
        }
    }

    /// Assemble an index, verifying that every chunk has a row in both legs.
    pub fn new(
        chunks: Vec<Chunk>,
        vector: VectorIndex,
        keyword: KeywordIndex,
        weights: FusionWeights,
        fingerprint: String,
        built_at: DateTime<Utc>,
    ) -> Result<Self> {
        if vector.len() != chunks.len() || keyword.len() != chunks.len() {
            return Err(RetrieverError::index_build(format!(
                "index rows out of step: {} chunks, {} embeddings, {} keyword rows",
                chunks.len(),
                vector.len(),
                keyword.len()
            )));
        }
        Ok(Self {
            chunks,
            vector,
            keyword,
            weights,
            fingerprint,
            built_at: Some(built_at),
        })
    }

    /// Rebuild an index from a persisted snapshot without re-embedding.
    ///
    /// Embeddings are taken verbatim; keyword rows are re-derived by
    /// transforming the stored chunk texts under the stored model. The
    /// caller has already checked the snapshot fingerprint against the live
    /// corpus, so the model still matches the texts.
    pub fn from_snapshot(snapshot: Snapshot, weights: FusionWeights) -> Result<Self> {
        let dimension = snapshot.embeddings.first().map(|e| e.len()).unwrap_or(0);
        let vector = VectorIndex::from_rows(dimension, snapshot.embeddings)?;
        let texts: Vec<String> = snapshot.chunks.iter().map(|c| c.text.clone()).collect();
        let keyword = KeywordIndex::from_model(snapshot.tfidf_model, &texts);
        Self::new(
            snapshot.chunks,
            vector,
            keyword,
            weights,
            snapshot.fingerprint,
            snapshot.built_at,
        )
    }

    /// Run both legs, fuse by ordinal, and return the top `top_k / 2`.
    ///
    /// Each leg is capped at `top_k` candidates before fusion. The halved
    /// cut keeps only the strongest merged results; `top_k = 1` therefore
    /// returns nothing.
    pub fn hybrid_search(
        &self,
        query: &str,
        query_embedding: &[f16],
        top_k: usize,
    ) -> Vec<RetrievalResult> {
        let semantic = self.vector.search(query_embedding, top_k);
        let keyword = self.keyword.search(query, top_k);
        scoring::fuse(&semantic, &keyword, self.weights)
            .into_iter()
            .take(top_k / 2)
            .map(|c| RetrievalResult {
                chunk: self.chunks[c.ordinal].clone(),
                semantic_score: c.semantic_score,
                keyword_score: c.keyword_score,
                hybrid_score: c.hybrid_score,
                search_type: c.search_type,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Fingerprint of the corpus this index was built from; empty string
    /// for the never-built placeholder.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f16>] {
        self.vector.rows()
    }

    pub fn dimension(&self) -> usize {
        self.vector.dimension()
    }

    pub fn tfidf_model(&self) -> &TfidfModel {
        self.keyword.model()
    }

    pub fn document_count(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| c.source_filename.as_str())
            .unique()
            .count()
    }

    pub fn category_count(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| c.category.as_str())
            .unique()
            .count()
    }

    pub fn embedding_count(&self) -> usize {
        self.vector.len()
    }
}
