//! Retrieval engine: corpus loading, index lifecycle, search and chat.
//!
//! The engine owns one published [`SearchIndex`] generation behind
//! `RwLock<Arc<_>>`. Queries clone the `Arc` out of a read guard and search
//! an immutable structure, so a rebuild never blocks them. Rebuilds are
//! serialized by a separate mutex, construct the next generation off to the
//! side (documents, chunks, embeddings, both indexes, snapshot), and publish
//! it with a single write-lock assignment. A failed rebuild leaves the
//! published generation untouched.
//!
//! On startup [`initialize`](RetrievalEngine::initialize) consults the
//! snapshot store: a fingerprint match restores the index with no embedding
//! work, a mismatch or missing snapshot triggers a full build, and a corrupt
//! snapshot is reset and rebuilt from source.

use std::path::PathBuf;
use std::sync::Arc;

use campusqa_models::{AnswerProvider, EmbeddingBatch, EmbeddingProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::chunker::{Chunker, ChunkerConfig};
use super::corpus::{DocumentSource, SourceDocument};
use super::keyword_index::{KeywordIndex, TfidfConfig};
use super::scoring::{FusionWeights, RetrievalResult};
use super::search_index::SearchIndex;
use super::snapshot::{self, SnapshotStore};
use super::synthesis::{AnswerRecord, AnswerSynthesizer};
use super::vector_index::VectorIndex;
use crate::error::{Result, RetrieverError};

/// Configuration for a [`RetrievalEngine`].
#[derive(Debug, Clone)]
pub struct RetrievalEngineConfig {
    /// Logical corpus name, used in logs
    pub collection: String,
    /// Directory holding the snapshot database
    pub data_dir: PathBuf,
    /// Candidate budget per query; roughly twice the hybrid results returned
    pub top_k: usize,
    pub chunking: ChunkerConfig,
    pub tfidf: TfidfConfig,
    pub weights: FusionWeights,
    /// Character cap on the context handed to the answer provider
    pub max_context_chars: usize,
}

impl RetrievalEngineConfig {
    pub fn new(collection: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            collection: collection.into(),
            data_dir: data_dir.into(),
            top_k: 10,
            chunking: ChunkerConfig::default(),
            tfidf: TfidfConfig::default(),
            weights: FusionWeights::default(),
            max_context_chars: 1000,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkerConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_tfidf(mut self, tfidf: TfidfConfig) -> Self {
        self.tfidf = tfidf;
        self
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }
}

/// Point-in-time counters over the published index.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub categories: usize,
    /// Number of stored embedding rows
    pub index_size: usize,
    pub last_build_time: Option<DateTime<Utc>>,
}

/// Hybrid retrieval engine over one document corpus.
pub struct RetrievalEngine {
    config: RetrievalEngineConfig,
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
    store: SnapshotStore,
    index: RwLock<Arc<SearchIndex>>,
    rebuild_lock: Mutex<()>,
}

impl RetrievalEngine {
    /// Create an engine with a snapshot store under `config.data_dir`.
    pub async fn new(
        config: RetrievalEngineConfig,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
    ) -> Result<Self> {
        let store = SnapshotStore::open(&config.data_dir).await?;
        Ok(Self::with_store(config, source, embedder, answerer, store))
    }

    /// Create an engine with in-memory snapshot storage, for tests.
    pub async fn new_memory(
        config: RetrievalEngineConfig,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
    ) -> Result<Self> {
        let store = SnapshotStore::open_memory().await?;
        Ok(Self::with_store(config, source, embedder, answerer, store))
    }

    fn with_store(
        config: RetrievalEngineConfig,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        answerer: Arc<dyn AnswerProvider>,
        store: SnapshotStore,
    ) -> Self {
        let synthesizer =
            AnswerSynthesizer::new(answerer).with_max_context_chars(config.max_context_chars);
        let placeholder = SearchIndex::empty(embedder.embedding_dimension());
        Self {
            config,
            source,
            embedder,
            synthesizer,
            store,
            index: RwLock::new(Arc::new(placeholder)),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Load the corpus and publish an index, restoring from the snapshot
    /// when its fingerprint still matches.
    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.rebuild_lock.lock().await;

        let documents = self.source.load().await?;
        let fingerprint = snapshot::corpus_fingerprint(&documents);

        match self.store.load().await {
            Ok(Some(saved)) if saved.fingerprint == fingerprint => {
                info!(
                    collection = %self.config.collection,
                    chunks = saved.chunks.len(),
                    "snapshot matches corpus, restoring without re-embedding"
                );
                let index = SearchIndex::from_snapshot(saved, self.config.weights)?;
                self.publish(index).await;
            }
            Ok(Some(stale)) => {
                info!(
                    collection = %self.config.collection,
                    "corpus changed since last build, rebuilding"
                );
                match self.build_index(&documents, &fingerprint).await {
                    Ok(index) => self.persist_and_publish(index).await,
                    Err(e) => {
                        warn!("rebuild failed, serving the previous snapshot: {e}");
                        let index = SearchIndex::from_snapshot(stale, self.config.weights)?;
                        self.publish(index).await;
                    }
                }
            }
            Ok(None) => {
                let index = self.build_index(&documents, &fingerprint).await?;
                self.persist_and_publish(index).await;
            }
            Err(RetrieverError::CacheCorruption { message }) => {
                warn!("snapshot cache is corrupt, rebuilding from source: {message}");
                self.store.reset().await?;
                let index = self.build_index(&documents, &fingerprint).await?;
                self.persist_and_publish(index).await;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Reload the corpus and rebuild unconditionally.
    ///
    /// On failure the previously published index keeps serving.
    pub async fn rebuild(&self) -> Result<()> {
        let _guard = self.rebuild_lock.lock().await;

        let documents = self.source.load().await?;
        let fingerprint = snapshot::corpus_fingerprint(&documents);
        let index = self.build_index(&documents, &fingerprint).await?;
        self.persist_and_publish(index).await;
        Ok(())
    }

    async fn build_index(
        &self,
        documents: &[SourceDocument],
        fingerprint: &str,
    ) -> Result<SearchIndex> {
        let built_at = Utc::now();
        let chunker = Chunker::new(self.config.chunking.clone());

        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(chunker.chunk_document(document, built_at));
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let batch = if texts.is_empty() {
            EmbeddingBatch::new(Vec::new())
        } else {
            self.embedder.embed_texts(&texts).await?
        };
        if batch.len() != chunks.len() {
            return Err(RetrieverError::index_build(format!(
                "embedding batch returned {} rows for {} chunks",
                batch.len(),
                chunks.len()
            )));
        }

        let dimension = if batch.is_empty() {
            self.embedder.embedding_dimension()
        } else {
            batch.dimension
        };
        let vector = VectorIndex::from_rows(dimension, batch.embeddings)?;
        let keyword = KeywordIndex::build(&texts, self.config.tfidf.clone());
        let index = SearchIndex::new(
            chunks,
            vector,
            keyword,
            self.config.weights,
            fingerprint.to_string(),
            built_at,
        )?;

        info!(
            collection = %self.config.collection,
            documents = documents.len(),
            chunks = index.len(),
            "built search index"
        );
        Ok(index)
    }

    /// Persist the new generation, then swap it in. A save failure is
    /// logged and the index is published anyway; the next startup simply
    /// rebuilds.
    async fn persist_and_publish(&self, index: SearchIndex) {
        if let Err(e) = self.store.save(&index).await {
            warn!("failed to persist index snapshot: {e}");
        }
        self.publish(index).await;
    }

    async fn publish(&self, index: SearchIndex) {
        *self.index.write().await = Arc::new(index);
    }

    /// Hybrid search over the published index.
    ///
    /// Whitespace-only queries and a never-built or empty index short-circuit
    /// to an empty result without touching the embedding service. Returns at
    /// most `top_k / 2` results.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let index = self.index.read().await.clone();
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_text(query).await?;
        Ok(index.hybrid_search(query, &query_embedding, top_k))
    }

    /// Answer a question over the corpus.
    ///
    /// An embedding failure yields the fixed service-unavailable answer
    /// instead of an error; no candidates yields the not-found answer.
    pub async fn chat(&self, query: &str) -> Result<AnswerRecord> {
        let candidates = match self.search(query, self.config.top_k).await {
            Ok(candidates) => candidates,
            Err(e @ RetrieverError::Model { .. }) => {
                warn!("embedding service failed during chat: {e}");
                return Ok(AnswerRecord::service_unavailable());
            }
            Err(e) => return Err(e),
        };

        let record = self.synthesizer.synthesize(query, &candidates).await;
        info!(
            collection = %self.config.collection,
            confidence = record.confidence,
            sources = record.sources.len(),
            "answered chat query"
        );
        Ok(record)
    }

    /// Counters over the currently published index.
    pub async fn stats(&self) -> EngineStats {
        let index = self.index.read().await.clone();
        EngineStats {
            total_documents: index.document_count(),
            total_chunks: index.len(),
            categories: index.category_count(),
            index_size: index.embedding_count(),
            last_build_time: index.built_at(),
        }
    }

    pub fn config(&self) -> &RetrievalEngineConfig {
        &self.config
    }
}
