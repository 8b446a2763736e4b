//! Embedding provider contract and the FastEmbed-backed implementation
//!
//! [`EmbeddingProvider`] is the seam between the retrieval pipeline and
//! whatever produces dense vectors. The production implementation here wraps
//! [`fastembed`]'s ONNX runtime; a deterministic offline implementation lives
//! in [`crate::hashing`]. Providers must be deterministic for identical input
//! and always emit vectors of one fixed dimension.
//!
//! Loaded models are cached process-wide, so several provider instances with
//! the same configuration share one ONNX session.

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use fnv::FnvHasher;
use half::f16;

use crate::config::EmbedConfig;
use crate::error::{ModelError, Result};

/// One batch of generated embeddings.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    /// One vector per input text, in input order
    pub embeddings: Vec<Vec<f16>>,
    /// Dimension of every vector in the batch
    pub dimension: usize,
}

impl EmbeddingBatch {
    /// Wrap generated vectors, inferring the dimension from the first row.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Cached model entries: the shared session and its probed dimension
type ModelCacheEntry = (Arc<Mutex<TextEmbedding>>, usize);

static MODEL_CACHE: OnceLock<Mutex<HashMap<String, ModelCacheEntry>>> = OnceLock::new();

fn model_cache() -> &'static Mutex<HashMap<String, ModelCacheEntry>> {
    MODEL_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Service that turns text into fixed-dimension dense vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Embed a batch of texts, preserving input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingBatch>;

    /// Dimension of every vector this provider emits.
    fn embedding_dimension(&self) -> usize;

    /// Short identifier for logs and snapshot metadata.
    fn provider_name(&self) -> &str;
}

/// Embedding provider backed by a local fastembed ONNX model.
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Option<Arc<Mutex<TextEmbedding>>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("model", &self.model.is_some())
            .field("dimension", &self.dimension)
            .finish()
    }
}

/// Map a configured model name onto a fastembed built-in.
fn builtin_model(name: &str) -> Result<EmbeddingModel> {
    match name {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(ModelError::invalid_config(format!(
            "unsupported embedding model: {other}"
        ))),
    }
}

impl FastEmbedProvider {
    /// Create an uninitialized provider; call [`Self::initialize`] before embedding.
    pub fn new(config: EmbedConfig) -> Self {
        let dimension = config.dimension;
        Self {
            config,
            model: None,
            dimension,
        }
    }

    /// Create and initialize in one step.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        let mut provider = Self::new(config);
        provider.initialize().await?;
        Ok(provider)
    }

    /// Load the configured model, reusing a process-wide cached session when
    /// one exists for the same configuration.
    pub async fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;
        tracing::info!("Initializing embedding provider: {}", self.config.model_name);

        let cache_key = self.cache_key();
        let cached = {
            let cache = model_cache().lock().unwrap();
            cache
                .get(&cache_key)
                .map(|(model, dim)| (Arc::clone(model), *dim))
        };

        if let Some((model, dimension)) = cached {
            tracing::debug!("Reusing cached model session: {}", self.config.model_name);
            self.model = Some(model);
            self.dimension = dimension;
            return self.validate_model().await;
        }

        let model_kind = builtin_model(&self.config.model_name)?;
        let config = self.config.clone();
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                tracing::info!("Loading embedding model: {}", config.model_name);

                let init_options = InitOptions::new(model_kind)
                    .with_cache_dir(config.model_base_path.clone())
                    .with_show_download_progress(false);

                let mut model = TextEmbedding::try_new(init_options)
                    .map_err(|e| ModelError::External { source: e })?;

                // Probe the true dimension with a throwaway embedding.
                let probe = model
                    .embed(vec!["dimension probe".to_string()], None)
                    .map_err(|e| ModelError::External { source: e })?;
                let dimension = probe.first().map(|emb| emb.len()).unwrap_or(config.dimension);

                tracing::info!("Model loaded, dimension {dimension}");
                Ok((model, dimension))
            })
            .await??;

        if dimension != self.config.dimension {
            return Err(ModelError::invalid_config(format!(
                "model {} produces {dimension}-dim vectors, config expects {}",
                self.config.model_name, self.config.dimension
            )));
        }

        let model = Arc::new(Mutex::new(model));
        {
            let mut cache = model_cache().lock().unwrap();
            cache.insert(cache_key, (Arc::clone(&model), dimension));
        }
        self.model = Some(model);
        self.dimension = dimension;

        self.validate_model().await
    }

    /// Deterministic cache key over the full configuration.
    fn cache_key(&self) -> String {
        let config_json =
            serde_json::to_string(&self.config).expect("Config should always serialize");
        let mut hasher = FnvHasher::default();
        hasher.write(config_json.as_bytes());
        format!("{}:{:x}", self.config.model_name, hasher.finish())
    }

    /// Embed a probe text and check the output is sane.
    async fn validate_model(&self) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ModelError::invalid_config("model not initialized"))?;
        let model = Arc::clone(model);

        let probe = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut guard = model.lock().unwrap();
            guard
                .embed(vec!["validation probe".to_string()], None)
                .map_err(|e| ModelError::External { source: e })
        })
        .await??;

        let embedding = probe
            .first()
            .ok_or_else(|| ModelError::invalid_config("model produced no embedding"))?;
        if embedding.len() != self.dimension {
            return Err(ModelError::invalid_config(format!(
                "expected dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::invalid_config(
                "model produced non-finite values",
            ));
        }

        tracing::debug!("Model validation passed: {}", self.config.model_name);
        Ok(())
    }

    /// Drop every cached model session.
    pub fn clear_cache() {
        model_cache().lock().unwrap().clear();
        tracing::info!("Embedding model cache cleared");
    }

    /// Number of cached model sessions.
    pub fn cache_size() -> usize {
        model_cache().lock().unwrap().len()
    }

    /// Convert raw f32 output to f16, optionally L2-normalizing first.
    fn convert_to_f16(&self, embeddings: Vec<Vec<f32>>) -> Vec<Vec<f16>> {
        embeddings
            .into_iter()
            .map(|embedding| {
                if self.config.normalize {
                    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                    if norm > 0.0 {
                        return embedding.iter().map(|x| f16::from_f32(x / norm)).collect();
                    }
                }
                embedding.into_iter().map(f16::from_f32).collect()
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        let texts = vec![text.to_string()];
        let batch = self.embed_texts(&texts).await?;
        batch
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::invalid_config("no embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch::new(vec![]));
        }

        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ModelError::invalid_config("model not initialized"))?;

        tracing::debug!("Embedding {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            let batch = batch.to_vec();
            let model = Arc::clone(model);

            let raw = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                let mut guard = model.lock().unwrap();
                guard
                    .embed(batch, None)
                    .map_err(|e| ModelError::External { source: e })
            })
            .await??;

            all_embeddings.extend(self.convert_to_f16(raw));
        }

        Ok(EmbeddingBatch::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }
}
