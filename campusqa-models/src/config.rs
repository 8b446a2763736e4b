//! Configuration for embedding model providers

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ModelError, Result};

/// Sentence-transformer model used when nothing else is configured.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Embedding dimension of the default model.
pub const DEFAULT_DIMENSION: usize = 384;

/// Configuration for an embedding provider.
///
/// Serializes deterministically so providers can derive cache keys from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedConfig {
    /// Model identifier, e.g. "all-MiniLM-L6-v2"
    pub model_name: String,
    /// Directory where model files are cached on disk
    pub model_base_path: PathBuf,
    /// Expected embedding dimension
    pub dimension: usize,
    /// Number of texts embedded per inference call
    pub batch_size: usize,
    /// Whether output vectors are L2-normalized
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_NAME)
    }
}

impl EmbedConfig {
    /// Create a config for the named model with default sizing.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_base_path: PathBuf::from(".campusqa/models"),
            dimension: DEFAULT_DIMENSION,
            batch_size: 16,
            normalize: true,
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.model_base_path = base_path.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Directory holding this model's files.
    pub fn model_path(&self) -> PathBuf {
        self.model_base_path.join(&self.model_name)
    }

    /// Cache directory passed to the inference runtime.
    pub fn cache_dir(&self) -> &Path {
        &self.model_base_path
    }

    /// Check the configuration for values no provider could honor.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.is_empty() {
            return Err(ModelError::invalid_config("model_name must not be empty"));
        }
        if self.dimension == 0 {
            return Err(ModelError::invalid_config("dimension must be nonzero"));
        }
        if self.batch_size == 0 {
            return Err(ModelError::invalid_config("batch_size must be nonzero"));
        }
        Ok(())
    }
}
