//! Error types for the retrieval pipeline

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrieverError>;

/// Errors raised while building, persisting, or querying the index
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// The document source could not produce its listing
    #[error("Document source failed: {source}")]
    Source {
        #[from]
        source: anyhow::Error,
    },

    /// An injected model service (embedding or answer extraction) failed
    #[error("Model service error: {source}")]
    Model {
        #[from]
        source: campusqa_models::ModelError,
    },

    /// The persisted snapshot could not be read back coherently
    #[error("Cache snapshot corrupted: {message}")]
    CacheCorruption { message: String },

    /// The assembled index violated a build invariant
    #[error("Index build failed: {message}")]
    IndexBuild { message: String },

    /// Database error from the snapshot store
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: sqlx::Error,
    },

    /// Serialization of persisted state failed
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// IO error outside the database
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl RetrieverError {
    /// Create a CacheCorruption error with a message
    pub fn cache_corruption<S: Into<String>>(message: S) -> Self {
        Self::CacheCorruption {
            message: message.into(),
        }
    }

    /// Create an IndexBuild error with a message
    pub fn index_build<S: Into<String>>(message: S) -> Self {
        Self::IndexBuild {
            message: message.into(),
        }
    }
}
