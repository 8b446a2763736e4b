//! Error types for model service operations

use std::path::PathBuf;

/// Result type for model service operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by embedding and answer-extraction services
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Model files could not be found at the expected location
    #[error("Model file not found: {path}")]
    ModelFileNotFound { path: PathBuf },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Model failed to initialize
    #[error("Model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding generation failed
    #[error("Embedding generation failed: {source}")]
    EmbeddingGeneration {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Answer extraction failed
    #[error("Answer extraction failed: {message}")]
    AnswerExtraction { message: String },

    /// IO error during model operations
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Async task join error
    #[error("Task execution failed: {source}")]
    TaskJoin {
        #[from]
        source: tokio::task::JoinError,
    },

    /// Generic error from external libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl ModelError {
    /// Create a ModelInitialization error from any error type
    pub fn model_init<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelInitialization {
            source: Box::new(source),
        }
    }

    /// Create an EmbeddingGeneration error from any error type
    pub fn embedding_gen<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::EmbeddingGeneration {
            source: Box::new(source),
        }
    }

    /// Create an InvalidConfig error with a message
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an AnswerExtraction error with a message
    pub fn answer_extraction<S: Into<String>>(message: S) -> Self {
        Self::AnswerExtraction {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::invalid_config("dimension must be nonzero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: dimension must be nonzero"
        );

        let err = ModelError::answer_extraction("context held no sentences");
        assert!(err.to_string().contains("context held no sentences"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ModelError = io.into();
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
