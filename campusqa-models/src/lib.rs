//! # campusqa-models
//!
//! Model-service contracts for the campusqa retrieval pipeline: dense text
//! embeddings and extractive question answering, both behind async traits so
//! the pipeline can swap real models for deterministic in-process ones.
//!
//! ## Features
//! - **[`EmbeddingProvider`]**: fixed-dimension dense vectors from text
//! - **[`FastEmbedProvider`]**: local ONNX `all-MiniLM-L6-v2` inference with
//!   process-wide model caching
//! - **[`HashingEmbedder`]**: deterministic signed feature hashing, no model
//!   files needed
//! - **[`AnswerProvider`]** / **[`LexicalAnswerProvider`]**: extractive QA by
//!   sentence-level term overlap
//! - **f16 output**: embeddings are half-precision for compact storage
//!
//! ## Quick Start
//! ```
//! use campusqa_models::{EmbeddingProvider, HashingEmbedder};
//!
//! # tokio_test::block_on(async {
//! let embedder = HashingEmbedder::default();
//! let vector = embedder.embed_text("hostel fee structure").await.unwrap();
//! assert_eq!(vector.len(), embedder.embedding_dimension());
//! # });
//! ```
//!
//! ## Architecture
//! - [`config`]: embedding model configuration
//! - [`embedding`]: provider trait and the fastembed implementation
//! - [`hashing`]: offline feature-hashing provider
//! - [`answer`]: extractive QA trait and lexical implementation
//! - [`error`]: error types for all model operations

pub mod answer;
pub mod config;
pub mod embedding;
pub mod error;
pub mod hashing;

pub use answer::{AnswerProvider, ExtractedAnswer, LexicalAnswerProvider};
pub use config::{DEFAULT_DIMENSION, DEFAULT_MODEL_NAME, EmbedConfig};
pub use embedding::{EmbeddingBatch, EmbeddingProvider, FastEmbedProvider};
pub use error::{ModelError, Result};
pub use hashing::{DEFAULT_HASH_DIMENSION, HashingEmbedder};
