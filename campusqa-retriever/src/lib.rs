//! campusqa-retriever: Hybrid retrieval engine for campus Q&A
//!
//! This crate indexes a directory of categorized campus documents (fees,
//! admissions, hostel, placements and the like) and answers natural-language
//! questions over them. Retrieval is hybrid: dense embeddings and TF-IDF
//! keyword vectors are scored separately and fused 70/30 into one ranking.
//! Built indexes are persisted to SQLite and restored on startup when a
//! corpus fingerprint proves the documents unchanged, skipping the expensive
//! embedding pass.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: Document loading, chunking, both index legs, score
//!   fusion, snapshot persistence, answer synthesis, and the engine that
//!   ties them together
//! - **[`error`]**: The `RetrieverError` taxonomy shared by the pipeline
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use campusqa_models::{HashingEmbedder, LexicalAnswerProvider};
//! use campusqa_retriever::retrieval::corpus::FsDocumentSource;
//! use campusqa_retriever::retrieval::engine::{RetrievalEngine, RetrievalEngineConfig};
//!
//! # async fn example() -> campusqa_retriever::error::Result<()> {
//! let config = RetrievalEngineConfig::new("college-brochures", "./.campusqa");
//! let engine = RetrievalEngine::new(
//!     config,
//!     Arc::new(FsDocumentSource::new("./college_data")),
//!     Arc::new(HashingEmbedder::new(384)),
//!     Arc::new(LexicalAnswerProvider::new()),
//! )
//! .await?;
//!
//! engine.initialize().await?;
//! let reply = engine.chat("What is the tuition fee?").await?;
//! println!("{} (confidence {:.2})", reply.answer, reply.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Documents → Chunker → Embeddings ─┐
//!     │                             ├→ SearchIndex → SQLite Snapshot
//!     └────── → TF-IDF Vectors ─────┘        ↓
//!                     Query → Fusion (0.7/0.3) → Answer Synthesis
//! ```

pub mod error;
pub mod retrieval;
