//! Document chunking for the dual indexes.
//!
//! Thin wrapper over `campusqa-context`: the context crate decides where
//! passages begin and end, and this module attaches the retrieval metadata,
//! namely the owning document, its category, and the build timestamp all
//! chunks of one build share.

use campusqa_context::PassageBuilder;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::corpus::SourceDocument;

/// One indexed slice of a source document.
///
/// Identity is `(source_filename, chunk_index)`; `chunk_index` numbers the
/// surviving chunks of one document contiguously from zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub source_filename: String,
    pub category: String,
    pub chunk_index: usize,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Sizing for passage assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkerConfig {
    /// Word-count target per chunk
    pub target_words: usize,
    /// Trailing words carried into the next chunk
    pub overlap_words: usize,
    /// Standalone chunks at or under this many characters are dropped
    pub min_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_words: campusqa_context::DEFAULT_TARGET_WORDS,
            overlap_words: campusqa_context::DEFAULT_OVERLAP_WORDS,
            min_chars: campusqa_context::DEFAULT_MIN_CHARS,
        }
    }
}

impl ChunkerConfig {
    pub fn with_target_words(mut self, target_words: usize) -> Self {
        self.target_words = target_words;
        self
    }

    pub fn with_overlap_words(mut self, overlap_words: usize) -> Self {
        self.overlap_words = overlap_words;
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }
}

/// Splits documents into [`Chunk`]s.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Chunk one document, stamping every chunk with `created_at`.
    ///
    /// Output is fully determined by the document and the config; the
    /// timestamp is caller-supplied so one build shares one stamp.
    pub fn chunk_document(&self, document: &SourceDocument, created_at: DateTime<Utc>) -> Vec<Chunk> {
        let passages = PassageBuilder::new(&document.filename, &document.category)
            .with_target_words(self.config.target_words)
            .with_overlap_words(self.config.overlap_words)
            .with_min_chars(self.config.min_chars)
            .get_passages(&document.text);

        tracing::debug!(
            filename = %document.filename,
            chunks = passages.len(),
            "chunked document"
        );

        passages
            .into_iter()
            .map(|passage| Chunk {
                source_filename: passage.source,
                category: passage.category,
                chunk_index: passage.sequence,
                text: passage.text,
                created_at,
            })
            .collect()
    }
}
