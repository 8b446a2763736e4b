//! Document sources for the knowledge base.
//!
//! A [`DocumentSource`] supplies `(filename, category, text)` records to the
//! engine; where those records come from is the source's business.
//! [`FsDocumentSource`] walks a directory laid out as
//! `<root>/<category>/<file>.txt`, so dropping `fees/tuition.txt` into the
//! corpus creates a `fees` document. [`StaticDocumentSource`] wraps an
//! in-memory listing for tests and embedded corpora.
//!
//! Per-file problems (unreadable, undecodable) are logged and skipped;
//! partial ingestion beats no ingestion. Only a failure to produce the
//! listing itself is an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use ignore::WalkBuilder;
use tracing::{debug, warn};

/// One raw document from the knowledge base.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Base filename, e.g. "tuition.txt"
    pub filename: String,
    /// Category the document belongs to, e.g. "fees"
    pub category: String,
    /// Cleaned document text
    pub text: String,
}

impl SourceDocument {
    pub fn new(
        filename: impl Into<String>,
        category: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            category: category.into(),
            text: text.into(),
        }
    }
}

/// Supplier of the documents to index.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Produce the full document listing.
    async fn load(&self) -> anyhow::Result<Vec<SourceDocument>>;
}

/// Document source over a `<root>/<category>/*.{txt,md}` directory tree.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    root: PathBuf,
}

impl FsDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn load(&self) -> anyhow::Result<Vec<SourceDocument>> {
        if !self.root.exists() {
            tokio::fs::create_dir_all(&self.root)
                .await
                .with_context(|| format!("creating corpus root {}", self.root.display()))?;
            warn!(root = %self.root.display(), "corpus root did not exist, created empty");
            return Ok(Vec::new());
        }

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .max_depth(Some(2))
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut documents = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable directory entry: {e}");
                    continue;
                }
            };
            // Documents live exactly one category directory below the root.
            if entry.depth() != 2 {
                continue;
            }
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            if !is_supported(path) {
                debug!(path = %path.display(), "unsupported extension, skipping");
                continue;
            }
            let (Some(filename), Some(category)) = (
                path.file_name().and_then(|n| n.to_str()),
                path.parent()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str()),
            ) else {
                debug!(path = %path.display(), "non-unicode path components, skipping");
                continue;
            };

            let raw = match tokio::fs::read_to_string(path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), "skipping unreadable document: {e}");
                    continue;
                }
            };
            let text = clean_text(&raw);
            if text.is_empty() {
                debug!(path = %path.display(), "document empty after cleanup, skipping");
                continue;
            }
            documents.push(SourceDocument::new(filename, category, text));
        }

        debug!(count = documents.len(), root = %self.root.display(), "corpus walk complete");
        Ok(documents)
    }
}

/// Fixed in-memory document source.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentSource {
    documents: Vec<SourceDocument>,
}

impl StaticDocumentSource {
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentSource for StaticDocumentSource {
    async fn load(&self) -> anyhow::Result<Vec<SourceDocument>> {
        Ok(self.documents.clone())
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt") || e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Normalize raw document text for indexing.
///
/// Characters outside letters, digits, underscore, whitespace, and basic
/// punctuation become spaces, then whitespace runs collapse to single
/// spaces. Chunking and word counting both rely on that normalization.
pub fn clean_text(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() || ".,!?;:()-".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
