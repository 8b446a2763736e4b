//! SQLite persistence for built indexes.
//!
//! The store holds exactly one snapshot: every chunk row with its f16
//! embedding blob, plus a key/value meta table carrying the corpus
//! fingerprint, the build timestamp, the embedding dimension and the fitted
//! TF-IDF model as JSON. On startup the engine compares the stored
//! fingerprint against the live corpus; a match restores the index with no
//! embedding work, a mismatch triggers a rebuild.
//!
//! Every load-path defect, from a missing meta key to a truncated embedding
//! blob, surfaces as [`RetrieverError::CacheCorruption`] so the caller can
//! reset and rebuild instead of serving a half-read index.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use half::f16;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};

use super::chunker::Chunk;
use super::corpus::SourceDocument;
use super::keyword_index::TfidfModel;
use super::search_index::SearchIndex;
use crate::error::{Result, RetrieverError};

/// Database file name inside the engine's data directory.
const SNAPSHOT_DB_FILE: &str = "document_cache.db";

/// Everything needed to reconstitute a [`SearchIndex`] without re-embedding.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Chunks in ordinal order
    pub chunks: Vec<Chunk>,
    /// One embedding row per chunk, same order
    pub embeddings: Vec<Vec<f16>>,
    pub tfidf_model: TfidfModel,
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
}

/// SQLite-backed snapshot storage.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// Open (or create) the store under `base`.
    pub async fn open(base: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(base).await?;
        let db_path = base.join(SNAPSHOT_DB_FILE);

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5))
                .foreign_keys(true)
                .create_if_missing(true)
                .auto_vacuum(sqlx::sqlite::SqliteAutoVacuum::Full)
                .page_size(1 << 16)
                .optimize_on_close(true, 1 << 10),
        )
        .await?;
        Self::new_with_pool(pool).await
    }

    /// Open an in-memory store, for tests.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Self::new_with_pool(pool).await
    }

    async fn new_with_pool(pool: SqlitePool) -> Result<Self> {
        Self::create_tables(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_tables(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                ordinal INTEGER PRIMARY KEY,
                source_filename TEXT NOT NULL,
                category TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                CONSTRAINT unique_chunk_identity UNIQUE(source_filename, chunk_index)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshot_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_filename)")
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Replace the stored snapshot with the given index.
    pub async fn save(&self, index: &SearchIndex) -> Result<()> {
        let Some(built_at) = index.built_at() else {
            return Err(RetrieverError::index_build(
                "cannot persist an index that was never built",
            ));
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM chunks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM snapshot_meta")
            .execute(&mut *tx)
            .await?;

        for (ordinal, (chunk, embedding)) in
            index.chunks().iter().zip(index.embeddings()).enumerate()
        {
            let embedding_bytes = bytemuck::cast_slice::<f16, u8>(embedding);
            sqlx::query(
                r#"
                INSERT INTO chunks (ordinal, source_filename, category, chunk_index, content, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(ordinal as i64)
            .bind(&chunk.source_filename)
            .bind(&chunk.category)
            .bind(chunk.chunk_index as i64)
            .bind(&chunk.text)
            .bind(embedding_bytes)
            .bind(chunk.created_at.timestamp())
            .execute(&mut *tx)
            .await?;
        }

        let model_json = serde_json::to_string(index.tfidf_model())?;
        for (key, value) in [
            ("fingerprint", index.fingerprint().to_string()),
            ("built_at", built_at.timestamp().to_string()),
            ("embedding_dimension", index.dimension().to_string()),
            ("tfidf_model", model_json),
        ] {
            sqlx::query("INSERT INTO snapshot_meta (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(chunks = index.len(), "persisted index snapshot");
        Ok(())
    }

    /// Load the stored snapshot, or `None` when the store has never been
    /// written.
    ///
    /// Any defect in the stored data comes back as
    /// [`RetrieverError::CacheCorruption`]; the caller is expected to
    /// [`reset`](Self::reset) and rebuild from source.
    pub async fn load(&self) -> Result<Option<Snapshot>> {
        self.load_inner().await.map_err(|e| match e {
            e @ RetrieverError::CacheCorruption { .. } => e,
            other => RetrieverError::cache_corruption(other.to_string()),
        })
    }

    async fn load_inner(&self) -> Result<Option<Snapshot>> {
        let meta_rows = sqlx::query("SELECT key, value FROM snapshot_meta")
            .fetch_all(&self.pool)
            .await?;
        if meta_rows.is_empty() {
            return Ok(None);
        }

        let mut meta: HashMap<String, String> = HashMap::new();
        for row in meta_rows {
            meta.insert(row.get("key"), row.get("value"));
        }

        let fingerprint = take_meta(&mut meta, "fingerprint")?;
        let built_at_secs: i64 = take_meta(&mut meta, "built_at")?
            .parse()
            .map_err(|_| RetrieverError::cache_corruption("built_at is not a unix timestamp"))?;
        let built_at = DateTime::from_timestamp(built_at_secs, 0)
            .ok_or_else(|| RetrieverError::cache_corruption("built_at is out of range"))?;
        let dimension: usize = take_meta(&mut meta, "embedding_dimension")?
            .parse()
            .map_err(|_| {
                RetrieverError::cache_corruption("embedding_dimension is not a number")
            })?;
        let tfidf_model: TfidfModel = serde_json::from_str(&take_meta(&mut meta, "tfidf_model")?)?;

        let rows = sqlx::query(
            "SELECT source_filename, category, chunk_index, content, embedding, created_at
             FROM chunks ORDER BY ordinal",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut chunks = Vec::with_capacity(rows.len());
        let mut embeddings = Vec::with_capacity(rows.len());
        for row in rows {
            let source_filename: String = row.get("source_filename");
            let category: String = row.get("category");
            let chunk_index: i64 = row.get("chunk_index");
            let content: String = row.get("content");
            let embedding_bytes: Vec<u8> = row.get("embedding");
            let created_at_secs: i64 = row.get("created_at");

            if embedding_bytes.len() != dimension * 2 {
                return Err(RetrieverError::cache_corruption(format!(
                    "embedding blob for {source_filename}#{chunk_index} has {} bytes, expected {}",
                    embedding_bytes.len(),
                    dimension * 2
                )));
            }
            let created_at = DateTime::from_timestamp(created_at_secs, 0).ok_or_else(|| {
                RetrieverError::cache_corruption("chunk created_at is out of range")
            })?;

            embeddings.push(bytemuck::cast_slice::<u8, f16>(&embedding_bytes).to_vec());
            chunks.push(Chunk {
                source_filename,
                category,
                chunk_index: chunk_index as usize,
                text: content,
                created_at,
            });
        }

        Ok(Some(Snapshot {
            chunks,
            embeddings,
            tfidf_model,
            fingerprint,
            built_at,
        }))
    }

    /// Drop all persisted state.
    pub async fn reset(&self) -> Result<()> {
        sqlx::query("DELETE FROM chunks")
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM snapshot_meta")
            .execute(&self.pool)
            .await?;
        tracing::debug!("reset snapshot store");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn take_meta(meta: &mut HashMap<String, String>, key: &str) -> Result<String> {
    meta.remove(key).ok_or_else(|| {
        RetrieverError::cache_corruption(format!("snapshot_meta is missing '{key}'"))
    })
}

/// Deterministic fingerprint of a source corpus.
///
/// Hashes the sorted (filename, category, content-hash) triples, so document
/// order never changes the result while any rename, recategorization, edit,
/// addition or removal does.
pub fn corpus_fingerprint(documents: &[SourceDocument]) -> String {
    let mut entries: Vec<(String, String, String)> = documents
        .iter()
        .map(|d| {
            (
                d.filename.clone(),
                d.category.clone(),
                blake3::hash(d.text.as_bytes()).to_hex().to_string(),
            )
        })
        .collect();
    entries.sort();

    let mut hasher = blake3::Hasher::new();
    for (filename, category, content_hash) in &entries {
        hasher.update(filename.as_bytes());
        hasher.update(b"\0");
        hasher.update(category.as_bytes());
        hasher.update(b"\0");
        hasher.update(content_hash.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
