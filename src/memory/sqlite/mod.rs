mod schema;
mod search;

use crate::memory::embeddings::EmbeddingProvider;
use crate::memory::traits::DocumentStore;
use crate::memory::types::{Document, Metadata, MetadataFilter, Partition};
use crate::memory::vector;
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

/// SQLite-backed document store.
///
/// - **Keyword search**: FTS5 virtual table with BM25 scoring
/// - **Vector search**: embeddings stored as BLOB, brute-force cosine
/// - **Hybrid merge**: weighted fusion of both when an embedder is configured
pub struct SqliteStore {
    pool: SqlitePool,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_weight: f32,
    keyword_weight: f32,
}

impl SqliteStore {
    /// Open (or create) the database at `<workspace_dir>/memory/steward.db`.
    pub async fn new(workspace_dir: &Path) -> anyhow::Result<Self> {
        Self::with_embedder(
            workspace_dir,
            Arc::new(crate::memory::embeddings::NoopEmbedding),
            0.7,
            0.3,
        )
        .await
    }

    pub async fn with_embedder(
        workspace_dir: &Path,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_weight: f32,
        keyword_weight: f32,
    ) -> anyhow::Result<Self> {
        let db_path = workspace_dir.join("memory").join("steward.db");

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("create memory directory")?;
        }

        let url = format!("sqlite:{}?mode=rwc", db_path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .context("open SQLite database")?;

        Self::from_pool(pool, embedder, vector_weight, keyword_weight).await
    }

    /// Open an in-memory database; one connection so every query sees the same data.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::in_memory_with_embedder(Arc::new(crate::memory::embeddings::NoopEmbedding)).await
    }

    pub async fn in_memory_with_embedder(
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("open in-memory SQLite")?;
        Self::from_pool(pool, embedder, 0.7, 0.3).await
    }

    async fn from_pool(
        pool: SqlitePool,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_weight: f32,
        keyword_weight: f32,
    ) -> anyhow::Result<Self> {
        schema::init_schema(&pool).await?;
        Ok(Self {
            pool,
            embedder,
            vector_weight,
            keyword_weight,
        })
    }

    async fn embed(&self, text: &str) -> Option<Vec<u8>> {
        if self.embedder.dimensions() == 0 {
            return None;
        }
        match self.embedder.embed_one(text).await {
            Ok(embedding) => Some(vector::vec_to_bytes(&embedding)),
            Err(error) => {
                tracing::warn!(%error, "embedding failed; storing document without vector");
                None
            }
        }
    }

    async fn fetch_by_ids(
        &self,
        partition: Partition,
        ids: &[String],
    ) -> anyhow::Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.get_row(partition, id).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn get_row(&self, partition: Partition, id: &str) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, text, metadata FROM documents WHERE partition = $1 AND id = $2",
        )
        .bind(partition.as_ref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("load document")?;
        row.as_ref().map(map_document_row).transpose()
    }

    /// Most recently written documents matching `filter`, newest first.
    async fn recent(
        &self,
        partition: Partition,
        filter: Option<&MetadataFilter>,
        limit: usize,
    ) -> anyhow::Result<Vec<Document>> {
        let sql = format!(
            "SELECT d.id, d.text, d.metadata FROM documents d
             WHERE d.partition = ?{}
             ORDER BY d.updated_at DESC, d.rowid DESC
             LIMIT ?",
            search::filter_sql(filter)?
        );
        #[allow(clippy::cast_possible_wrap)]
        let limit_i64 = limit as i64;

        let query = sqlx::query_as::<_, (String, String, String)>(&sql).bind(partition.as_ref());
        let rows = search::bind_filter(query, filter)
            .bind(limit_i64)
            .fetch_all(&self.pool)
            .await
            .context("load recent documents")?;
        rows.into_iter()
            .map(|(id, text, metadata)| decode_document(id, text, &metadata))
            .collect()
    }

    async fn ranked_ids(
        &self,
        partition: Partition,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> anyhow::Result<Vec<String>> {
        let keyword = search::fts5_search(&self.pool, partition, text, filter, k * 2).await?;

        let vector_hits = if self.embedder.dimensions() > 0 {
            match self.embedder.embed_one(text).await {
                Ok(embedding) => {
                    search::vector_search(&self.pool, partition, &embedding, filter, k * 2).await?
                }
                Err(error) => {
                    tracing::warn!(%error, "query embedding failed; using keyword search only");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        if vector_hits.is_empty() {
            return Ok(keyword.into_iter().take(k).map(|(id, _)| id).collect());
        }
        Ok(vector::hybrid_merge(
            &vector_hits,
            &keyword,
            self.vector_weight,
            self.keyword_weight,
            k,
        )
        .into_iter()
        .map(|(id, _)| id)
        .collect())
    }
}

fn decode_document(id: String, text: String, metadata: &str) -> anyhow::Result<Document> {
    let metadata: Metadata =
        serde_json::from_str(metadata).context("deserialize document metadata")?;
    Ok(Document { id, text, metadata })
}

fn map_document_row(row: &SqliteRow) -> anyhow::Result<Document> {
    let metadata: String = row.try_get("metadata")?;
    decode_document(row.try_get("id")?, row.try_get("text")?, &metadata)
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { sqlx::query("SELECT 1").execute(&self.pool).await.is_ok() })
    }

    fn upsert<'a>(
        &'a self,
        partition: Partition,
        document: Document,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let metadata =
                serde_json::to_string(&document.metadata).context("serialize metadata")?;
            let embedding = self.embed(&document.text).await;
            let now = now_stamp();

            sqlx::query(
                "INSERT INTO documents (partition, id, text, metadata, embedding, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $6)
                 ON CONFLICT(partition, id) DO UPDATE SET
                     text = excluded.text,
                     metadata = excluded.metadata,
                     embedding = excluded.embedding,
                     updated_at = excluded.updated_at",
            )
            .bind(partition.as_ref())
            .bind(&document.id)
            .bind(&document.text)
            .bind(metadata)
            .bind(embedding)
            .bind(now)
            .execute(&self.pool)
            .await
            .with_context(|| format!("upsert {partition}/{}", document.id))?;
            Ok(())
        })
    }

    fn get<'a>(
        &'a self,
        partition: Partition,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<Document>>> + Send + 'a>> {
        Box::pin(async move { self.get_row(partition, id).await })
    }

    fn query_similar<'a>(
        &'a self,
        partition: Partition,
        text: &'a str,
        k: usize,
        filter: Option<&'a MetadataFilter>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Document>>> + Send + 'a>> {
        Box::pin(async move {
            if k == 0 {
                return Ok(Vec::new());
            }
            if text.trim().is_empty() {
                return self.recent(partition, filter, k).await;
            }

            let ids = self.ranked_ids(partition, text, k, filter).await?;
            let mut docs = self.fetch_by_ids(partition, &ids).await?;

            // Nearest-neighbour semantics: always fill up to k when the partition allows.
            if docs.len() < k {
                let seen: HashSet<String> = docs.iter().map(|d| d.id.clone()).collect();
                let padding = self.recent(partition, filter, k + seen.len()).await?;
                docs.extend(
                    padding
                        .into_iter()
                        .filter(|d| !seen.contains(&d.id))
                        .take(k - seen.len()),
                );
            }
            Ok(docs)
        })
    }

    fn get_all<'a>(
        &'a self,
        partition: Partition,
        filter: Option<&'a MetadataFilter>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Document>>> + Send + 'a>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT d.id, d.text, d.metadata FROM documents d WHERE d.partition = ?{}",
                search::filter_sql(filter)?
            );
            let query =
                sqlx::query_as::<_, (String, String, String)>(&sql).bind(partition.as_ref());
            let rows = search::bind_filter(query, filter)
                .fetch_all(&self.pool)
                .await
                .context("load partition")?;
            rows.into_iter()
                .map(|(id, text, metadata)| decode_document(id, text, &metadata))
                .collect()
        })
    }

    fn delete<'a>(
        &'a self,
        partition: Partition,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM documents WHERE partition = $1 AND id = $2")
                .bind(partition.as_ref())
                .bind(id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("delete {partition}/{id}"))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
