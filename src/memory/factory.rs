use crate::config::MemoryConfig;

use super::{DocumentStore, InMemoryStore, SqliteStore, embeddings};

use std::path::Path;
use std::sync::Arc;

pub async fn create_store(
    config: &MemoryConfig,
    workspace_dir: &Path,
    ollama_base_url: &str,
) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.backend.as_str() {
        "sqlite" => {
            let embedder: Arc<dyn embeddings::EmbeddingProvider> =
                Arc::from(embeddings::create_embedding_provider(
                    &config.embedding_provider,
                    ollama_base_url,
                    &config.embedding_model,
                ));

            #[allow(clippy::cast_possible_truncation)]
            let store = SqliteStore::with_embedder(
                workspace_dir,
                embedder,
                config.vector_weight as f32,
                config.keyword_weight as f32,
            )
            .await?;
            Arc::new(store)
        }
        "memory" => Arc::new(InMemoryStore::new()),
        other => {
            anyhow::bail!("Unknown memory backend '{other}'. Supported: sqlite, memory");
        }
    };

    tracing::debug!(backend = store.name(), "memory store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn sqlite_backend_creates_database_file() {
        let tmp = TempDir::new().unwrap();
        let config = MemoryConfig::default();
        let store = create_store(&config, tmp.path(), "http://localhost:11434")
            .await
            .unwrap();
        assert_eq!(store.name(), "sqlite");
        assert!(tmp.path().join("memory").join("steward.db").exists());
    }

    #[tokio::test]
    async fn memory_backend_is_volatile() {
        let tmp = TempDir::new().unwrap();
        let config = MemoryConfig {
            backend: "memory".into(),
            ..MemoryConfig::default()
        };
        let store = create_store(&config, tmp.path(), "").await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let config = MemoryConfig {
            backend: "redis".into(),
            ..MemoryConfig::default()
        };
        let err = create_store(&config, tmp.path(), "").await.err().unwrap();
        assert!(err.to_string().contains("Unknown memory backend"));
    }
}
