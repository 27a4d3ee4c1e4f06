use std::sync::Arc;

use steward::config::MemoryConfig;
use steward::memory::{FactSource, MemoryManager, SqliteStore, create_store};
use tempfile::TempDir;

#[tokio::test]
async fn facts_survive_reopening_the_workspace() {
    let tmp = TempDir::new().unwrap();
    {
        let store = SqliteStore::new(tmp.path()).await.unwrap();
        let memory = MemoryManager::new(Arc::new(store), &MemoryConfig::default());
        memory
            .add_long_term_fact("I prefer window seats", "travel", FactSource::Explicit)
            .await;
        memory.remember_knowledge("office_hours", "Mondays 1-3pm").await;
    }

    let store = SqliteStore::new(tmp.path()).await.unwrap();
    let memory = MemoryManager::new(Arc::new(store), &MemoryConfig::default());
    let facts = memory.list_facts(Some("travel")).await;
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].text, "I prefer window seats");
    assert_eq!(
        memory.knowledge().await.get("office_hours").map(String::as_str),
        Some("Mondays 1-3pm")
    );
}

#[tokio::test]
async fn configured_store_reports_healthy() {
    let tmp = TempDir::new().unwrap();
    let store = create_store(&MemoryConfig::default(), tmp.path(), "http://localhost:11434")
        .await
        .unwrap();
    let memory = MemoryManager::new(store, &MemoryConfig::default());
    assert!(memory.health_check().await);
    assert_eq!(memory.store().name(), "sqlite");
}
