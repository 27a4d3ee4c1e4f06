use std::sync::Arc;

use steward::config::MemoryConfig;
use chrono::NaiveDate;
use steward::memory::{
    Document, FactInsert, FactSource, InMemoryStore, MemoryManager, Metadata, Partition, Record,
    SystemSetting,
};
use steward::todos::{NewTodo, TodoManager};

fn manager() -> MemoryManager {
    MemoryManager::new(Arc::new(InMemoryStore::new()), &MemoryConfig::default())
}

#[tokio::test]
async fn duplicate_fact_is_added_once() {
    let memory = manager();
    let first = memory
        .add_long_term_fact("I am allergic to peanuts", "health", FactSource::Explicit)
        .await;
    let FactInsert::Added(fact) = first else {
        panic!("expected insert, got {first:?}");
    };

    let second = memory
        .add_long_term_fact("  I am allergic to peanuts ", "health", FactSource::Explicit)
        .await;
    assert_eq!(second, FactInsert::Exists(fact.id));
    assert_eq!(memory.list_facts(Some("health")).await.len(), 1);
}

#[tokio::test]
async fn dedup_is_idempotent() {
    let memory = manager();
    let store = memory.store();
    for id in ["turn_a", "turn_b", "turn_c"] {
        store
            .upsert(
                Partition::Interactions,
                Document::new(id, "User: hi\nAssistant: hello", Metadata::new()),
            )
            .await
            .unwrap();
    }
    store
        .upsert(
            Partition::Interactions,
            Document::new("turn_d", "User: bye\nAssistant: see you", Metadata::new()),
        )
        .await
        .unwrap();

    assert_eq!(memory.dedup_all().await, 2);
    assert_eq!(memory.dedup_all().await, 0);

    let mut left: Vec<_> = store
        .get_all(Partition::Interactions, None)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    left.sort();
    assert_eq!(left, ["turn_a", "turn_d"]);
}

#[tokio::test]
async fn knowledge_answers_overwrite_by_key() {
    let memory = manager();
    assert!(memory.remember_knowledge("office_hours", "Tuesdays").await);
    assert!(memory.remember_knowledge("office_hours", "Thursdays").await);

    let knowledge = memory.knowledge().await;
    assert_eq!(knowledge.len(), 1);
    assert_eq!(knowledge["office_hours"], "Thursdays");
}

#[tokio::test]
async fn dedup_leaves_todos_with_the_same_task() {
    let memory = manager();
    let todos = TodoManager::new(Arc::clone(memory.store()));
    for month in [4, 5] {
        let due = NaiveDate::from_ymd_opt(2025, month, 1).and_then(|d| d.and_hms_opt(9, 0, 0));
        todos
            .add(NewTodo {
                task: "Pay rent".into(),
                due_date: due,
                ..NewTodo::default()
            })
            .await
            .unwrap();
    }

    assert_eq!(memory.dedup_all().await, 0);
    let mut due: Vec<_> = todos.list(None, None).await.into_iter().map(|t| t.due_date).collect();
    due.sort();
    assert_eq!(
        due,
        [
            NaiveDate::from_ymd_opt(2025, 4, 1).and_then(|d| d.and_hms_opt(9, 0, 0)),
            NaiveDate::from_ymd_opt(2025, 5, 1).and_then(|d| d.and_hms_opt(9, 0, 0)),
        ]
    );
}

#[tokio::test]
async fn dedup_leaves_system_settings_with_equal_values() {
    let memory = manager();
    for key in ["assistant_name", "persona"] {
        let doc = SystemSetting::new(key, "Steward").to_document().unwrap();
        memory.store().upsert(Partition::System, doc).await.unwrap();
    }

    assert_eq!(memory.dedup_all().await, 0);
    let settings = memory.system_settings().await;
    assert_eq!(settings.len(), 2);
}
