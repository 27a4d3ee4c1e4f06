use std::sync::Arc;

use steward::config::{AssistantConfig, MemoryConfig};
use steward::memory::{
    FactSource, InMemoryStore, MemoryManager, ReferenceItem, ReferenceSource,
};

fn manager() -> MemoryManager {
    MemoryManager::new(Arc::new(InMemoryStore::new()), &MemoryConfig::default())
}

async fn with_references(memory: &MemoryManager) {
    for (id, text) in [
        ("evt_1", "Calendar event Dentist on Tuesday"),
        ("evt_2", "Calendar event Standup every weekday"),
        ("evt_3", "Calendar event Board review Friday"),
    ] {
        assert!(
            memory
                .cache_reference(&ReferenceItem::new(ReferenceSource::CalendarEvent, id, text))
                .await
        );
    }
    memory
        .cache_reference(&ReferenceItem::new(
            ReferenceSource::Email,
            "m1",
            "Email from dana@example.com about \"Lunch\"",
        ))
        .await;
}

#[tokio::test]
async fn reference_material_is_capped_for_trigger_queries() {
    let memory = manager();
    with_references(&memory).await;

    let bundle = memory.assemble_context("what is on my calendar").await;
    assert_eq!(bundle.reference.len(), 2);
}

#[tokio::test]
async fn reference_material_needs_a_trigger_word() {
    let memory = manager();
    with_references(&memory).await;

    let bundle = memory.assemble_context("tell me a joke").await;
    assert!(bundle.reference.is_empty());
}

#[tokio::test]
async fn bundle_carries_system_settings_and_facts() {
    let memory = manager();
    memory
        .seed_system(&AssistantConfig {
            name: "Jeeves".into(),
            ..AssistantConfig::default()
        })
        .await;
    memory
        .add_long_term_fact("I work at the university", "work", FactSource::Explicit)
        .await;

    let bundle = memory.assemble_context("where do I work").await;
    assert_eq!(bundle.system.get("assistant_name").map(String::as_str), Some("Jeeves"));
    assert_eq!(bundle.user_facts.len(), 1);

    let prompt = bundle.render_prompt("where do I work", None);
    assert!(prompt.starts_with("You are Jeeves"));
    assert!(prompt.contains("I work at the university"));
}

#[tokio::test]
async fn facts_are_bounded_by_the_configured_limit() {
    let memory = manager();
    for n in 0..8 {
        memory
            .add_long_term_fact(&format!("fact number {n}"), "general", FactSource::Explicit)
            .await;
    }
    let bundle = memory.assemble_context("fact").await;
    assert_eq!(bundle.user_facts.len(), MemoryConfig::default().facts_limit);
}

#[tokio::test]
async fn personal_details_become_facts() {
    let memory = manager();
    memory
        .record_turn("My name is Priya and I live in Leeds", "Nice to meet you.", None)
        .await;
    let facts = memory.list_facts(None).await;
    assert!(facts.iter().any(|f| f.text.contains("Priya")), "{facts:?}");
}
