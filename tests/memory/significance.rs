use std::sync::Arc;

use steward::config::MemoryConfig;
use steward::memory::significance::{is_significant, score};
use steward::memory::{InMemoryStore, InteractionKind, MemoryManager, Partition};

fn manager(threshold: f64) -> MemoryManager {
    let config = MemoryConfig {
        backend: "memory".into(),
        significance_threshold: threshold,
        ..MemoryConfig::default()
    };
    MemoryManager::new(Arc::new(InMemoryStore::new()), &config)
}

#[test]
fn empty_calendar_turn_scores_its_kind_weight() {
    let s = score("", InteractionKind::Calendar);
    assert!((s - 0.7).abs() < 1e-9, "{s}");
}

#[test]
fn keywords_and_length_raise_the_score_up_to_one() {
    let plain = score("lunch plans", InteractionKind::Statement);
    let flagged = score("remember the work deadline", InteractionKind::Statement);
    assert!(flagged > plain);

    let long = "remember important schedule deadline appointment family work ".repeat(30);
    assert!((score(&long, InteractionKind::Calendar) - 1.0).abs() < 1e-9);
}

#[test]
fn threshold_is_inclusive() {
    assert!(is_significant(0.3, 0.3));
    assert!(!is_significant(0.29, 0.3));
}

#[tokio::test]
async fn low_significance_turn_is_not_stored() {
    let memory = manager(0.9);
    assert!(memory.record_turn("ok thanks", "You're welcome.", None).await.is_none());

    let stored = memory.store().get_all(Partition::Interactions, None).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn significant_turn_is_stored_with_its_score() {
    let memory = manager(0.3);
    let turn = memory
        .record_turn("Remember my dentist appointment on Friday", "Noted.", None)
        .await
        .unwrap();
    assert!(turn.significance >= 0.3);
    assert!(turn.content.starts_with("User: Remember my dentist appointment"));
    assert!(turn.keywords.contains("dentist"));

    let stored = memory.store().get_all(Partition::Interactions, None).await.unwrap();
    assert_eq!(stored.len(), 1);
}
