use super::context::{self, ContextBundle, ContextLimits};
use super::dedup;
use super::keywords::KeywordExtractor;
use super::personal;
use super::significance;
use super::traits::DocumentStore;
use super::types::{
    DurableFact, FactSource, Interaction, InteractionKind, KNOWLEDGE_CATEGORY, MetadataFilter,
    Partition, Record, ReferenceItem, SystemSetting, decode_records,
};
use crate::config::{AssistantConfig, MemoryConfig};
use crate::error::StewardError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Result of asking for a durable fact to be stored.
#[derive(Debug, Clone, PartialEq)]
pub enum FactInsert {
    Added(DurableFact),
    /// A fact with identical text already exists (its id)
    Exists(String),
    /// The store rejected the write
    Unavailable,
}

/// Facade over the document store.
///
/// Storage failures are logged and degrade to empty results or `false`;
/// nothing here fails the conversation.
pub struct MemoryManager {
    store: Arc<dyn DocumentStore>,
    keywords: KeywordExtractor,
    threshold: f64,
    auto_save: bool,
    limits: ContextLimits,
}

fn storage_warning(operation: &str, error: &anyhow::Error) {
    let error = StewardError::StorageUnavailable(format!("{error:#}"));
    tracing::warn!(operation, %error, "memory operation degraded");
}

impl MemoryManager {
    pub fn new(store: Arc<dyn DocumentStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            keywords: KeywordExtractor::from_path(config.stopwords_path.as_deref().map(Path::new)),
            threshold: config.significance_threshold,
            auto_save: config.auto_save,
            limits: ContextLimits {
                facts: config.facts_limit,
                recent: config.recent_limit,
                reference: config.reference_limit,
            },
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    async fn put<R: Record + Sync>(&self, operation: &str, record: &R) -> bool {
        let document = match record.to_document() {
            Ok(doc) => doc,
            Err(error) => {
                storage_warning(operation, &error);
                return false;
            }
        };
        match self.store.upsert(R::PARTITION, document).await {
            Ok(()) => true,
            Err(error) => {
                storage_warning(operation, &error);
                false
            }
        }
    }

    async fn all<R: Record + Send>(&self, filter: Option<&MetadataFilter>) -> Vec<R> {
        match self.store.get_all(R::PARTITION, filter).await {
            Ok(docs) => decode_records(docs),
            Err(error) => {
                storage_warning("get_all", &error);
                Vec::new()
            }
        }
    }

    // ── Interactions ─────────────────────────────────────────

    /// Score a chat turn and persist it when it clears the threshold.
    ///
    /// Personal details in the user message are stored as facts either way.
    /// Returns the stored interaction, or `None` when it was discarded.
    pub async fn record_turn(
        &self,
        user_message: &str,
        assistant_response: &str,
        kind: Option<InteractionKind>,
    ) -> Option<Interaction> {
        self.extract_personal_info(user_message).await;

        if !self.auto_save {
            return None;
        }

        let kind = kind.unwrap_or_else(|| significance::classify(user_message));
        let score = significance::score(user_message, kind);
        if !significance::is_significant(score, self.threshold) {
            tracing::debug!(score, threshold = self.threshold, "turn below significance threshold; discarded");
            return None;
        }

        let interaction = Interaction {
            id: format!("turn_{}", uuid::Uuid::new_v4().simple()),
            content: format!("User: {user_message}\nAssistant: {assistant_response}"),
            timestamp: Utc::now(),
            kind,
            significance: score,
            keywords: self.keywords.extract(user_message),
        };
        self.put("record_turn", &interaction)
            .await
            .then_some(interaction)
    }

    // ── Durable facts ────────────────────────────────────────

    /// Store a fact unless one with identical text already exists.
    pub async fn add_long_term_fact(
        &self,
        text: &str,
        category: &str,
        source: FactSource,
    ) -> FactInsert {
        let text = text.trim();
        let existing = match self.store.get_all(Partition::Facts, None).await {
            Ok(docs) => docs,
            Err(error) => {
                storage_warning("add_long_term_fact", &error);
                return FactInsert::Unavailable;
            }
        };
        if let Some(doc) = existing.iter().find(|d| d.text == text) {
            tracing::debug!(id = %doc.id, "fact already stored");
            return FactInsert::Exists(doc.id.clone());
        }

        let fact = DurableFact::new(text, category, source);
        if self.put("add_long_term_fact", &fact).await {
            FactInsert::Added(fact)
        } else {
            FactInsert::Unavailable
        }
    }

    /// Store any self-descriptions found in `message`; returns how many were new.
    pub async fn extract_personal_info(&self, message: &str) -> usize {
        let mut added = 0;
        for detail in personal::extract(message) {
            if let FactInsert::Added(_) = self
                .add_long_term_fact(&detail.fact_text(), detail.category, FactSource::Extracted)
                .await
            {
                added += 1;
            }
        }
        added
    }

    /// Facts oldest first, optionally limited to one category.
    pub async fn list_facts(&self, category: Option<&str>) -> Vec<DurableFact> {
        let filter = category.map(|c| MetadataFilter::new().eq("category", c));
        let mut facts: Vec<DurableFact> = self.all(filter.as_ref()).await;
        facts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        facts
    }

    pub async fn delete_fact(&self, id: &str) -> bool {
        match self.store.delete(Partition::Facts, id).await {
            Ok(deleted) => deleted,
            Err(error) => {
                storage_warning("delete_fact", &error);
                false
            }
        }
    }

    // ── Drafting knowledge ───────────────────────────────────

    /// Answers previously given to drafting questions, by question key.
    pub async fn knowledge(&self) -> BTreeMap<String, String> {
        let filter = MetadataFilter::new().eq("category", KNOWLEDGE_CATEGORY);
        self.all::<DurableFact>(Some(&filter))
            .await
            .into_iter()
            .filter_map(|fact| {
                let key = fact.knowledge_key?;
                let answer = fact
                    .text
                    .strip_prefix(&format!("{key}: "))
                    .map_or_else(|| fact.text.clone(), str::to_string);
                Some((key, answer))
            })
            .collect()
    }

    /// Persist an answer; a later answer to the same key replaces it.
    pub async fn remember_knowledge(&self, key: &str, answer: &str) -> bool {
        self.put("remember_knowledge", &DurableFact::knowledge(key, answer))
            .await
    }

    // ── Reference & system ───────────────────────────────────

    pub async fn cache_reference(&self, item: &ReferenceItem) -> bool {
        self.put("cache_reference", item).await
    }

    /// Write the assistant settings into the system partition.
    pub async fn seed_system(&self, assistant: &AssistantConfig) -> usize {
        let mut settings = vec![
            SystemSetting::new("assistant_name", &assistant.name),
            SystemSetting::new("timezone", &assistant.timezone),
        ];
        if let Some(persona) = &assistant.persona {
            settings.push(SystemSetting::new("persona", persona));
        }
        let mut written = 0;
        for setting in &settings {
            if self.put("seed_system", setting).await {
                written += 1;
            }
        }
        written
    }

    pub async fn system_settings(&self) -> BTreeMap<String, String> {
        self.all::<SystemSetting>(None)
            .await
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect()
    }

    // ── Retrieval & maintenance ──────────────────────────────

    pub async fn assemble_context(&self, query: &str) -> ContextBundle {
        context::assemble(self.store.as_ref(), query, self.limits).await
    }

    /// Deduplicate facts, interactions and reference material; returns the
    /// total number of deletions.
    pub async fn dedup_all(&self) -> usize {
        let mut total = 0;
        for partition in dedup::DEDUP_PARTITIONS {
            match dedup::dedup(self.store.as_ref(), partition).await {
                Ok(deleted) => total += deleted,
                Err(error) => storage_warning("dedup", &error),
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::in_memory::InMemoryStore;

    fn manager_with(config: MemoryConfig) -> MemoryManager {
        MemoryManager::new(Arc::new(InMemoryStore::new()), &config)
    }

    fn manager() -> MemoryManager {
        manager_with(MemoryConfig::default())
    }

    #[tokio::test]
    async fn identical_fact_is_stored_once() {
        let mem = manager();
        let first = mem
            .add_long_term_fact("Allergic to peanuts", "health", FactSource::Explicit)
            .await;
        let FactInsert::Added(fact) = first else {
            panic!("expected insert, got {first:?}");
        };
        let second = mem
            .add_long_term_fact("Allergic to peanuts", "health", FactSource::Explicit)
            .await;
        assert_eq!(second, FactInsert::Exists(fact.id));
        assert_eq!(mem.list_facts(None).await.len(), 1);
    }

    #[tokio::test]
    async fn turns_below_threshold_are_discarded() {
        let mem = manager_with(MemoryConfig {
            significance_threshold: 0.6,
            ..MemoryConfig::default()
        });
        assert!(
            mem.record_turn("nice weather", "Indeed.", Some(InteractionKind::Statement))
                .await
                .is_none()
        );
        assert!(
            mem.store()
                .get_all(Partition::Interactions, None)
                .await
                .unwrap()
                .is_empty()
        );

        let kept = mem
            .record_turn("dentist appointment", "Noted.", Some(InteractionKind::Calendar))
            .await
            .unwrap();
        assert!((kept.significance - 0.92).abs() < 1e-9);
        assert!(kept.keywords.contains("dentist"));
        assert_eq!(kept.content, "User: dentist appointment\nAssistant: Noted.");
    }

    #[tokio::test]
    async fn record_turn_extracts_personal_info() {
        let mem = manager();
        mem.record_turn("my name is Grace", "Hello Grace!", None).await;
        let facts = mem.list_facts(Some("name")).await;
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].text, "name: Grace");
        assert_eq!(facts[0].source, FactSource::Extracted);
    }

    #[tokio::test]
    async fn knowledge_round_trips_by_key() {
        let mem = manager();
        assert!(mem.remember_knowledge("office_hours", "Tue 2-4pm").await);
        assert!(mem.remember_knowledge("office_hours", "Wed 1-3pm").await);
        let knowledge = mem.knowledge().await;
        assert_eq!(knowledge.len(), 1);
        assert_eq!(knowledge["office_hours"], "Wed 1-3pm");
    }

    #[tokio::test]
    async fn seed_system_populates_context() {
        let mem = manager();
        assert_eq!(mem.seed_system(&AssistantConfig::default()).await, 2);
        let bundle = mem.assemble_context("hello").await;
        assert_eq!(bundle.system["assistant_name"], "Steward");
        assert_eq!(bundle.system["timezone"], "America/New_York");
    }

    #[tokio::test]
    async fn delete_fact_reports_missing_ids() {
        let mem = manager();
        let FactInsert::Added(fact) = mem
            .add_long_term_fact("Prefers mornings", "general", FactSource::Explicit)
            .await
        else {
            panic!("expected insert");
        };
        assert!(mem.delete_fact(&fact.id).await);
        assert!(!mem.delete_fact(&fact.id).await);
    }
}
