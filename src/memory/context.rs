use super::traits::DocumentStore;
use super::types::{
    DurableFact, Interaction, Partition, Record, ReferenceItem, SystemSetting, decode_records,
};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Query words that make reference material worth a lookup.
pub const REFERENCE_TRIGGERS: [&str; 6] = ["email", "message", "calendar", "event", "sent", "received"];

/// Upper bounds on each part of a [`ContextBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub facts: usize,
    pub recent: usize,
    pub reference: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            facts: 5,
            recent: 5,
            reference: 2,
        }
    }
}

/// Everything the language model is told about prior state for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextBundle {
    pub system: BTreeMap<String, String>,
    pub user_facts: Vec<DurableFact>,
    pub recent_interactions: Vec<Interaction>,
    pub reference: Vec<ReferenceItem>,
}

/// Optional file the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileContext {
    pub path: String,
    pub content: Option<String>,
}

/// Whether `query` mentions a reference trigger word (singular or plural).
pub fn wants_reference(query: &str) -> bool {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| {
            REFERENCE_TRIGGERS
                .iter()
                .any(|t| token == *t || token.strip_suffix('s') == Some(*t))
        })
}

async fn ranked<R: Record + Send>(store: &dyn DocumentStore, query: &str, k: usize) -> Vec<R> {
    match store.query_similar(R::PARTITION, query, k, None).await {
        Ok(docs) => {
            let mut records: Vec<R> = decode_records(docs);
            records.truncate(k);
            records
        }
        Err(error) => {
            tracing::warn!(partition = %R::PARTITION, %error, "context lookup failed; continuing without it");
            Vec::new()
        }
    }
}

/// Build the bounded context bundle for `query`.
///
/// Storage failures shrink the bundle; they never fail the caller.
pub async fn assemble(
    store: &dyn DocumentStore,
    query: &str,
    limits: ContextLimits,
) -> ContextBundle {
    let system = match store.get_all(Partition::System, None).await {
        Ok(docs) => decode_records::<SystemSetting>(docs)
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "system settings unavailable");
            BTreeMap::new()
        }
    };

    let reference = if wants_reference(query) {
        ranked(store, query, limits.reference).await
    } else {
        Vec::new()
    };

    ContextBundle {
        system,
        user_facts: ranked(store, query, limits.facts).await,
        recent_interactions: ranked(store, query, limits.recent).await,
        reference,
    }
}

impl ContextBundle {
    /// Compose the chat prompt sent to the language model.
    pub fn render_prompt(&self, message: &str, file: Option<&FileContext>) -> String {
        let mut prompt = String::new();
        let name = self
            .system
            .get("assistant_name")
            .map_or("a helpful AI assistant", String::as_str);
        let _ = writeln!(
            prompt,
            "You are {name}, a helpful AI assistant with access to the following context:\n"
        );

        if !self.system.is_empty() {
            prompt.push_str("ASSISTANT SETTINGS:\n");
            for (key, value) in &self.system {
                let _ = writeln!(prompt, "{key}: {value}");
            }
            prompt.push('\n');
        }

        prompt.push_str("PERSONAL INFORMATION ABOUT THE USER:\n");
        if self.user_facts.is_empty() {
            prompt.push_str("No personal information available.\n");
        }
        for fact in &self.user_facts {
            let _ = writeln!(prompt, "- ({}) {}", fact.category, fact.text);
        }

        if !self.reference.is_empty() {
            prompt.push_str("\nRELEVANT EMAILS AND EVENTS:\n");
            for item in &self.reference {
                let _ = writeln!(prompt, "- {}", item.text);
            }
        }

        prompt.push_str("\nRECENT CONVERSATION HISTORY:\n");
        if self.recent_interactions.is_empty() {
            prompt.push_str("No recent conversation history.\n");
        }
        for turn in &self.recent_interactions {
            let _ = writeln!(prompt, "{}", turn.content);
        }

        if let Some(file) = file {
            let _ = write!(
                prompt,
                "\nCurrent file: {}\nContent: {}\n",
                file.path,
                file.content.as_deref().unwrap_or("Not provided")
            );
        }

        let _ = write!(
            prompt,
            "\nCurrent message: {message}\n\n\
Please respond to the current message while taking into account all available context.\n"
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::in_memory::InMemoryStore;
    use crate::memory::types::{FactSource, ReferenceSource};

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 0..4 {
            let item = ReferenceItem::new(
                ReferenceSource::CalendarEvent,
                &format!("evt{i}"),
                format!("Calendar event {i}: standup"),
            );
            store
                .upsert(Partition::Reference, item.to_document().unwrap())
                .await
                .unwrap();
        }
        for i in 0..8 {
            let fact = DurableFact::new(format!("fact {i}"), "general", FactSource::Explicit);
            store
                .upsert(Partition::Facts, fact.to_document().unwrap())
                .await
                .unwrap();
        }
        store
            .upsert(
                Partition::System,
                SystemSetting::new("assistant_name", "Steward")
                    .to_document()
                    .unwrap(),
            )
            .await
            .unwrap();
        store
    }

    #[test]
    fn trigger_words_match_whole_tokens_and_plurals() {
        assert!(wants_reference("any new emails?"));
        assert!(wants_reference("what's on my Calendar"));
        assert!(!wants_reference("resent the invoice"));
        assert!(!wants_reference("how is the weather"));
    }

    #[tokio::test]
    async fn reference_is_gated_by_triggers() {
        let store = seeded().await;
        let limits = ContextLimits::default();

        let plain = assemble(&store, "how is the weather", limits).await;
        assert!(plain.reference.is_empty());
        assert_eq!(plain.user_facts.len(), 5);
        assert_eq!(plain.system.get("assistant_name").map(String::as_str), Some("Steward"));

        let cal = assemble(&store, "what is on my calendar", limits).await;
        assert!(!cal.reference.is_empty());
        assert!(cal.reference.len() <= 2);
    }

    #[test]
    fn prompt_includes_file_context_and_message() {
        let bundle = ContextBundle::default();
        let file = FileContext {
            path: "notes.md".into(),
            content: None,
        };
        let prompt = bundle.render_prompt("summarise this", Some(&file));
        assert!(prompt.contains("Current file: notes.md\nContent: Not provided"));
        assert!(prompt.contains("Current message: summarise this"));
        assert!(prompt.contains("No personal information available."));
    }
}
