use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Free-form metadata attached to a stored document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata field every partition uses for importance.
pub const SIGNIFICANCE_FIELD: &str = "significance";

/// Independently queryable namespaces of the document store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Partition {
    /// Assistant configuration mapping (key → value)
    System,
    /// Durable user facts
    Facts,
    /// Contextual conversation turns
    Interactions,
    /// Cached material from email/calendar
    Reference,
    /// Todo items
    Todos,
}

/// Raw unit of storage: an id, the searchable text, and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// Significance stored in metadata, `0.0` when absent or non-numeric.
    pub fn significance(&self) -> f64 {
        self.metadata
            .get(SIGNIFICANCE_FIELD)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// Conjunction of `metadata[key] == value` clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    clauses: Vec<(String, serde_json::Value)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.clauses.push((key.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, serde_json::Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.clauses
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

/// Typed view over a partition's documents.
pub trait Record: Sized {
    const PARTITION: Partition;

    fn id(&self) -> &str;

    fn to_document(&self) -> anyhow::Result<Document>;

    fn from_document(doc: Document) -> anyhow::Result<Self>;
}

/// Decode stored documents, skipping any whose metadata no longer fits `R`.
pub fn decode_records<R: Record>(documents: Vec<Document>) -> Vec<R> {
    documents
        .into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match R::from_document(doc) {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!(partition = %R::PARTITION, %id, %error, "skipping malformed record");
                    None
                }
            }
        })
        .collect()
}

fn encode_meta<T: Serialize>(meta: &T) -> anyhow::Result<Metadata> {
    match serde_json::to_value(meta).context("encode record metadata")? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("record metadata must be an object, got {other}"),
    }
}

fn decode_meta<T: DeserializeOwned>(metadata: Metadata) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::Object(metadata)).context("decode record metadata")
}

// ── Interactions ─────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteractionKind {
    Conversation,
    Command,
    Question,
    Statement,
    Email,
    Calendar,
}

/// One processed free-form turn. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: InteractionKind,
    pub significance: f64,
    pub keywords: BTreeSet<String>,
}

#[derive(Serialize, Deserialize)]
struct InteractionMeta {
    timestamp: DateTime<Utc>,
    kind: InteractionKind,
    significance: f64,
    #[serde(default)]
    keywords: BTreeSet<String>,
}

impl Record for Interaction {
    const PARTITION: Partition = Partition::Interactions;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> anyhow::Result<Document> {
        let meta = encode_meta(&InteractionMeta {
            timestamp: self.timestamp,
            kind: self.kind,
            significance: self.significance,
            keywords: self.keywords.clone(),
        })?;
        Ok(Document::new(&self.id, &self.content, meta))
    }

    fn from_document(doc: Document) -> anyhow::Result<Self> {
        let meta: InteractionMeta = decode_meta(doc.metadata)?;
        Ok(Self {
            id: doc.id,
            content: doc.text,
            timestamp: meta.timestamp,
            kind: meta.kind,
            significance: meta.significance,
            keywords: meta.keywords,
        })
    }
}

// ── Durable facts ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactSource {
    /// Added with `/addfact`
    Explicit,
    /// Pulled out of a chat message by the personal-info rules
    Extracted,
    /// Answer to a drafting question
    Knowledge,
}

/// Fixed significance of every durable fact.
pub const DURABLE_FACT_SIGNIFICANCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DurableFact {
    pub id: String,
    pub text: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub significance: f64,
    pub source: FactSource,
    /// Question key when `source` is `Knowledge`
    pub knowledge_key: Option<String>,
}

impl DurableFact {
    pub fn new(text: impl Into<String>, category: impl Into<String>, source: FactSource) -> Self {
        Self {
            id: format!("fact_{}", uuid::Uuid::new_v4().simple()),
            text: text.into(),
            category: category.into(),
            created_at: Utc::now(),
            significance: DURABLE_FACT_SIGNIFICANCE,
            source,
            knowledge_key: None,
        }
    }

    pub fn knowledge(key: &str, answer: &str) -> Self {
        let mut fact = Self::new(
            format!("{key}: {answer}"),
            KNOWLEDGE_CATEGORY,
            FactSource::Knowledge,
        );
        fact.id = format!("fact_knowledge_{key}");
        fact.knowledge_key = Some(key.to_string());
        fact
    }
}

/// Category of facts recorded while drafting replies.
pub const KNOWLEDGE_CATEGORY: &str = "email_knowledge";

#[derive(Serialize, Deserialize)]
struct FactMeta {
    category: String,
    created_at: DateTime<Utc>,
    significance: f64,
    source: FactSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    knowledge_key: Option<String>,
}

impl Record for DurableFact {
    const PARTITION: Partition = Partition::Facts;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> anyhow::Result<Document> {
        let meta = encode_meta(&FactMeta {
            category: self.category.clone(),
            created_at: self.created_at,
            significance: self.significance,
            source: self.source,
            knowledge_key: self.knowledge_key.clone(),
        })?;
        Ok(Document::new(&self.id, &self.text, meta))
    }

    fn from_document(doc: Document) -> anyhow::Result<Self> {
        let meta: FactMeta = decode_meta(doc.metadata)?;
        Ok(Self {
            id: doc.id,
            text: doc.text,
            category: meta.category,
            created_at: meta.created_at,
            significance: meta.significance,
            source: meta.source,
            knowledge_key: meta.knowledge_key,
        })
    }
}

// ── Reference material ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceSource {
    Email,
    CalendarEvent,
}

/// Cached copy of an external object; safe to evict and recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceItem {
    pub id: String,
    pub text: String,
    pub source: ReferenceSource,
    pub external_id: String,
    pub cached_at: DateTime<Utc>,
}

impl ReferenceItem {
    pub fn new(source: ReferenceSource, external_id: &str, text: impl Into<String>) -> Self {
        Self {
            id: format!("{source}:{external_id}"),
            text: text.into(),
            source,
            external_id: external_id.to_string(),
            cached_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ReferenceMeta {
    source: ReferenceSource,
    external_id: String,
    cached_at: DateTime<Utc>,
}

impl Record for ReferenceItem {
    const PARTITION: Partition = Partition::Reference;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> anyhow::Result<Document> {
        let meta = encode_meta(&ReferenceMeta {
            source: self.source,
            external_id: self.external_id.clone(),
            cached_at: self.cached_at,
        })?;
        Ok(Document::new(&self.id, &self.text, meta))
    }

    fn from_document(doc: Document) -> anyhow::Result<Self> {
        let meta: ReferenceMeta = decode_meta(doc.metadata)?;
        Ok(Self {
            id: doc.id,
            text: doc.text,
            source: meta.source,
            external_id: meta.external_id,
            cached_at: meta.cached_at,
        })
    }
}

// ── System settings ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
}

impl SystemSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Record for SystemSetting {
    const PARTITION: Partition = Partition::System;

    fn id(&self) -> &str {
        &self.key
    }

    fn to_document(&self) -> anyhow::Result<Document> {
        Ok(Document::new(&self.key, &self.value, Metadata::new()))
    }

    fn from_document(doc: Document) -> anyhow::Result<Self> {
        Ok(Self {
            key: doc.id,
            value: doc.text,
        })
    }
}

// ── Todos ────────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: String,
    pub task: String,
    pub priority: Priority,
    pub category: String,
    /// Wall-clock due time in the assistant's timezone
    pub due_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct TodoMeta {
    priority: Priority,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    status: TodoStatus,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Record for Todo {
    const PARTITION: Partition = Partition::Todos;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> anyhow::Result<Document> {
        let meta = encode_meta(&TodoMeta {
            priority: self.priority,
            category: self.category.clone(),
            due_date: self.due_date,
            notes: self.notes.clone(),
            status: self.status,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })?;
        Ok(Document::new(&self.id, &self.task, meta))
    }

    fn from_document(doc: Document) -> anyhow::Result<Self> {
        let meta: TodoMeta = decode_meta(doc.metadata)?;
        Ok(Self {
            id: doc.id,
            task: doc.text,
            priority: meta.priority,
            category: meta.category,
            due_date: meta.due_date,
            notes: meta.notes,
            status: meta.status,
            created_at: meta.created_at,
            completed_at: meta.completed_at,
        })
    }
}
