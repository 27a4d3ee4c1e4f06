use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite" | "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Persist free-form chat turns that clear the significance gate
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// Minimum significance for a conversational turn to be stored
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
    /// Collapse duplicate documents in every partition at startup
    #[serde(default = "default_true")]
    pub dedup_on_startup: bool,
    /// Optional newline-separated stopword file; the built-in list is used when unreadable
    #[serde(default)]
    pub stopwords_path: Option<String>,
    #[serde(default = "default_facts_limit")]
    pub facts_limit: usize,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_reference_limit")]
    pub reference_limit: usize,
    /// Embedding provider: "none" | "ollama"
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,
    /// Embedding model served by the provider (e.g. "nomic-embed-text")
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Weight for keyword BM25 in hybrid search (0.0–1.0)
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    /// Weight for vector similarity in hybrid search (0.0–1.0)
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,
}

fn default_backend() -> String {
    "sqlite".into()
}
fn default_true() -> bool {
    true
}
fn default_significance_threshold() -> f64 {
    0.3
}
fn default_facts_limit() -> usize {
    5
}
fn default_recent_limit() -> usize {
    5
}
fn default_reference_limit() -> usize {
    2
}
fn default_embedding_provider() -> String {
    "none".into()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_keyword_weight() -> f64 {
    0.3
}
fn default_vector_weight() -> f64 {
    0.7
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            auto_save: true,
            significance_threshold: default_significance_threshold(),
            dedup_on_startup: true,
            stopwords_path: None,
            facts_limit: default_facts_limit(),
            recent_limit: default_recent_limit(),
            reference_limit: default_reference_limit(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            keyword_weight: default_keyword_weight(),
            vector_weight: default_vector_weight(),
        }
    }
}
