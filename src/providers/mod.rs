pub mod calendar;
pub mod email;
pub mod guard;
pub mod llm;
pub mod ollama;
pub mod time;
pub mod unconfigured;

pub use calendar::{CalendarProvider, Event, EventRequest, Recurrence};
pub use email::{Email, EmailProvider};
pub use guard::guarded;
pub use llm::LanguageModel;
pub use ollama::OllamaModel;
pub use time::NaturalTimeParser;
pub use unconfigured::{UnconfiguredCalendar, UnconfiguredEmail};

use crate::config::LlmConfig;
use std::sync::Arc;

/// Language model named by `[llm].provider`.
pub fn create_language_model(config: &LlmConfig) -> anyhow::Result<Arc<dyn LanguageModel>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaModel::from_config(config))),
        other => anyhow::bail!("Unknown llm provider '{other}'. Supported: ollama"),
    }
}
