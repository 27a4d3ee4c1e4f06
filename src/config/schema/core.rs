use super::{DialogueConfig, GatewayConfig, MemoryConfig};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("."),
            config_path: PathBuf::from("config.toml"),
            assistant: AssistantConfig::default(),
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            dialogue: DialogueConfig::default(),
            providers: ProvidersConfig::default(),
            gateway: GatewayConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.memory.significance_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Validation(format!(
                "memory.significance_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.memory.facts_limit == 0
            || self.memory.recent_limit == 0
            || self.memory.reference_limit == 0
        {
            return Err(ConfigError::Validation(
                "memory context limits must be greater than zero".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        for rule in &self.dialogue.rules {
            if rule.key.trim().is_empty() || rule.triggers.is_empty() {
                return Err(ConfigError::Validation(
                    "dialogue rules need a key and at least one trigger".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Values seeded into the system partition on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub persona: Option<String>,
}

fn default_assistant_name() -> String {
    "Steward".into()
}

fn default_timezone() -> String {
    "America/New_York".into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            timezone: default_timezone(),
            persona: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Only "ollama" ships in-crate.
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_provider() -> String {
    "ollama".into()
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_llm_model() -> String {
    "mistral:7b-instruct".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_llm_timeout_secs() -> u64 {
    120
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_provider_timeout_secs")]
    pub email_timeout_secs: u64,
    #[serde(default = "default_provider_timeout_secs")]
    pub calendar_timeout_secs: u64,
    /// Number of unread emails listed when `/email list` has no argument
    #[serde(default = "default_email_list_limit")]
    pub email_list_limit: usize,
    /// Number of events listed when `/calendar list` has no argument
    #[serde(default = "default_calendar_list_limit")]
    pub calendar_list_limit: usize,
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_email_list_limit() -> usize {
    5
}

fn default_calendar_list_limit() -> usize {
    10
}

impl ProvidersConfig {
    pub fn email_timeout(&self) -> Duration {
        Duration::from_secs(self.email_timeout_secs.max(1))
    }

    pub fn calendar_timeout(&self) -> Duration {
        Duration::from_secs(self.calendar_timeout_secs.max(1))
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            email_timeout_secs: default_provider_timeout_secs(),
            calendar_timeout_secs: default_provider_timeout_secs(),
            email_list_limit: default_email_list_limit(),
            calendar_list_limit: default_calendar_list_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Browsing root; `~` is expanded
    #[serde(default = "default_files_root")]
    pub root: String,
    #[serde(default)]
    pub show_hidden: bool,
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
}

fn default_files_root() -> String {
    "~".into()
}

fn default_max_read_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_max_search_results() -> usize {
    50
}

impl FilesConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.root).into_owned())
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_files_root(),
            show_hidden: false,
            max_read_bytes: default_max_read_bytes(),
            max_search_results: default_max_search_results(),
        }
    }
}
