mod core;
mod dialogue;
mod env_overrides;
mod gateway;
mod loader;
mod memory;

pub use core::{AssistantConfig, Config, FilesConfig, LlmConfig, ProvidersConfig};
pub use dialogue::DialogueConfig;
pub use gateway::GatewayConfig;
pub use memory::MemoryConfig;
