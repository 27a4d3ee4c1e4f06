pub mod schema;

pub use schema::{
    AssistantConfig, Config, DialogueConfig, FilesConfig, GatewayConfig, LlmConfig, MemoryConfig,
    ProvidersConfig,
};
