use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("STEWARD_MODEL")
            && !model.is_empty()
        {
            self.llm.model = model;
        }

        if let Ok(url) = std::env::var("STEWARD_OLLAMA_URL").or_else(|_| std::env::var("OLLAMA_HOST"))
            && !url.is_empty()
        {
            self.llm.base_url = url;
        }

        if let Ok(workspace) = std::env::var("STEWARD_WORKSPACE")
            && !workspace.is_empty()
        {
            self.workspace_dir = PathBuf::from(workspace);
        }

        if let Ok(port_str) =
            std::env::var("STEWARD_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Ok(host) = std::env::var("STEWARD_GATEWAY_HOST")
            && !host.is_empty()
        {
            self.gateway.host = host;
        }

        if let Ok(temp_str) = std::env::var("STEWARD_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.llm.temperature = temp;
        }
    }
}
