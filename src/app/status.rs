use steward::Config;

pub fn render_status(config: &Config, backend: &str, memory_healthy: bool) -> String {
    let lines = [
        "◆ Steward status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Workspace   {}", config.workspace_dir.display()),
        format!("Config      {}", config.config_path.display()),
        String::new(),
        format!("  Assistant   {} ({})", config.assistant.name, config.assistant.timezone),
        format!("  LLM         {} {} @ {}", config.llm.provider, config.llm.model, config.llm.base_url),
        format!(
            "  Memory      {backend} [{}]",
            if memory_healthy { "ok" } else { "degraded" }
        ),
        format!(
            "   threshold  {:.2}, auto_save={}",
            config.memory.significance_threshold, config.memory.auto_save
        ),
        format!("  Rules       {} drafting question(s)", config.dialogue.rules.len()),
        format!("  Gateway     {}:{}", config.gateway.host, config.gateway.port),
        format!("  Files       {}", config.files.root),
    ];
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_degraded_memory() {
        let config = Config::default();
        let text = render_status(&config, "memory", false);
        assert!(text.contains("memory [degraded]"));
        assert!(text.contains(&config.llm.model));
    }
}
