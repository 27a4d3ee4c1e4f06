use crate::app::status::render_status;
use crate::cli::commands::{Cli, Commands, MemoryCommands};
use anyhow::Result;
use std::sync::Arc;
use steward::Config;
use steward::dialogue::DEFAULT_SESSION;
use steward::memory::{MemoryManager, create_store};
use steward::providers::{UnconfiguredCalendar, UnconfiguredEmail, create_language_model};
use steward::router::{Assistant, Providers};
use steward::transport::gateway::{AppState, run_gateway};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Open the configured store and run startup maintenance.
async fn open_memory(config: &Config) -> Result<MemoryManager> {
    let store = create_store(&config.memory, &config.workspace_dir, &config.llm.base_url).await?;
    let memory = MemoryManager::new(store, &config.memory);
    if config.memory.dedup_on_startup {
        let removed = memory.dedup_all().await;
        if removed > 0 {
            info!(removed, "removed duplicate memory documents");
        }
    }
    memory.seed_system(&config.assistant).await;
    Ok(memory)
}

async fn build_assistant(config: &Config) -> Result<Assistant> {
    let memory = open_memory(config).await?;
    // no email or calendar backend ships in-crate
    let providers = Providers {
        email: Arc::new(UnconfiguredEmail),
        calendar: Arc::new(UnconfiguredCalendar),
        llm: create_language_model(&config.llm)?,
    };
    Ok(Assistant::new(config, memory, providers))
}

async fn run_chat(config: &Config, message: Option<String>, session: Option<String>) -> Result<()> {
    let assistant = build_assistant(config).await?;
    let session = session.unwrap_or_else(|| DEFAULT_SESSION.to_string());

    if let Some(message) = message {
        let cancel = CancellationToken::new();
        let reply = assistant.handle(&session, &message, None, &cancel).await;
        println!("{reply}");
        return Ok(());
    }

    println!("◆ {} is listening. Type /help for commands, exit to quit.", config.assistant.name);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let cancel = CancellationToken::new();
        tokio::select! {
            reply = assistant.handle(&session, line, None, &cancel) => println!("{reply}\n"),
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                println!("\n(cancelled)");
            }
        }
    }
    Ok(())
}

async fn run_memory(config: &Config, command: MemoryCommands) -> Result<()> {
    let memory = open_memory(config).await?;
    match command {
        MemoryCommands::Dedup => {
            let removed = memory.dedup_all().await;
            println!("Removed {removed} duplicate document(s).");
        }
        MemoryCommands::Facts { category } => {
            let facts = memory.list_facts(category.as_deref()).await;
            if facts.is_empty() {
                println!("No facts found.");
            }
            for fact in facts {
                println!("[{}] ({}) {}", fact.id, fact.category, fact.text);
            }
        }
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Chat { message, session } => run_chat(&config, message, session).await,

        Commands::Gateway { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting Steward gateway on {host} (random port)");
            } else {
                info!("Starting Steward gateway on {host}:{port}");
            }
            let assistant = build_assistant(&config).await?;
            let state = AppState {
                assistant: Arc::new(assistant),
            };
            run_gateway(&host, port, &config.gateway, state).await
        }

        Commands::Memory { memory_command } => run_memory(&config, memory_command).await,

        Commands::Status => {
            let memory = open_memory(&config).await?;
            let healthy = memory.health_check().await;
            println!("{}", render_status(&config, memory.store().name(), healthy));
            Ok(())
        }
    }
}
