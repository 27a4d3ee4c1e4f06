use clap::{Parser, Subcommand};

/// `Steward` - personal assistant with email drafting, calendar and memory.
#[derive(Parser, Debug)]
#[command(name = "steward")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A personal assistant with contextual memory.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Talk to the assistant (interactive when no message is given)
    Chat {
        /// Single message to send
        #[arg(short, long)]
        message: Option<String>,

        /// Dialogue session to use
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start the HTTP gateway
    Gateway {
        /// Port to listen on (use 0 for random available port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Inspect and maintain the memory store
    Memory {
        #[command(subcommand)]
        memory_command: MemoryCommands,
    },

    /// Show configuration and store health
    Status,
}

#[derive(Subcommand, Debug)]
pub enum MemoryCommands {
    /// Remove duplicate documents from every partition
    Dedup,

    /// List durable facts
    Facts {
        /// Only facts in this category
        category: Option<String>,
    },
}
