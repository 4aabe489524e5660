//! Ain Bondhu CLI — the main entry point.
//!
//! Commands:
//! - `serve` — Start the HTTP gateway
//! - `ask`   — One-shot or interactive chat from the terminal
//! - `check` — Validate config and the knowledge corpus

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ainbondhu",
    about = "Ain Bondhu — Bengali legal assistant chatbot",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a legal question from the terminal
    Ask {
        /// Send a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Validate configuration and the knowledge corpus
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { message } => commands::ask::run(message).await?,
        Commands::Check => commands::check::run().await?,
    }

    Ok(())
}
