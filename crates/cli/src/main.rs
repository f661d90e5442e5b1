//! ragchat CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config
//! - `gateway`  — Start the HTTP chat server
//! - `ingest`   — Load instruction and domain files into the vector index
//! - `status`   — Show the effective configuration
//! - `doctor`   — Diagnose configuration and collaborators

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ragchat",
    about = "ragchat — retrieval-augmented chat over a SQL database",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Embed and index knowledge files, one passage per line
    Ingest {
        /// File of instruction passages
        #[arg(long)]
        instruction: Option<PathBuf>,

        /// File of domain knowledge passages
        #[arg(long)]
        domain: Option<PathBuf>,
    },

    /// Show the effective configuration
    Status,

    /// Diagnose configuration, database and index
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Ingest { instruction, domain } => {
            commands::ingest::run(instruction, domain).await?
        }
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
