use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use mintchat::chat;
use mintchat::config::RelayConfig;
use mintchat::web_server;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web server hosting the chat page and relay endpoints.
    Serve {
        #[arg(long, env = "MINTCHAT_PORT", default_value_t = 9900, help = "Port for the web server.")]
        port: u16,
    },
    /// Engage in a text-based chat session from the terminal.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Initialize tracing (logging) subscriber
    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,mintchat=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Arc::new(RelayConfig::from_env());

    match cli.command {
        Commands::Serve { port } => {
            info!("Starting mintchat web server on port {}...", port);
            web_server::start_web_server(port, config)
                .await
                .context("Web server failed")?;
        }
        Commands::Chat => {
            info!("Starting interactive chat session...");
            chat::run_chat(&config).await.context("Chat session failed")?;
            info!("Chat session finished.");
        }
    }

    Ok(())
}
