//! Wiregrant CLI - Main Entry Point
//!
//! Command-line interface for the Wiregrant provisioning service:
//! identity checks, tunnel credential provisioning, and storage access.

use clap::{Parser, Subcommand};

mod client;
mod commands;
mod output;

use commands::{identity, storage, tunnel};

/// Wiregrant CLI - name-authenticated tunnel provisioning
#[derive(Parser)]
#[command(name = "wiregrant")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Service address
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "WIREGRANT_SERVER", global = true)]
    server: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and verify registered names
    #[command(subcommand)]
    Identity(identity::IdentityCommands),

    /// Provision tunnel credentials
    #[command(subcommand)]
    Tunnel(tunnel::TunnelCommands),

    /// Access the content store
    #[command(subcommand)]
    Storage(storage::StorageCommands),

    /// Check service health
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = client::ApiClient::new(&cli.server);

    match cli.command {
        Commands::Identity(command) => identity::run(command, &client, cli.format).await?,
        Commands::Tunnel(command) => tunnel::run(command, &client, cli.format).await?,
        Commands::Storage(command) => storage::run(command, &client, cli.format).await?,
        Commands::Status => {
            if client.health_check().await {
                output::print_message("Service is reachable", cli.format);
            } else {
                output::print_message("Service is not reachable", cli.format);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("wiregrant {}", wiregrant_common::VERSION);
        }
    }

    Ok(())
}
