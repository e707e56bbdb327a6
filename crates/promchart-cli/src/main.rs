//! promchart CLI
//!
//! Command-line interface for asking metrics questions through the API server.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "promchart")]
#[command(about = "CLI tool for the promchart metrics assistant")]
#[command(version)]
struct Cli {
    /// API server URL
    #[arg(
        long,
        env = "PROMCHART_API_URL",
        default_value = "http://localhost:8000"
    )]
    api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Compact,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a natural-language question about metrics
    Ask {
        /// The question
        query: String,
    },

    /// Fetch the fixed sample chart
    Fixed,

    /// List the tools the agent exposes to the model
    Tools,

    /// Show server health
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask { query } => {
            commands::ask::handle(&cli.api_url, &query, cli.format).await?;
        }
        Commands::Fixed => {
            commands::ask::handle_fixed(&cli.api_url, cli.format).await?;
        }
        Commands::Tools => {
            commands::status::handle_tools(&cli.api_url, cli.format).await?;
        }
        Commands::Health => {
            commands::status::handle(&cli.api_url, cli.format).await?;
        }
    }

    Ok(())
}
