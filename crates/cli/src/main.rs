//! arXiv Sentinel CLI: the main entry point.
//!
//! Commands:
//! - `chat`      Run an agent session that helps set up and manage arXiv Sentinel
//! - `onboard`   Create the config directory, config file and knowledge base
//! - `actions`   List the action vocabulary and confirmation policy
//! - `digest`    Trigger the paper digest job once
//! - `config`    Show, locate or validate the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "arXiv Sentinel — an action-dispatch agent for deploying and running your paper digest",
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
    /// Start an agent session
    Chat {
        /// Opening request passed to the agent
        #[arg(short, long)]
        message: Option<String>,

        /// Override the model (`provider/model` selects a provider)
        #[arg(long)]
        model: Option<String>,

        /// Run every action without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Initialize configuration and knowledge base
    Onboard,

    /// List available actions
    Actions,

    /// Trigger the digest job
    Digest,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the interactive session.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            model,
            yes,
        } => commands::chat::run(message, model, yes).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Actions => commands::actions::run().await?,
        Commands::Digest => commands::digest::run().await?,
        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::config_cmd::show().await?,
            ConfigCommand::Path => commands::config_cmd::path().await?,
            ConfigCommand::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
