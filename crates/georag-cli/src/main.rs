//! georag - terminal client for the GeoRAG chat backend

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use georag_core::config::{self, Config};

use commands::{chat::ChatArgs, replay::ReplayArgs, sessions::SessionsCommand, user::LoginArgs};

#[derive(Debug, Parser)]
#[command(name = "georag", version, about = "Chat with the GeoRAG backend from the terminal")]
struct Cli {
    /// Path to config.toml (default: $GEORAG_HOME/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and GEORAG_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token, overrides config and GEORAG_TOKEN
    #[arg(long, global = true)]
    token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a message and stream the answer
    Chat(ChatArgs),
    /// Run a recorded stream file through the assembler
    Replay(ReplayArgs),
    /// Manage chat sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Log in and print a bearer token
    Login(LoginArgs),
    /// Show the logged-in user's profile and quota
    Profile,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut config = Config::load_with_env(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_overrides(cli.base_url.clone(), cli.token.clone());
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(&cli)?;
    tracing::debug!("Using backend {}", config.server.base_url);

    match cli.command {
        Command::Chat(args) => commands::chat::run(&config, args).await,
        Command::Replay(args) => commands::replay::run(&config, args).await,
        Command::Sessions(command) => commands::sessions::run(&config, command).await,
        Command::Login(args) => commands::user::login(&config, args).await,
        Command::Profile => commands::user::profile(&config).await,
    }
}
