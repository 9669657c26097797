//! Container Manager CLI
//!
//! A command-line tool for listing managed containers, reading their logs,
//! running lifecycle commands and viewing utilization.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{containers, login, performance};

/// Container Manager CLI
#[derive(Parser)]
#[command(name = "cmctl")]
#[command(author, version, about = "CLI for the Container Manager", long_about = None)]
pub struct Cli {
    /// Manager URL (can also be set via CMCTL_API_URL env var)
    #[arg(long, env = "CMCTL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Bearer token (defaults to the one saved by `cmctl login`)
    #[arg(long, env = "CMCTL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List managed containers
    Ls,

    /// Show container logs
    Logs {
        /// Container id or name
        id: String,

        /// Only lines newer than this many seconds ago
        #[arg(long)]
        since: Option<u64>,

        /// Only lines older than this many seconds ago
        #[arg(long)]
        until: Option<u64>,
    },

    /// Start a container
    Start {
        /// Container id or name
        id: String,
    },

    /// Stop a container
    Stop {
        /// Container id or name
        id: String,
    },

    /// Pause a container
    Pause {
        /// Container id or name
        id: String,
    },

    /// Resume a paused container
    Resume {
        /// Container id or name
        id: String,
    },

    /// Delete a stopped container
    Rm {
        /// Container id or name
        id: String,
    },

    /// Show CPU and memory utilization
    Perf,

    /// Log in to the identity service and save the token
    Login {
        /// Identity service URL
        #[arg(long, env = "CMCTL_IDENTITY_URL")]
        identity_url: String,

        #[arg(long, short)]
        username: String,

        #[arg(long, short)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let token = config::resolve_token(cli.token);
    let client = client::ApiClient::new(&cli.api_url, token)?;

    // Execute command
    match cli.command {
        Commands::Ls => containers::list_containers(&client, cli.format).await?,
        Commands::Logs { id, since, until } => {
            containers::show_logs(&client, &id, since, until, cli.format).await?
        }
        Commands::Start { id } => containers::run_command(&client, &id, "start").await?,
        Commands::Stop { id } => containers::run_command(&client, &id, "stop").await?,
        Commands::Pause { id } => containers::run_command(&client, &id, "pause").await?,
        Commands::Resume { id } => containers::run_command(&client, &id, "resume").await?,
        Commands::Rm { id } => containers::delete_container(&client, &id).await?,
        Commands::Perf => performance::show_performance(&client, cli.format).await?,
        Commands::Login {
            identity_url,
            username,
            password,
        } => login::login(&identity_url, &username, &password).await?,
    }

    Ok(())
}
