mod catalog_cmd;
mod demo;
mod repl_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use cmdrouter_commands::CommandRouter;
use cmdrouter_config::{config_dir, config_file_path, load_and_prepare, RouterConfig};
use cmdrouter_logging::{init_logger, LogOptions};
use cmdrouter_providers::ProviderRegistry;

use repl_cmd::ReplOptions;
use terminal_output::{note_error, note_warn};

#[derive(Parser)]
#[command(name = "cmdrouter")]
#[command(about = "cmdrouter: route chat messages to bot commands with an LLM")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.cmdrouter/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route lines typed on stdin through the demo plugin host
    Repl {
        /// Send messages as a bot admin
        #[arg(long)]
        admin: bool,
        /// Send messages without mentioning or waking the bot
        #[arg(long)]
        no_wake: bool,
        /// Conversation origin used for provider selection
        #[arg(long, default_value = "local:private:0")]
        origin: String,
        #[arg(long, default_value = "0")]
        sender: String,
        /// Provider to select for this conversation
        #[arg(long)]
        provider: Option<String>,
    },
    /// Print the command catalog, and the prompt for a sample message
    Catalog {
        #[arg(short, long)]
        message: Option<String>,
        /// Print briefs as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn log_options(config: &RouterConfig) -> LogOptions {
    let mut options = LogOptions::default();
    if let Some(logging) = &config.logging {
        if let Some(level) = &logging.level {
            options.level = level.clone();
        }
        options.dir = logging.dir.as_ref().map(PathBuf::from);
        options.json = logging.json.unwrap_or(false);
    }
    options
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli.config.clone().unwrap_or_else(|| config_file_path(&config_dir()));

    let prepared = match load_and_prepare(&path).await {
        Ok(prepared) => prepared,
        Err(e) => {
            note_error(&format!("{}: {:#}", path.display(), e));
            return Err(e);
        }
    };
    let config = prepared.config;
    init_logger(&log_options(&config));
    for warning in &prepared.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }

    let gateway = ProviderRegistry::from_config(&config);
    if gateway.list().is_empty() {
        note_warn("未配置任何 LLM 供应商，消息将无法匹配");
    }
    if let Commands::Repl { origin, provider: Some(id), .. } = &cli.command {
        gateway.select_for(origin, id).await?;
        info!(origin = %origin, provider = %id, "Selected provider for REPL conversation");
    }

    let host = demo::demo_host();
    let router = CommandRouter::new(config, host, Arc::new(gateway));

    match cli.command {
        Commands::Repl { admin, no_wake, origin, sender, .. } => {
            router.on_host_ready().await;
            let options = ReplOptions { admin, woken: !no_wake, origin, sender };
            repl_cmd::run(&router, &options).await?;
        }
        Commands::Catalog { message, json } => {
            catalog_cmd::run(&router, message.as_deref(), json).await?;
        }
    }

    Ok(())
}
