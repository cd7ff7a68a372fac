//! Medhub - Main Entry Point
//!
//! Loads configuration, wires the routing core, and serves the HTTP caller
//! layer until a shutdown signal arrives.

use clap::{Parser, Subcommand};
use medhub::config::HubConfig;
use medhub::observability::init_default_logging;
use medhub::registry::AgentRegistry;
use medhub::server::ApiServer;
use medhub::service::HubService;
use medhub::task::InMemoryTaskStore;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Routing and task orchestration hub for a multi-agent network
#[derive(Parser)]
#[command(name = "medhub")]
#[command(about = "Routing and task orchestration hub for a multi-agent network")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hub
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting medhub v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_hub(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Hub shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<HubConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(HubConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = vec!["hub.toml", "config/hub.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(HubConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create hub.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_hub(config: HubConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Hub starting with id: {}", config.hub.id);

    let registry = Arc::new(AgentRegistry::from_entries(
        &config.agents,
        &config.routing.default_agent,
    )?);
    let store = Arc::new(InMemoryTaskStore::new());
    let service = Arc::new(HubService::from_config(&config, store)?);

    let server = Arc::new(ApiServer::new(
        config.hub.id.clone(),
        config.hub.bind_port,
        service,
        registry,
    ));

    let server_handle = tokio::spawn(server.start());

    // Graceful shutdown on SIGINT/SIGTERM
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    info!(
        "Hub is serving on port {} with {} registered agents",
        config.hub.bind_port,
        config.agents.len()
    );

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
        _ = server_handle => {
            error!("API server stopped unexpectedly");
        }
    }

    Ok(())
}

fn handle_config_command(
    config: HubConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current hub configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
