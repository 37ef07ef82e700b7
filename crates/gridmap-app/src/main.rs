//! gridmap application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Load the station directory (file or bundled)
//! 4. Pick the assistant strategy from the provider credential, once
//! 5. Start the axum REST/SSE server

mod cli;

use std::sync::Arc;

use clap::Parser;

use gridmap_api::{start_server, AppState};
use gridmap_chat::build_resolver;
use gridmap_core::{GridmapConfig, StationDirectory};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let loaded = GridmapConfig::load_if_present(&config_file)?;
    let config_found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    config.general.port = args.resolve_port(config.general.port);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);
    config.directory.path = args
        .resolve_stations_path(config.directory.path.as_deref())
        .map(|p| p.to_string_lossy().to_string());

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting gridmap v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }

    // Station directory.
    let directory = match config.directory.path.as_deref() {
        Some(path) => StationDirectory::load(std::path::Path::new(path))?,
        None => {
            let directory = StationDirectory::builtin()?;
            tracing::info!(stations = directory.len(), "Using bundled station directory");
            directory
        }
    };

    // Assistant strategy.
    let credential = args.resolve_credential();
    let resolver = build_resolver(&config.assistant, credential.as_deref())?;

    // === API server ===
    let state = AppState::new(config.clone(), Arc::new(directory), resolver);
    start_server(&config, state).await?;

    Ok(())
}
