//! CLI argument definitions for the gridmap binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Environment variables holding the generative provider key, in lookup order.
const CREDENTIAL_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Grid station map service with an embedded station assistant.
#[derive(Parser, Debug)]
#[command(name = "gridmap", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Station directory TOML file (defaults to the bundled directory).
    #[arg(short = 's', long = "stations")]
    pub stations: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Answer queries from the local directory even if a provider key is set.
    #[arg(long = "offline")]
    pub offline: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GRIDMAP_CONFIG env var > platform default (~/.gridmap/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GRIDMAP_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > GRIDMAP_PORT env var > config file value > 3040.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("GRIDMAP_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3040
    }

    /// Resolve the station directory file.
    ///
    /// Priority: --stations flag > config file value. `None` means bundled data.
    pub fn resolve_stations_path(&self, config_path: Option<&str>) -> Option<PathBuf> {
        self.stations
            .clone()
            .or_else(|| config_path.map(PathBuf::from))
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Read the provider credential once at startup. `--offline` ignores it.
    pub fn resolve_credential(&self) -> Option<String> {
        if self.offline {
            return None;
        }
        CREDENTIAL_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".gridmap").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".gridmap").join("config.toml");
    }
    PathBuf::from("config.toml")
}
