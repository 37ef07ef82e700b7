use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration for the grid map service.
///
/// Loaded from `~/.gridmap/config.toml` by default. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridmapConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub map: MapConfig,
}

impl GridmapConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration if the file exists.
    ///
    /// A missing file is `Ok(None)`; a file that exists but cannot be read
    /// or parsed is an error.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port for the map API.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
        }
    }
}

/// Where the station directory comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Path to a stations TOML file. `None` uses the bundled directory.
    pub path: Option<String>,
}

/// Assistant (query resolver) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Generative model used in online mode.
    pub model: String,
    /// Base URL of the generative language API.
    pub endpoint: String,
    /// Provider request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Artificial latency of the offline resolver, in milliseconds.
    pub offline_delay_ms: u64,
    /// Maximum number of "similar results" listed by the offline resolver.
    pub max_similar: usize,
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 30,
            offline_delay_ms: 800,
            max_similar: 3,
            max_message_length: 2000,
        }
    }
}

/// Map presentation policy consumed by the view layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Initial map center `[lat, lng]` (São Paulo).
    pub default_center: [f64; 2],
    pub default_zoom: u8,
    /// Zoom level used when flying to a selected station.
    pub fly_to_zoom: u8,
    /// Fly-to animation duration in milliseconds.
    pub fly_to_duration_ms: u64,
    /// Viewports narrower than this collapse the sidebar after a selection.
    pub mobile_breakpoint_px: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: [-23.5505, -46.6333],
            default_zoom: 11,
            fly_to_zoom: 14,
            fly_to_duration_ms: 1500,
            mobile_breakpoint_px: 768,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridmapError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = GridmapConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.port, 3040);
        assert!(config.directory.path.is_none());
        assert_eq!(config.assistant.model, "gemini-2.5-flash");
        assert_eq!(config.assistant.max_similar, 3);
        assert_eq!(config.map.fly_to_zoom, 14);
        assert_eq!(config.map.fly_to_duration_ms, 1500);
        assert_eq!(config.map.mobile_breakpoint_px, 768);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"
port = 8080

[directory]
path = "/etc/gridmap/stations.toml"

[assistant]
offline_delay_ms = 0
max_similar = 5

[map]
fly_to_zoom = 15
"#;
        let file = create_temp_config(content);
        let config = GridmapConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.port, 8080);
        assert_eq!(
            config.directory.path.as_deref(),
            Some("/etc/gridmap/stations.toml")
        );
        assert_eq!(config.assistant.offline_delay_ms, 0);
        assert_eq!(config.assistant.max_similar, 5);
        // Unspecified keys keep their defaults
        assert_eq!(config.assistant.request_timeout_secs, 30);
        assert_eq!(config.map.fly_to_zoom, 15);
        assert_eq!(config.map.default_zoom, 11);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[general]\nlog_level = \"warn\"\n");
        let config = GridmapConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.port, 3040);
        assert_eq!(config.assistant.offline_delay_ms, 800);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[general\nport = ");
        let result = GridmapConfig::load(file.path());
        assert!(matches!(result, Err(GridmapError::Config(_))));
    }

    #[test]
    fn test_load_if_present_missing_file() {
        let loaded = GridmapConfig::load_if_present(Path::new("/nonexistent/config.toml"));
        assert!(loaded.unwrap().is_none());
    }

    #[test]
    fn test_load_if_present_reads_existing_file() {
        let file = create_temp_config("[assistant]\noffline_delay_ms = 10\n");
        let config = GridmapConfig::load_if_present(file.path())
            .unwrap()
            .unwrap();
        assert_eq!(config.assistant.offline_delay_ms, 10);
        assert_eq!(config.general.port, 3040);
    }

    #[test]
    fn test_load_if_present_invalid_file_is_error() {
        let file = create_temp_config("port = [");
        let result = GridmapConfig::load_if_present(file.path());
        assert!(matches!(result, Err(GridmapError::Config(_))));
    }
}
