//! Service configuration loaded from TOML, with built-in defaults.
//!
//! Load order:
//! 1. `$MECHAMIND_CONFIG` environment variable (path to TOML file)
//! 2. `./mechamind.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded config is built once in `main` and handed to the router state;
//! nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default values shared between the config structs and the CLI binaries.
pub mod defaults {
    /// HTTP server bind address.
    pub const SERVER_ADDR: &str = "0.0.0.0:8000";

    /// Path the generator writes and the trainer reads.
    pub const DATASET_PATH: &str = "data/vehicle_sensor_data.csv";

    /// Path the trainer writes and the service loads.
    pub const MODEL_PATH: &str = "data/fault_classifier.json";

    /// Rows synthesized by the dataset generator.
    pub const NUM_SAMPLES: usize = 5_000;

    /// Segment count used to place the fault windows (fault starts fall on
    /// segment boundaries: overheating at 1/N, battery failure at 2/N).
    pub const NUM_SEGMENTS: usize = 4;

    /// Random seed for the trainer's train/test split.
    pub const SPLIT_SEED: u64 = 42;

    /// Held-out fraction for evaluation.
    pub const TEST_FRACTION: f64 = 0.2;

    /// Boosting rounds for the fault classifier.
    pub const BOOSTING_ROUNDS: usize = 60;

    /// Shrinkage applied to each tree's contribution.
    pub const LEARNING_RATE: f64 = 0.3;

    /// Maximum regression tree depth.
    pub const MAX_DEPTH: usize = 4;

    /// Hosted chat model requested from the generative-language API.
    pub const CHAT_MODEL: &str = "gemini-1.5-flash";

    /// Environment variable holding the chat API credential.
    pub const CHAT_API_KEY_VAR: &str = "GOOGLE_API_KEY";

    /// Outbound HTTP timeout for the chat API (seconds).
    pub const CHAT_HTTP_TIMEOUT_SECS: u64 = 30;

    /// Browser origins allowed to call the API with credentials.
    pub const CORS_ORIGINS: [&str; 2] = ["http://localhost", "http://localhost:5173"];
}

/// Root service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Model artifact settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Chat assistant settings
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (host:port)
    pub addr: String,
    /// Browser origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
            cors_origins: defaults::CORS_ORIGINS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Model artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the serialized classifier artifact
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: defaults::MODEL_PATH.to_string(),
        }
    }
}

/// Chat assistant settings. The API credential is deliberately NOT part of
/// the config file; it is read from the environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Hosted model name
    pub model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: defaults::CHAT_MODEL.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration using the standard search order:
    /// 1. `$MECHAMIND_CONFIG` environment variable
    /// 2. `./mechamind.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("MECHAMIND_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from MECHAMIND_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from MECHAMIND_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "MECHAMIND_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new("mechamind.toml");
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(path = %local.display(), error = %e, "Failed to load local config, using defaults");
                }
            }
        }

        Self::default()
    }

    /// Load and parse a TOML config file.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?;
        toml::from_str(&contents).map_err(|e| format!("parse {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.addr, defaults::SERVER_ADDR);
        assert_eq!(config.model.path, defaults::MODEL_PATH);
        assert_eq!(config.assistant.model, defaults::CHAT_MODEL);
        assert_eq!(config.server.cors_origins.len(), 2);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServiceConfig =
            toml::from_str("[server]\naddr = \"127.0.0.1:9000\"\ncors_origins = []\n").unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert!(config.server.cors_origins.is_empty());
        // Unspecified sections fall back to defaults
        assert_eq!(config.model.path, defaults::MODEL_PATH);
    }
}
