//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_fetch_limit() -> usize {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

/// Live streaming configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Heartbeat interval on update channels (seconds)
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    /// Fixed delay between watch reconnect attempts (seconds)
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
}

fn default_keepalive() -> u64 {
    30
}

fn default_retry_backoff() -> u64 {
    5
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive(),
            retry_backoff_secs: default_retry_backoff(),
        }
    }
}

/// Telemetry source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Optional telemetry file (CSV or JSON) loaded into the store at
    /// startup
    pub seed_file: Option<PathBuf>,

    /// Collection the seed file loads into
    #[serde(default = "default_seed_collection")]
    pub seed_collection: String,
}

fn default_seed_collection() -> String {
    "telemetry_data".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            seed_collection: default_seed_collection(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("groundtrack").join("config.toml")),
            Some(PathBuf::from("/etc/groundtrack/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // API overrides
        if let Ok(host) = std::env::var("GROUNDTRACK_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("GROUNDTRACK_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Source overrides
        if let Ok(seed) = std::env::var("GROUNDTRACK_SEED_FILE") {
            self.source.seed_file = Some(PathBuf::from(seed));
        }
        if let Ok(collection) = std::env::var("GROUNDTRACK_SEED_COLLECTION") {
            self.source.seed_collection = collection;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("GROUNDTRACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("GROUNDTRACK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 4000);
        assert_eq!(config.api.fetch_limit, 1000);
        assert_eq!(config.stream.keepalive_secs, 30);
        assert_eq!(config.stream.retry_backoff_secs, 5);
        assert_eq!(config.source.seed_collection, "telemetry_data");
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nport = 9000\n\n[stream]\nkeepalive_secs = 10"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.stream.keepalive_secs, 10);
        assert_eq!(config.stream.retry_backoff_secs, 5);
    }

    #[test]
    fn test_load_bad_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
