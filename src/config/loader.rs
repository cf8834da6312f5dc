use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON file '{path}': {source}")]
    JsonParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Read a file, mapping failures to `ConfigError::ReadError`.
pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse TOML content, mapping failures to `ConfigError::ParseError`.
pub(crate) fn parse_toml<T: serde::de::DeserializeOwned>(
    path: &Path,
    content: &str,
) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/spinweave/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("spinweave").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        let config: Config = parse_toml(path, &content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Batch size, combination cap and partition count are positive
    /// - The default namespace is not blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.defaults;

        if defaults.batch_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "defaults.batch_size must be at least 1".to_string(),
            });
        }

        if defaults.max_combinations == 0 {
            return Err(ConfigError::ValidationError {
                message: "defaults.max_combinations must be at least 1".to_string(),
            });
        }

        if defaults.partitions == 0 {
            return Err(ConfigError::ValidationError {
                message: "defaults.partitions must be at least 1".to_string(),
            });
        }

        if defaults.namespace.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "defaults.namespace must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[defaults]\nbatch_size = 25\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.defaults.batch_size, 25);
        assert_eq!(config.defaults.max_combinations, 10_000);
        assert!(config.ledger.path.is_none());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[defaults\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::default();
        config.defaults.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_config_path_ends_with_app_dir() {
        let path = Config::config_path();
        assert!(path.ends_with("spinweave/config.toml"));
    }
}
