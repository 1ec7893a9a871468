//! Configuration management for manifex

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ManifexError, Result};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Network settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output directory for generated files
    pub output_dir: Option<PathBuf>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    /// Automatically accept prompts
    pub auto_yes: bool,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Treat warnings as failures
    pub strict: bool,
    /// Check that referenced files exist on disk
    pub check_files: bool,
    /// Maximum directory depth when discovering manifests
    pub max_depth: usize,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// HTTP timeout in seconds
    pub timeout: u64,
    /// Package index JSON API base URL
    pub index_url: String,
    /// Never perform online lookups
    pub offline: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub color: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            jobs: None,
            auto_yes: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            check_files: true,
            max_depth: 8,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            index_url: "https://pypi.org/pypi".to_string(),
            offline: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            validation: ValidationConfig::default(),
            network: NetworkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Get the config file path
    ///
    /// `MANIFEX_CONFIG` overrides the default location; the global
    /// `--config` flag is exported into that variable at startup.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os("MANIFEX_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| ManifexError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("manifex").join("config.toml"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ManifexError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset() -> Result<()> {
        let config = Self::default();
        config.save()
    }

    /// Initialize configuration file
    pub fn init(force: bool) -> Result<()> {
        let path = Self::config_path()?;

        if path.exists() && !force {
            return Err(ManifexError::Config(
                "Configuration file already exists. Use --force to overwrite.".into(),
            ));
        }

        let config = Self::default();
        config.save()
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "general.output_dir" => self
                .general
                .output_dir
                .as_ref()
                .map(|p| p.display().to_string()),
            "general.jobs" => self.general.jobs.map(|j| j.to_string()),
            "general.auto_yes" => Some(self.general.auto_yes.to_string()),

            "validation.strict" => Some(self.validation.strict.to_string()),
            "validation.check_files" => Some(self.validation.check_files.to_string()),
            "validation.max_depth" => Some(self.validation.max_depth.to_string()),

            "network.timeout" => Some(self.network.timeout.to_string()),
            "network.index_url" => Some(self.network.index_url.clone()),
            "network.offline" => Some(self.network.offline.to_string()),

            "logging.level" => Some(self.logging.level.clone()),
            "logging.color" => Some(self.logging.color.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "general.output_dir" => {
                self.general.output_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "general.jobs" => {
                self.general.jobs = Some(
                    value
                        .parse()
                        .map_err(|_| ManifexError::Config("Invalid number for jobs".into()))?,
                );
            }
            "general.auto_yes" => {
                self.general.auto_yes = value
                    .parse()
                    .map_err(|_| ManifexError::Config("Invalid boolean for auto_yes".into()))?;
            }

            "validation.strict" => {
                self.validation.strict = value
                    .parse()
                    .map_err(|_| ManifexError::Config("Invalid boolean for strict".into()))?;
            }
            "validation.check_files" => {
                self.validation.check_files = value.parse().map_err(|_| {
                    ManifexError::Config("Invalid boolean for check_files".into())
                })?;
            }
            "validation.max_depth" => {
                self.validation.max_depth = value.parse().map_err(|_| {
                    ManifexError::Config("Invalid number for max_depth".into())
                })?;
            }

            "network.timeout" => {
                self.network.timeout = value
                    .parse()
                    .map_err(|_| ManifexError::Config("Invalid number for timeout".into()))?;
            }
            "network.index_url" => {
                self.network.index_url = value.to_string();
            }
            "network.offline" => {
                self.network.offline = value
                    .parse()
                    .map_err(|_| ManifexError::Config("Invalid boolean for offline".into()))?;
            }

            "logging.level" => {
                self.logging.level = value.to_string();
            }
            "logging.color" => {
                self.logging.color = value
                    .parse()
                    .map_err(|_| ManifexError::Config("Invalid boolean for color".into()))?;
            }

            _ => {
                return Err(ManifexError::Config(format!(
                    "Unknown configuration key: {}",
                    key
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.network.timeout, 30);
        assert_eq!(config.network.index_url, "https://pypi.org/pypi");
        assert!(!config.validation.strict);
        assert!(config.validation.check_files);
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        config.set("validation.strict", "true").unwrap();
        assert_eq!(config.get("validation.strict"), Some("true".to_string()));

        config.set("network.timeout", "60").unwrap();
        assert_eq!(config.get("network.timeout"), Some("60".to_string()));
    }

    #[test]
    fn test_unknown_key_is_error() {
        let mut config = Config::default();
        assert!(config.set("no.such.key", "1").is_err());
        assert_eq!(config.get("no.such.key"), None);
    }

    #[test]
    fn test_config_path_env_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let override_path = dir.path().join("custom.toml");

        std::env::set_var("MANIFEX_CONFIG", &override_path);
        let path = Config::config_path().unwrap();
        std::env::remove_var("MANIFEX_CONFIG");

        assert_eq!(path, override_path);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let mut config = Config::default();
        config.set("general.jobs", "4").unwrap();
        config.set("network.offline", "true").unwrap();

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.general.jobs, Some(4));
        assert!(parsed.network.offline);
    }
}
