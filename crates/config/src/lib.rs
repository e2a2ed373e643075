#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for satdl
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/satdl/config.toml)
//! - Environment variables (`SATDL_*`)
//! - CLI flags (applied by the CLI itself)

pub mod constants;

use serde::{Deserialize, Serialize};
use satdl_errors::{ConfigError, Error};
use satdl_types::{ColorChoice, OutputFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Start the automatic sweep when `satdl watch` runs without flags
    #[serde(default)]
    pub auto_verify: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_spacing_ms")]
    pub spacing_ms: u64,
    #[serde(default = "default_status_timeout_secs")]
    pub status_timeout_secs: u64,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub credentials_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub downloads_dir: Option<PathBuf>,
    /// Directory the bundled package transfer reads `<package>.zip` from
    pub packages_dir: Option<PathBuf>,
    /// TOML file with scripted authority responses
    pub fixture_path: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            auto_verify: false,
            interval_secs: constants::DEFAULT_SWEEP_INTERVAL_SECS,
            spacing_ms: constants::DEFAULT_CHECK_SPACING_MS,
            status_timeout_secs: constants::DEFAULT_STATUS_TIMEOUT_SECS,
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.spacing_ms)
    }

    #[must_use]
    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }

    /// Reject values the sweep cannot run with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero interval or timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.status_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.status_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_interval_secs() -> u64 {
    constants::DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_spacing_ms() -> u64 {
    constants::DEFAULT_CHECK_SPACING_MS
}

fn default_status_timeout_secs() -> u64 {
    constants::DEFAULT_STATUS_TIMEOUT_SECS
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.polling.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Save configuration to a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized
    /// or if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError {
                    path: parent.display().to_string(),
                    error: e.to_string(),
                })?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })?;

        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, contents)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: tmp.display().to_string(),
                error: e.to_string(),
            })?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // SATDL_OUTPUT
        if let Ok(output) = std::env::var("SATDL_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SATDL_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // SATDL_COLOR
        if let Ok(color) = std::env::var("SATDL_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SATDL_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // SATDL_AUTO_VERIFY
        if let Ok(auto) = std::env::var("SATDL_AUTO_VERIFY") {
            self.polling.auto_verify = match auto.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SATDL_AUTO_VERIFY".to_string(),
                        value: auto,
                    }
                    .into())
                }
            };
        }

        // SATDL_INTERVAL_SECS
        if let Ok(interval) = std::env::var("SATDL_INTERVAL_SECS") {
            self.polling.interval_secs =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "SATDL_INTERVAL_SECS".to_string(),
                    value: interval,
                })?;
        }

        // SATDL_SPACING_MS
        if let Ok(spacing) = std::env::var("SATDL_SPACING_MS") {
            self.polling.spacing_ms = spacing.parse().map_err(|_| ConfigError::InvalidValue {
                field: "SATDL_SPACING_MS".to_string(),
                value: spacing,
            })?;
        }

        // SATDL_STATE_PATH
        if let Ok(path) = std::env::var("SATDL_STATE_PATH") {
            self.paths.state_path = Some(PathBuf::from(path));
        }

        self.polling.validate()?;
        Ok(())
    }

    /// Per-user data directory all default paths live under
    #[must_use]
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(constants::APP_DIR)
    }

    /// Get the credential store path (with default)
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.paths
            .credentials_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(constants::CREDENTIALS_FILE))
    }

    /// Get the request ledger path (with default)
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.paths
            .state_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(constants::LEDGER_FILE))
    }

    /// Get the downloads directory (with default)
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.paths
            .downloads_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(constants::DOWNLOADS_DIR))
    }

    /// Get the package source directory (with default)
    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.paths
            .packages_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(constants::PACKAGES_DIR))
    }

    /// Get the authority fixture path (with default)
    #[must_use]
    pub fn fixture_path(&self) -> PathBuf {
        self.paths
            .fixture_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(constants::FIXTURE_FILE))
    }

    /// Get the debug log directory (with default)
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.paths
            .logs_dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join(constants::LOGS_DIR))
    }
}
