//! Application settings for qrscout.
//!
//! These settings control the station (where the local store lives, how
//! often the camera is polled, how unset values are encoded). The scouting
//! form itself is a separate JSON document; see [`crate::codec::document`].

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::codec::MissingValue;
use crate::error::{Error, Result};
use crate::scanner::DEFAULT_SCAN_DELAY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "qrscout";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "qrscout.db";

/// Application settings.
///
/// Settings are loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `QRSCOUT_`, nested keys joined by `__`)
/// 2. TOML config file at `~/.config/qrscout/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local store configuration.
    pub storage: StorageConfig,
    /// Leader scan configuration.
    pub scanner: ScannerConfig,
    /// Record encoding configuration.
    pub encoding: EncodingConfig,
}

/// Local store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/qrscout/qrscout.db`
    pub database_path: Option<PathBuf>,
}

/// Leader scan configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Minimum delay between scan attempts in milliseconds.
    pub scan_delay_ms: u64,
}

/// Record encoding configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// How unset values appear in the record.
    pub missing_value: MissingValue,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_delay_ms: u64::try_from(DEFAULT_SCAN_DELAY.as_millis()).unwrap_or(500),
        }
    }
}

impl Config {
    /// Load settings from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("QRSCOUT_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.scanner.scan_delay_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "scan_delay_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the scan delay as a Duration.
    #[must_use]
    pub fn scan_delay(&self) -> Duration {
        Duration::from_millis(self.scanner.scan_delay_ms)
    }
}
