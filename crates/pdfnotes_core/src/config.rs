//! Client configuration.
//!
//! # Responsibility
//! - Provide defaults for backend location, timeouts and download target.
//! - Apply `PDFNOTES_*` environment overrides and optional TOML files.
//!
//! # Invariants
//! - `api_base_url` is an absolute http(s) URL without a trailing slash.
//! - `request_timeout` is never zero.
//! - `log_level` is one of `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use reqwest::Url;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CLEANUP_DELAY_MS: u64 = 100;

pub const ENV_API_URL: &str = "PDFNOTES_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "PDFNOTES_TIMEOUT_SECS";
pub const ENV_DOWNLOAD_DIR: &str = "PDFNOTES_DOWNLOAD_DIR";
pub const ENV_LOG_LEVEL: &str = "PDFNOTES_LOG_LEVEL";

/// Effective client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://localhost:8000`.
    pub api_base_url: String,
    /// Upper bound for one extraction/export round-trip.
    pub request_timeout: Duration,
    /// Delay between download hand-off and transient blob release.
    pub cleanup_delay: Duration,
    /// Directory receiving exported files.
    pub download_dir: PathBuf,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cleanup_delay: Duration::from_millis(DEFAULT_CLEANUP_DELAY_MS),
            download_dir: PathBuf::from("."),
            log_level: default_log_level().to_string(),
        }
    }
}

/// On-disk TOML shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    cleanup_delay_ms: Option<u64>,
    download_dir: Option<PathBuf>,
    log_level: Option<String>,
}

/// Configuration loading/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
    Parse(toml::de::Error),
    Io(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid `{key}`: {message}"),
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Io(err) => write!(f, "failed to read config file: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidValue { .. } => None,
            Self::Parse(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl ClientConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parses a TOML document on top of defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(source)?;
        let mut config = Self::default();
        if let Some(value) = file.api_base_url {
            config.api_base_url = value;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.cleanup_delay_ms {
            config.cleanup_delay = Duration::from_millis(ms);
        }
        if let Some(dir) = file.download_dir {
            config.download_dir = dir;
        }
        if let Some(level) = file.log_level {
            config.log_level = level;
        }
        config.validate()
    }

    /// Reads and parses a TOML config file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Applies `PDFNOTES_*` overrides using the given variable lookup.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_API_URL) {
            self.api_base_url = value;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    message: format!("`{value}` is not a number of seconds: {err}"),
                })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup(ENV_DOWNLOAD_DIR) {
            self.download_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        self.validate()
    }

    /// Normalizes fields and rejects unusable values.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/').to_string();
        let url = Url::parse(&trimmed).map_err(|err| ConfigError::InvalidValue {
            key: "api_base_url",
            message: format!("`{trimmed}` is not a URL: {err}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "api_base_url",
                message: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        self.api_base_url = trimmed;

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout",
                message: "must be greater than zero".to_string(),
            });
        }

        self.log_level = normalize_level(&self.log_level)
            .map_err(|message| ConfigError::InvalidValue {
                key: "log_level",
                message,
            })?
            .to_string();
        Ok(self)
    }
}
