//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::limits::LimitsConfig;
use super::validation::{self, ValidationError};
use crate::casemap::Casemapping;
use crate::identity::{IdentifyBy, UnsupportedStrategy};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The bot's own connection.
    pub bot: BotConfig,
    /// User tracking behaviour.
    #[serde(default)]
    pub users: UsersConfig,
    /// Settings database. In-memory settings are used when absent.
    pub database: Option<DatabaseConfig>,
    /// Log output.
    #[serde(default)]
    pub log: LogConfig,
    /// Queue sizing.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        validation::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// The bot's own connection.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Nickname the bot registers with. Its own PART and QUIT are recognised by it.
    pub nick: String,
}

/// User tracking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// How identity keys are derived (default: "by-host", the only supported value).
    #[serde(default = "default_identify_by")]
    pub identify_by: String,
    /// Nick and channel comparison (default: "ascii").
    #[serde(default)]
    pub casemapping: Casemapping,
}

impl UsersConfig {
    /// The configured identification strategy.
    pub fn strategy(&self) -> Result<IdentifyBy, UnsupportedStrategy> {
        self.identify_by.parse()
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            identify_by: default_identify_by(),
            casemapping: Casemapping::default(),
        }
    }
}

fn default_identify_by() -> String {
    IdentifyBy::ByHost.as_str().to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or ":memory:".
    pub path: String,
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
