//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, BotConfig, UsersConfig)
//! - [`limits`]: Queue sizing (LimitsConfig)
//! - [`validation`]: Startup checks that abort on bad values

mod limits;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use types::{
    BotConfig, Config, ConfigError, DatabaseConfig, LogConfig, LogFormat, UsersConfig,
};
pub use validation::{ValidationError, validate};
