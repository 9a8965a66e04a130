//! Configuration validation.
//!
//! Validates configuration at startup so a bad value stops the process
//! before any event is handled.

use super::Config;
use crate::identity::UnsupportedStrategy;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.nick is required")]
    MissingBotNick,
    #[error("bot.nick is not a valid nickname: {0:?}")]
    InvalidBotNick(String),
    #[error("users.identify_by: {0}")]
    UnsupportedIdentifyBy(#[from] UnsupportedStrategy),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("limits.event_queue must be at least 1")]
    ZeroEventQueue,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let nick = &config.bot.nick;
    if nick.is_empty() {
        errors.push(ValidationError::MissingBotNick);
    } else if !is_valid_nick(nick) {
        errors.push(ValidationError::InvalidBotNick(nick.clone()));
    }

    if let Err(e) = config.users.strategy() {
        errors.push(e.into());
    }

    if let Some(ref db) = config.database {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if config.limits.event_queue == 0 {
        errors.push(ValidationError::ZeroEventQueue);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RFC 2812 nickname: a letter or special first, then letters, digits, specials or '-'.
fn is_valid_nick(nick: &str) -> bool {
    let is_special = |c: char| matches!(c, '[' | ']' | '\\' | '`' | '_' | '^' | '{' | '|' | '}');
    let mut chars = nick.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || is_special(first) => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || is_special(c) || c == '-')
}
