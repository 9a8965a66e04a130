//! Error types for roster event handling.
//!
//! Startup problems (configuration, database) have their own error types in
//! their modules and abort the process. The errors here are per-event: the
//! caller logs them and drops the offending event, and the roster stays
//! usable.

use thiserror::Error;

// ============================================================================
// Roster Errors (event application)
// ============================================================================

/// An event disagreed with what the roster already knows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// A member was asked to leave a channel it is not recorded in.
    #[error("{nick} is not tracked in {channel}")]
    ChannelNotTracked { nick: String, channel: String },
}

impl RosterError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ChannelNotTracked { .. } => "channel_not_tracked",
        }
    }
}

/// Result type for roster event handlers.
pub type RosterResult = Result<(), RosterError>;

/// The roster task is gone and can no longer take events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("roster task has stopped")]
pub struct RosterClosed;
