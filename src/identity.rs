//! Stable identity keys for tracked users.
//!
//! A nick is a display name that can change at any moment; settings have to
//! follow the connection instead. The configured [`IdentifyBy`] strategy
//! derives an [`IdentityKey`] once, when a record is created, and the key
//! is never recomputed afterwards.

use crate::mask::SenderInfo;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An `identify_by` value that names no known strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported identify_by strategy: {0:?} (expected \"by-host\")")]
pub struct UnsupportedStrategy(pub String);

/// How identity keys are derived from sender information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentifyBy {
    /// The sender's host, verbatim.
    #[default]
    ByHost,
}

impl IdentifyBy {
    /// Configuration spelling of this strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByHost => "by-host",
        }
    }

    /// Derive the identity key for `sender`.
    pub fn resolve(self, sender: &SenderInfo) -> IdentityKey {
        match self {
            Self::ByHost => IdentityKey(sender.host.clone()),
        }
    }
}

impl FromStr for IdentifyBy {
    type Err = UnsupportedStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by-host" => Ok(Self::ByHost),
            other => Err(UnsupportedStrategy(other.to_owned())),
        }
    }
}

impl fmt::Display for IdentifyBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key under which a user's persisted settings are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
