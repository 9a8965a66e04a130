//! Sender masks.
//!
//! Every event that names a user carries the `nick!user@host` mask of the
//! connection it came from. The transport hands the roster a validated
//! [`SenderInfo`] so nothing past this point has to re-check the shape.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a mask string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    #[error("empty mask")]
    Empty,
    #[error("mask {0:?} has no '!' separator")]
    MissingUser(String),
    #[error("mask {0:?} has no '@' separator")]
    MissingHost(String),
    #[error("mask {0:?} has an empty {1}")]
    EmptyPart(String, &'static str),
    #[error("mask {0:?} contains whitespace or control characters")]
    InvalidChar(String),
}

/// The nick, username and host of a connection at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SenderInfo {
    pub nick: String,
    pub user: String,
    pub host: String,
}

impl SenderInfo {
    /// Build a sender from already-split components.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// Parse a `nick!user@host` mask, rejecting anything incomplete.
    pub fn parse(s: &str) -> Result<Self, MaskError> {
        if s.is_empty() {
            return Err(MaskError::Empty);
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MaskError::InvalidChar(s.to_owned()));
        }

        let (nick, rest) = s
            .split_once('!')
            .ok_or_else(|| MaskError::MissingUser(s.to_owned()))?;
        let (user, host) = rest
            .split_once('@')
            .ok_or_else(|| MaskError::MissingHost(s.to_owned()))?;

        for (part, label) in [(nick, "nick"), (user, "user"), (host, "host")] {
            if part.is_empty() {
                return Err(MaskError::EmptyPart(s.to_owned(), label));
            }
        }
        // nick@host!x: the '!' sits inside the host, so the user part is missing.
        if nick.contains('@') {
            return Err(MaskError::MissingUser(s.to_owned()));
        }

        Ok(Self::new(nick, user, host))
    }

    /// Render as `nick!user@host`.
    pub fn mask(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SenderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

impl FromStr for SenderInfo {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_mask() {
        let sender = SenderInfo::parse("alice!ali@host.example.com").unwrap();
        assert_eq!(sender.nick, "alice");
        assert_eq!(sender.user, "ali");
        assert_eq!(sender.host, "host.example.com");
        assert_eq!(sender.mask(), "alice!ali@host.example.com");
    }

    #[test]
    fn user_may_carry_tilde() {
        let sender: SenderInfo = "bob!~bob@10.0.0.1".parse().unwrap();
        assert_eq!(sender.user, "~bob");
    }

    #[test]
    fn host_may_contain_at() {
        // Some cloaks put '@' in the host; split on the first one.
        let sender = SenderInfo::parse("n!u@a@b").unwrap();
        assert_eq!(sender.host, "a@b");
    }

    #[test]
    fn rejects_server_name() {
        assert_eq!(
            SenderInfo::parse("irc.example.com"),
            Err(MaskError::MissingUser("irc.example.com".into()))
        );
    }

    #[test]
    fn rejects_missing_host() {
        assert!(matches!(
            SenderInfo::parse("nick!user"),
            Err(MaskError::MissingHost(_))
        ));
    }

    #[test]
    fn rejects_empty_components() {
        assert!(matches!(
            SenderInfo::parse("!user@host"),
            Err(MaskError::EmptyPart(_, "nick"))
        ));
        assert!(matches!(
            SenderInfo::parse("nick!@host"),
            Err(MaskError::EmptyPart(_, "user"))
        ));
        assert!(matches!(
            SenderInfo::parse("nick!user@"),
            Err(MaskError::EmptyPart(_, "host"))
        ));
        assert_eq!(SenderInfo::parse(""), Err(MaskError::Empty));
    }

    #[test]
    fn rejects_whitespace() {
        assert!(matches!(
            SenderInfo::parse("ni ck!user@host"),
            Err(MaskError::InvalidChar(_))
        ));
    }
}
