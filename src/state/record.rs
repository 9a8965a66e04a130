//! A single tracked user.

use crate::error::{RosterError, RosterResult};
use crate::identity::IdentityKey;
use crate::mask::SenderInfo;
use crate::settings::{SettingsDocument, SettingsError, SettingsStore};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// A user the bot currently shares at least one channel with.
///
/// Channel names are stored as the roster's folded lookup keys. The identity
/// is fixed at creation; a nick change only touches `nick`.
#[derive(Clone)]
pub struct MemberRecord {
    nick: String,
    user: String,
    host: String,
    identity: IdentityKey,
    channels: HashSet<String>,
    settings: Arc<dyn SettingsStore>,
}

impl MemberRecord {
    pub fn new(
        sender: &SenderInfo,
        identity: IdentityKey,
        channel: impl Into<String>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let mut channels = HashSet::new();
        channels.insert(channel.into());
        Self {
            nick: sender.nick.clone(),
            user: sender.user.clone(),
            host: sender.host.clone(),
            identity,
            channels,
            settings,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    /// Current `nick!user@host`.
    pub fn mask(&self) -> String {
        format!("{}!{}@{}", self.nick, self.user, self.host)
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }

    pub fn in_channel(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Record that the user is in `channel`. Idempotent.
    pub fn join(&mut self, channel: impl Into<String>) {
        self.channels.insert(channel.into());
    }

    /// Record that the user left `channel`.
    ///
    /// Leaving a channel the user was never seen in means the event stream
    /// and this record disagree; that is reported rather than ignored.
    pub fn part(&mut self, channel: &str) -> RosterResult {
        if self.channels.remove(channel) {
            Ok(())
        } else {
            Err(RosterError::ChannelNotTracked {
                nick: self.nick.clone(),
                channel: channel.to_owned(),
            })
        }
    }

    /// Whether the user is still known to be in any channel.
    pub fn still_present(&self) -> bool {
        !self.channels.is_empty()
    }

    pub(crate) fn set_nick(&mut self, nick: impl Into<String>) {
        self.nick = nick.into();
    }

    /// Look up one setting, falling back to `default` when either the
    /// document or the field is missing.
    pub async fn get_setting(&self, name: &str, default: Value) -> Result<Value, SettingsError> {
        Ok(self
            .get_all_settings()
            .await?
            .and_then(|mut document| document.remove(name))
            .unwrap_or(default))
    }

    /// The full settings document for this user's identity, if any.
    pub async fn get_all_settings(&self) -> Result<Option<SettingsDocument>, SettingsError> {
        self.settings.find_settings(&self.identity).await
    }

    /// Persist one setting under this user's identity.
    pub async fn set_setting(&self, name: &str, value: Value) -> Result<(), SettingsError> {
        self.settings
            .store_setting(&self.identity, name, value)
            .await
    }
}

/// Records compare by nick alone; use [`MemberRecord::identity`] to ask
/// whether two records belong to the same connection.
impl PartialEq for MemberRecord {
    fn eq(&self, other: &Self) -> bool {
        self.nick == other.nick
    }
}

impl fmt::Debug for MemberRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberRecord")
            .field("nick", &self.nick)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("identity", &self.identity)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}
