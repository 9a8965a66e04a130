//! Integration test common infrastructure.
//!
//! Builds rosters with the bot nick `onebot` and in-memory settings, plus
//! helpers for senders and channel sets.

use chanroster::{Casemapping, IdentifyBy, MemorySettings, Roster, SenderInfo, SettingsStore};
use std::sync::Arc;

#[allow(dead_code)]
pub const BOT: &str = "onebot";

#[allow(dead_code)]
pub fn roster() -> Roster {
    roster_with(Arc::new(MemorySettings::new()))
}

pub fn roster_with(settings: Arc<dyn SettingsStore>) -> Roster {
    Roster::new(BOT, IdentifyBy::ByHost, Casemapping::Ascii, settings)
}

/// A sender whose host is derived from the nick, so identities differ per user.
pub fn sender(nick: &str) -> SenderInfo {
    SenderInfo::new(nick, format!("~{nick}"), format!("{nick}.users.example"))
}

/// Sorted channel set of `nick`, or `None` if untracked.
#[allow(dead_code)]
pub fn channels_of(roster: &Roster, nick: &str) -> Option<Vec<String>> {
    roster.get_user(nick).map(|record| {
        let mut chans: Vec<String> = record.channels().map(String::from).collect();
        chans.sort();
        chans
    })
}
