//! Channel membership state machine.
//!
//! The `Roster` owns every [`MemberRecord`] and the set of channels the bot
//! occupies. Records live in a map keyed by [`MemberId`]; the nick map is
//! only an index onto those ids, so a rename re-points one index entry and
//! never moves the record itself.
//!
//! Membership is pieced together from several partial sources:
//! - JOIN, the only event that adds a channel to the tracked set
//! - PRIVMSG to a tracked channel, which proves the sender is in it
//! - WHO replies for a tracked channel
//!
//! Every path ends in the same invariant: a nick resolves to a record iff
//! that user is known to share at least one tracked channel with the bot.

use crate::casemap::Casemapping;
use crate::error::RosterResult;
use crate::event::RosterEvent;
use crate::identity::IdentifyBy;
use crate::mask::SenderInfo;
use crate::settings::SettingsStore;
use crate::state::MemberRecord;
use crate::telemetry::spans;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Handle to a record owned by a [`Roster`]. Never reused within one roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(u64);

/// Who is in which channel, as far as the bot can tell.
pub struct Roster {
    own_nick: String,
    identify_by: IdentifyBy,
    casemapping: Casemapping,
    settings: Arc<dyn SettingsStore>,
    /// Folded names of channels the bot is in.
    channels: HashSet<String>,
    members: HashMap<MemberId, MemberRecord>,
    /// Folded nick to record.
    nicks: HashMap<String, MemberId>,
    next_id: u64,
}

impl Roster {
    pub fn new(
        own_nick: impl Into<String>,
        identify_by: IdentifyBy,
        casemapping: Casemapping,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            own_nick: own_nick.into(),
            identify_by,
            casemapping,
            settings,
            channels: HashSet::new(),
            members: HashMap::new(),
            nicks: HashMap::new(),
            next_id: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// The record currently registered under `nick`.
    pub fn get_user(&self, nick: &str) -> Option<&MemberRecord> {
        self.nicks
            .get(&self.casemapping.fold(nick))
            .and_then(|id| self.members.get(id))
    }

    pub fn own_nick(&self) -> &str {
        &self.own_nick
    }

    /// Update the bot's nick, e.g. after the server assigned a different one at registration.
    pub fn set_own_nick(&mut self, nick: impl Into<String>) {
        let nick = nick.into();
        if nick != self.own_nick {
            info!(old = %self.own_nick, new = %nick, "own nick changed");
        }
        self.own_nick = nick;
    }

    pub fn is_own_nick(&self, nick: &str) -> bool {
        self.casemapping.equals(nick, &self.own_nick)
    }

    pub fn is_tracked_channel(&self, channel: &str) -> bool {
        self.channels.contains(&self.casemapping.fold(channel))
    }

    /// Folded names of every tracked channel.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }

    /// Records known to be in `channel`.
    pub fn users_in(&self, channel: &str) -> impl Iterator<Item = &MemberRecord> {
        let key = self.casemapping.fold(channel);
        self.members
            .values()
            .filter(move |record| record.in_channel(&key))
    }

    pub fn user_count(&self) -> usize {
        self.members.len()
    }

    // ------------------------------------------------------------------------
    // Event handlers
    // ------------------------------------------------------------------------

    /// Apply one event.
    pub fn apply(&mut self, event: RosterEvent) -> RosterResult {
        let _span = spans::event(event.kind()).entered();

        match event {
            RosterEvent::Join { sender, channel } => self.join(&sender, &channel),
            RosterEvent::Part { nick, channel } => return self.part(&nick, &channel),
            RosterEvent::Quit { nick } => self.quit(&nick),
            RosterEvent::Kick {
                kicker,
                target,
                channel,
            } => return self.kick(&kicker, &target, &channel),
            RosterEvent::Renamed { old_nick, new_nick } => self.renamed(&old_nick, &new_nick),
            RosterEvent::PrivateMessage { sender, target } => {
                self.private_message(&sender, &target)
            }
            RosterEvent::WhoReply {
                channel,
                nick,
                user,
                host,
            } => self.who_reply(&channel, &nick, &user, &host),
            RosterEvent::Registered { nick } => self.set_own_nick(nick),
            RosterEvent::ConnectionLost => self.connection_lost(),
        }
        Ok(())
    }

    /// `sender` joined `channel`. Seeing a JOIN means the bot is in that channel too.
    pub fn join(&mut self, sender: &SenderInfo, channel: &str) {
        debug!(nick = %sender.nick, channel = %channel, "joined");
        let key = self.casemapping.fold(channel);
        self.channels.insert(key.clone());
        self.discover(sender, key, "JOIN");
    }

    /// `nick` left `channel`.
    ///
    /// When the bot itself leaves, every record loses the channel and the
    /// channel stops being tracked.
    pub fn part(&mut self, nick: &str, channel: &str) -> RosterResult {
        debug!(nick = %nick, channel = %channel, "parted");
        let key = self.casemapping.fold(channel);

        if self.is_own_nick(nick) {
            self.leave_channel(&key);
            return Ok(());
        }

        let Some(&id) = self.nicks.get(&self.casemapping.fold(nick)) else {
            return Ok(());
        };
        let Some(record) = self.members.get_mut(&id) else {
            return Ok(());
        };

        record.part(&key)?;
        if !record.still_present() {
            debug!(nick = %nick, "lost out of sight");
            self.remove_member(id);
        }
        Ok(())
    }

    /// `nick` disconnected. The bot's own quit resets everything.
    pub fn quit(&mut self, nick: &str) {
        debug!(nick = %nick, "quit");
        if self.is_own_nick(nick) {
            self.connection_lost();
            return;
        }

        if let Some(id) = self.nicks.get(&self.casemapping.fold(nick)).copied() {
            self.remove_member(id);
        }
    }

    /// `kicker` removed `target` from `channel`; handled exactly like a part by `target`.
    pub fn kick(&mut self, kicker: &str, target: &str, channel: &str) -> RosterResult {
        debug!(kicker = %kicker, target = %target, channel = %channel, "kicked");
        self.part(target, channel)
    }

    /// `old_nick` is now `new_nick`. The record and its identity are kept.
    pub fn renamed(&mut self, old_nick: &str, new_nick: &str) {
        debug!(old = %old_nick, new = %new_nick, "renamed");
        if self.is_own_nick(old_nick) {
            self.own_nick = new_nick.to_owned();
        }

        let Some(id) = self.nicks.remove(&self.casemapping.fold(old_nick)) else {
            return;
        };

        let new_key = self.casemapping.fold(new_nick);
        if let Some(stale) = self.nicks.insert(new_key, id)
            && stale != id
        {
            // The server only hands out free nicks, so the old holder left unseen.
            debug!(nick = %new_nick, "dropping stale record");
            self.members.remove(&stale);
        }

        if let Some(record) = self.members.get_mut(&id) {
            record.set_nick(new_nick);
        }
    }

    /// A PRIVMSG from `sender` to `target`. Only messages to tracked channels are used.
    pub fn private_message(&mut self, sender: &SenderInfo, target: &str) {
        let key = self.casemapping.fold(target);
        if !self.channels.contains(&key) {
            return;
        }
        self.discover(sender, key, "PRIVMSG");
    }

    /// One WHO entry. Entries for channels the bot is not in are ignored.
    pub fn who_reply(&mut self, channel: &str, nick: &str, user: &str, host: &str) {
        let key = self.casemapping.fold(channel);
        if !self.channels.contains(&key) {
            debug!(channel = %channel, "got WHO for a channel I'm not in");
            return;
        }
        self.discover(&SenderInfo::new(nick, user, host), key, "WHO");
    }

    /// Forget everything.
    pub fn connection_lost(&mut self) {
        info!(
            channels = self.channels.len(),
            users = self.members.len(),
            "resetting roster"
        );
        self.channels.clear();
        self.members.clear();
        self.nicks.clear();
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Add `channel_key` to the record for `sender`, creating it if needed.
    fn discover(&mut self, sender: &SenderInfo, channel_key: String, via: &'static str) {
        let nick_key = self.casemapping.fold(&sender.nick);

        if let Some(id) = self.nicks.get(&nick_key).copied()
            && let Some(record) = self.members.get_mut(&id)
        {
            record.join(channel_key);
            return;
        }

        let id = MemberId(self.next_id);
        self.next_id += 1;

        let identity = self.identify_by.resolve(sender);
        let record = MemberRecord::new(sender, identity, channel_key, Arc::clone(&self.settings));
        debug!(
            nick = %record.nick(),
            user = %record.user(),
            identity = %record.identity(),
            via,
            "found user"
        );

        self.members.insert(id, record);
        self.nicks.insert(nick_key, id);
    }

    /// Drop `channel_key` from every record, pruning the ones left empty, then stop tracking it.
    fn leave_channel(&mut self, channel_key: &str) {
        let mut emptied = Vec::new();
        for (id, record) in &mut self.members {
            if record.in_channel(channel_key)
                && record.part(channel_key).is_ok()
                && !record.still_present()
            {
                emptied.push(*id);
            }
        }

        let pruned = emptied.len();
        for id in emptied {
            self.remove_member(id);
        }
        self.channels.remove(channel_key);
        info!(channel = %channel_key, pruned, "left channel");
    }

    fn remove_member(&mut self, id: MemberId) {
        if let Some(record) = self.members.remove(&id) {
            let key = self.casemapping.fold(record.nick());
            if self.nicks.get(&key) == Some(&id) {
                self.nicks.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn roster(casemapping: Casemapping) -> Roster {
        Roster::new(
            "onebot",
            IdentifyBy::ByHost,
            casemapping,
            Arc::new(MemorySettings::new()),
        )
    }

    fn sender(nick: &str) -> SenderInfo {
        SenderInfo::new(nick, "u", format!("{nick}.example"))
    }

    /// Every index entry points at a live record filed under its current nick.
    fn assert_consistent(r: &Roster) {
        assert_eq!(r.nicks.len(), r.members.len());
        for (key, id) in &r.nicks {
            let record = r.members.get(id).expect("dangling nick index");
            assert_eq!(&r.casemapping.fold(record.nick()), key);
            assert!(record.still_present());
            for chan in record.channels() {
                assert!(r.channels.contains(chan), "{chan} not tracked");
            }
        }
    }

    #[test]
    fn lookups_fold_case() {
        let mut r = roster(Casemapping::Rfc1459);
        r.join(&sender("Nick[a]"), "#Rust");
        let record = r.get_user("nick{A}").unwrap();
        assert_eq!(record.nick(), "Nick[a]");
        assert!(r.is_tracked_channel("#rust"));
        assert_eq!(r.users_in("#RUST").count(), 1);
        assert_consistent(&r);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut r = roster(Casemapping::Ascii);
        r.join(&sender("a"), "#c");
        r.quit("a");
        r.join(&sender("a"), "#c");
        assert_eq!(r.next_id, 2);
        assert_consistent(&r);
    }

    #[test]
    fn case_only_rename_keeps_record() {
        let mut r = roster(Casemapping::Ascii);
        r.join(&sender("alice"), "#c");
        r.renamed("alice", "Alice");
        assert_eq!(r.get_user("alice").unwrap().nick(), "Alice");
        assert_eq!(r.user_count(), 1);
        assert_consistent(&r);
    }

    #[test]
    fn rename_over_stale_nick_drops_stale_record() {
        let mut r = roster(Casemapping::Ascii);
        r.join(&sender("alice"), "#c");
        r.join(&sender("bob"), "#c");
        r.renamed("alice", "bob");
        assert_eq!(r.user_count(), 1);
        assert_eq!(r.get_user("bob").unwrap().host(), "alice.example");
        assert_consistent(&r);
    }

    #[test]
    fn own_rename_moves_self_detection() {
        let mut r = roster(Casemapping::Ascii);
        r.join(&sender("onebot"), "#c");
        r.join(&sender("alice"), "#c");
        r.renamed("onebot", "twobot");
        assert_eq!(r.own_nick(), "twobot");

        r.part("twobot", "#c").unwrap();
        assert!(!r.is_tracked_channel("#c"));
        assert_eq!(r.user_count(), 0);
        assert_consistent(&r);
    }

    #[test]
    fn registered_nick_drives_self_detection() {
        let mut r = roster(Casemapping::Ascii);
        r.apply(RosterEvent::Registered {
            nick: "OneBot_".into(),
        })
        .unwrap();
        assert_eq!(r.own_nick(), "OneBot_");
        assert!(r.is_own_nick("onebot_"));
        assert!(!r.is_own_nick("onebot"));
    }

    #[test]
    fn apply_routes_events() {
        let mut r = roster(Casemapping::Ascii);
        r.apply(RosterEvent::Join {
            sender: sender("alice"),
            channel: "#c".into(),
        })
        .unwrap();
        r.apply(RosterEvent::WhoReply {
            channel: "#c".into(),
            nick: "carol".into(),
            user: "u".into(),
            host: "carol.example".into(),
        })
        .unwrap();
        assert_eq!(r.user_count(), 2);

        let err = r
            .apply(RosterEvent::Kick {
                kicker: "alice".into(),
                target: "carol".into(),
                channel: "#elsewhere".into(),
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "channel_not_tracked");
        assert!(r.get_user("carol").is_some());

        r.apply(RosterEvent::ConnectionLost).unwrap();
        assert_eq!(r.user_count(), 0);
        assert_consistent(&r);
    }
}
