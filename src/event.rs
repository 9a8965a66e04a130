//! Roster events and the line decoder that produces them.
//!
//! The roster only consumes a handful of commands. [`decode_line`] turns a
//! raw protocol line into a [`RosterEvent`], or `None` for anything the
//! roster does not care about, validating sender masks on the way in.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format
//! - RFC 2812 Section 5.1: RPL_WHOREPLY (352)

use crate::mask::{MaskError, SenderInfo};
use thiserror::Error;

/// First numeric after registration; its target is the nick the server gave us.
const RPL_WELCOME: &str = "001";
/// Numeric reply carrying one WHO entry.
const RPL_WHOREPLY: &str = "352";

/// A membership-relevant protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    Join {
        sender: SenderInfo,
        channel: String,
    },
    Part {
        nick: String,
        channel: String,
    },
    Quit {
        nick: String,
    },
    /// `kicker` removed `target` from `channel`.
    Kick {
        kicker: String,
        target: String,
        channel: String,
    },
    Renamed {
        old_nick: String,
        new_nick: String,
    },
    /// A PRIVMSG; `target` is a channel or the bot's own nick.
    PrivateMessage {
        sender: SenderInfo,
        target: String,
    },
    /// One entry of a WHO response.
    WhoReply {
        channel: String,
        nick: String,
        user: String,
        host: String,
    },
    /// Registration finished and the server calls the bot `nick`.
    Registered {
        nick: String,
    },
    /// The bot's own connection went away.
    ConnectionLost,
}

impl RosterEvent {
    /// Static event name for spans and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Part { .. } => "part",
            Self::Quit { .. } => "quit",
            Self::Kick { .. } => "kick",
            Self::Renamed { .. } => "renamed",
            Self::PrivateMessage { .. } => "privmsg",
            Self::WhoReply { .. } => "who_reply",
            Self::Registered { .. } => "registered",
            Self::ConnectionLost => "connection_lost",
        }
    }
}

/// Reasons a line could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("line has no command")]
    MissingCommand,
    #[error("{0} without a source prefix")]
    MissingPrefix(String),
    #[error("{command} needs at least {expected} parameters")]
    MissingParams {
        command: String,
        expected: usize,
    },
    #[error("invalid sender: {0}")]
    Mask(#[from] MaskError),
}

impl DecodeError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCommand => "missing_command",
            Self::MissingPrefix(_) => "missing_prefix",
            Self::MissingParams { .. } => "missing_params",
            Self::Mask(_) => "invalid_mask",
        }
    }
}

/// Decode one raw protocol line.
///
/// Returns `Ok(None)` for well-formed lines the roster has no use for.
pub fn decode_line(line: &str) -> Result<Option<RosterEvent>, DecodeError> {
    let mut rest = line.trim_end_matches(['\r', '\n']);

    // IRCv3 message tags carry nothing the roster needs.
    if rest.starts_with('@') {
        rest = rest.split_once(' ').map_or("", |(_, r)| r);
    }
    rest = rest.trim_start();

    let prefix = match rest.strip_prefix(':') {
        Some(tail) => {
            let (prefix, tail) = tail.split_once(' ').ok_or(DecodeError::MissingCommand)?;
            rest = tail;
            Some(prefix)
        }
        None => None,
    };

    let (command, params) = split_params(rest);
    let command = command.ok_or(DecodeError::MissingCommand)?;

    let event = match command.to_ascii_uppercase().as_str() {
        "JOIN" => {
            let [channel] = take::<1>(command, &params)?;
            RosterEvent::Join {
                sender: sender(command, prefix)?,
                channel: channel.to_owned(),
            }
        }
        "PART" => {
            let [channel] = take::<1>(command, &params)?;
            RosterEvent::Part {
                nick: source_nick(command, prefix)?,
                channel: channel.to_owned(),
            }
        }
        "QUIT" => RosterEvent::Quit {
            nick: source_nick(command, prefix)?,
        },
        "KICK" => {
            let [channel, target] = take::<2>(command, &params)?;
            RosterEvent::Kick {
                kicker: source_nick(command, prefix)?,
                target: target.to_owned(),
                channel: channel.to_owned(),
            }
        }
        "NICK" => {
            let [new_nick] = take::<1>(command, &params)?;
            RosterEvent::Renamed {
                old_nick: source_nick(command, prefix)?,
                new_nick: new_nick.to_owned(),
            }
        }
        "PRIVMSG" => {
            let [target] = take::<1>(command, &params)?;
            RosterEvent::PrivateMessage {
                sender: sender(command, prefix)?,
                target: target.to_owned(),
            }
        }
        RPL_WELCOME => {
            let [nick] = take::<1>(command, &params)?;
            RosterEvent::Registered {
                nick: nick.to_owned(),
            }
        }
        RPL_WHOREPLY => {
            // <me> <channel> <user> <host> <server> <nick> <flags> :<hops> <realname>
            let [_me, channel, user, host, _server, nick] = take::<6>(command, &params)?;
            RosterEvent::WhoReply {
                channel: channel.to_owned(),
                nick: nick.to_owned(),
                user: user.to_owned(),
                host: host.to_owned(),
            }
        }
        "ERROR" => RosterEvent::ConnectionLost,
        _ => return Ok(None),
    };

    Ok(Some(event))
}

/// Split `COMMAND p1 p2 :trailing` into the command and its parameters.
fn split_params(s: &str) -> (Option<&str>, Vec<&str>) {
    let mut params = Vec::new();
    let mut rest = s.trim_start_matches(' ');
    let mut command = None;

    while !rest.is_empty() {
        if command.is_some()
            && let Some(trailing) = rest.strip_prefix(':')
        {
            params.push(trailing);
            break;
        }
        let (word, tail) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_none() {
            command = Some(word);
        } else {
            params.push(word);
        }
        rest = tail.trim_start_matches(' ');
    }

    (command, params)
}

fn take<'a, const N: usize>(
    command: &str,
    params: &[&'a str],
) -> Result<[&'a str; N], DecodeError> {
    params
        .get(..N)
        .and_then(|head| <[&str; N]>::try_from(head).ok())
        .ok_or_else(|| DecodeError::MissingParams {
            command: command.to_owned(),
            expected: N,
        })
}

fn sender(command: &str, prefix: Option<&str>) -> Result<SenderInfo, DecodeError> {
    let prefix = prefix.ok_or_else(|| DecodeError::MissingPrefix(command.to_owned()))?;
    Ok(SenderInfo::parse(prefix)?)
}

fn source_nick(command: &str, prefix: Option<&str>) -> Result<String, DecodeError> {
    let prefix = prefix.ok_or_else(|| DecodeError::MissingPrefix(command.to_owned()))?;
    let nick = prefix.split_once('!').map_or(prefix, |(nick, _)| nick);
    if nick.is_empty() {
        return Err(MaskError::EmptyPart(prefix.to_owned(), "nick").into());
    }
    Ok(nick.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> RosterEvent {
        decode_line(line).unwrap().unwrap()
    }

    #[test]
    fn join() {
        assert_eq!(
            decode(":alice!ali@host.example JOIN #rust\r\n"),
            RosterEvent::Join {
                sender: SenderInfo::new("alice", "ali", "host.example"),
                channel: "#rust".into(),
            }
        );
    }

    #[test]
    fn join_with_trailing_channel_and_tags() {
        assert_eq!(
            decode("@time=2024-01-01T00:00:00Z :alice!ali@h JOIN :#rust"),
            RosterEvent::Join {
                sender: SenderInfo::new("alice", "ali", "h"),
                channel: "#rust".into(),
            }
        );
    }

    #[test]
    fn part_and_quit_take_nick_from_prefix() {
        assert_eq!(
            decode(":bob!b@h PART #rust :bye now"),
            RosterEvent::Part {
                nick: "bob".into(),
                channel: "#rust".into(),
            }
        );
        assert_eq!(
            decode(":bob!b@h QUIT :Ping timeout"),
            RosterEvent::Quit { nick: "bob".into() }
        );
    }

    #[test]
    fn kick() {
        assert_eq!(
            decode(":op!o@h KICK #rust carol :behave"),
            RosterEvent::Kick {
                kicker: "op".into(),
                target: "carol".into(),
                channel: "#rust".into(),
            }
        );
    }

    #[test]
    fn nick_change() {
        assert_eq!(
            decode(":alice!ali@h NICK :bob"),
            RosterEvent::Renamed {
                old_nick: "alice".into(),
                new_nick: "bob".into(),
            }
        );
    }

    #[test]
    fn privmsg_keeps_target() {
        assert_eq!(
            decode(":alice!ali@h PRIVMSG #rust :hello : there"),
            RosterEvent::PrivateMessage {
                sender: SenderInfo::new("alice", "ali", "h"),
                target: "#rust".into(),
            }
        );
    }

    #[test]
    fn who_reply() {
        assert_eq!(
            decode(":irc.example.net 352 onebot #rust ~carol carol.host irc.example.net carol H :0 Carol C"),
            RosterEvent::WhoReply {
                channel: "#rust".into(),
                nick: "carol".into(),
                user: "~carol".into(),
                host: "carol.host".into(),
            }
        );
    }

    #[test]
    fn welcome_carries_assigned_nick() {
        assert_eq!(
            decode(":irc.example.net 001 onebot_ :Welcome to the network onebot_"),
            RosterEvent::Registered {
                nick: "onebot_".into(),
            }
        );
        assert_eq!(
            decode_line(":irc.example.net 001"),
            Err(DecodeError::MissingParams {
                command: "001".into(),
                expected: 1
            })
        );
    }

    #[test]
    fn error_is_connection_lost() {
        assert_eq!(
            decode("ERROR :Closing Link: onebot (Quit)"),
            RosterEvent::ConnectionLost
        );
    }

    #[test]
    fn unrelated_lines_are_skipped() {
        assert_eq!(decode_line("PING :irc.example.net"), Ok(None));
        assert_eq!(decode_line(":irc.example.net 002 onebot :Your host"), Ok(None));
        assert_eq!(decode_line(":a!b@c NOTICE #rust :hi"), Ok(None));
    }

    #[test]
    fn rejects_short_or_anonymous_lines() {
        assert_eq!(decode_line(""), Err(DecodeError::MissingCommand));
        assert_eq!(
            decode_line("JOIN #rust"),
            Err(DecodeError::MissingPrefix("JOIN".into()))
        );
        assert_eq!(
            decode_line(":op!o@h KICK #rust"),
            Err(DecodeError::MissingParams {
                command: "KICK".into(),
                expected: 2
            })
        );
        assert!(matches!(
            decode_line(":alice JOIN #rust"),
            Err(DecodeError::Mask(_))
        ));
    }

    #[test]
    fn kind_names() {
        assert_eq!(RosterEvent::ConnectionLost.kind(), "connection_lost");
        assert_eq!(decode(":a!b@c QUIT").kind(), "quit");
    }
}
