//! chanroster - channel membership and identity tracking for IRC bots.
//!
//! Feed protocol events into a [`Roster`] (directly, or through a
//! [`RosterHandle`] when several components share it) and ask it who is
//! where. Each tracked user carries a stable [`IdentityKey`] that survives
//! nick changes and indexes the user's persisted settings.

pub mod casemap;
pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod mask;
pub mod settings;
pub mod state;
pub mod telemetry;

pub use casemap::Casemapping;
pub use error::{RosterClosed, RosterError, RosterResult};
pub use event::{RosterEvent, decode_line};
pub use identity::{IdentifyBy, IdentityKey};
pub use mask::SenderInfo;
pub use settings::{MemorySettings, SettingsDocument, SettingsStore, SqliteSettings};
pub use state::{MemberRecord, Roster, RosterHandle, RosterView};
