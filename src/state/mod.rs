//! Membership state.
//!
//! Contains the Roster (who is where), the records it owns, and the task
//! that serializes event application.

mod handle;
mod record;
mod roster;

pub use handle::{RosterHandle, RosterView};
pub use record::MemberRecord;
pub use roster::{MemberId, Roster};
