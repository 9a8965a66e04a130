//! Case-folding for nickname and channel lookup keys.
//!
//! IRC servers advertise the comparison they use through the CASEMAPPING
//! ISUPPORT token. The roster folds every nick and channel through the
//! configured mapping before using it as a map key, while records keep the
//! display spelling they were last seen with.

use serde::Deserialize;

/// Case mapping used to compare nicknames and channel names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casemapping {
    /// Only `A-Z` fold to `a-z`.
    #[default]
    Ascii,
    /// ASCII folding plus `[]\~` to `{}|^`.
    Rfc1459,
}

impl Casemapping {
    /// Fold a single character.
    #[inline]
    pub const fn fold_char(self, c: char) -> char {
        match self {
            Self::Ascii => c.to_ascii_lowercase(),
            Self::Rfc1459 => match c {
                '[' => '{',
                ']' => '}',
                '\\' => '|',
                '~' => '^',
                _ => c.to_ascii_lowercase(),
            },
        }
    }

    /// Fold a string into its lookup key.
    pub fn fold(self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }

    /// Compare two strings under this mapping without allocating.
    pub fn equals(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a.chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.fold_char(ca) == self.fold_char(cb))
    }
}
