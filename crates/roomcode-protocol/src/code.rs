//! The room code: a short, human-typeable token.
//!
//! Codes are drawn from the fixed universe `"0000"`–`"9999"`. Internally a
//! code is a `u16`; externally it is ALWAYS exactly four ASCII digits,
//! zero-padded. The two forms convert losslessly, so `"0042"` parses to
//! the same code that displays as `"0042"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A room code.
///
/// Newtype over `u16` so a code can't be confused with a count or an
/// index. Construction is checked: every `Code` value is inside the
/// universe.
///
/// Serializes as its zero-padded string form (`"0042"`), which is what
/// clients see and what the relay echoes back as `GameId`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Code(u16);

impl Code {
    /// Number of digits in the external form.
    pub const WIDTH: usize = 4;

    /// Size of the code universe (`10^WIDTH`).
    pub const UNIVERSE: u16 = 10_000;

    /// Creates a code from its numeric value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::CodeOutOfRange`] if `value >= 10_000`.
    pub fn new(value: u16) -> Result<Self, ProtocolError> {
        if value >= Self::UNIVERSE {
            return Err(ProtocolError::CodeOutOfRange(u32::from(value)));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value (`0..10_000`).
    pub fn value(self) -> u16 {
        self.0
    }

    /// Returns the value as a `usize`, for indexing dense tables.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = Self::WIDTH)
    }
}

impl FromStr for Code {
    type Err = ProtocolError;

    /// Parses the external form.
    ///
    /// Strict: exactly four ASCII digits, no sign, no whitespace.
    /// `u16::from_str` alone would accept `"+42"` and `"42"`, so the
    /// shape is checked first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidCode(s.to_string()));
        }
        let value: u16 = s
            .parse()
            .map_err(|_| ProtocolError::InvalidCode(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<String> for Code {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.to_string()
    }
}
