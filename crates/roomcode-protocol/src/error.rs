//! Error types for the protocol layer.
//!
//! Each crate in Roomcode defines its own error enum. Apart from
//! `Encode`, a `ProtocolError` means the input was malformed: bad JSON, a
//! missing field, or a code that is not four decimal digits.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed.
    ///
    /// Common causes: malformed JSON, a missing `GameId`, or a field of
    /// the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The string is not a valid room code.
    ///
    /// Codes are exactly [`Code::WIDTH`](crate::Code::WIDTH) ASCII digits.
    /// Anything else (`"12"`, `"12345"`, `"ab12"`, `" 123"`) is rejected
    /// rather than coerced.
    #[error("invalid room code {0:?}: expected 4 decimal digits")]
    InvalidCode(String),

    /// A numeric code value is outside the code universe.
    #[error("room code value {0} is out of range")]
    CodeOutOfRange(u32),
}
