//! Codec trait and implementations for webhook bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Handlers never call `serde_json` directly; they go through a [`Codec`]
//! so a decode failure always surfaces as a [`ProtocolError`] with the
//! same shape, regardless of which payload was being parsed.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec lives in shared server state
/// and is used from every request task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The relay posts JSON webhooks, so this is the only codec the server
/// needs. It is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use roomcode_protocol::{Codec, CloseRoomRequest, JsonCodec};
///
/// let codec = JsonCodec;
/// let req: CloseRoomRequest = codec
///     .decode(br#"{"GameId":"0042","ActorCount":0}"#)
///     .unwrap();
/// assert_eq!(req.game_id, "0042");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
