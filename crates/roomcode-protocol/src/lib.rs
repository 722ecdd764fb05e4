//! Wire-level types for Roomcode.
//!
//! This crate defines everything that crosses the process boundary:
//!
//! - **Code** ([`Code`]) — the four-digit, zero-padded room code that
//!   clients type in and the relay echoes back as a game id.
//! - **Webhook payloads** ([`CreateRoomRequest`], [`CloseRoomRequest`],
//!   [`WebhookResponse`]) — the bodies the relay posts to us and the
//!   acknowledgement it expects back.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those bodies are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! HTTP (bytes) → Protocol (payload, Code) → Allocator (pool + registry)
//! ```
//!
//! The protocol layer knows nothing about allocation state. It only turns
//! bytes and strings into validated values.

mod code;
mod codec;
mod error;
mod types;

pub use code::Code;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{CloseRoomRequest, CreateOptions, CreateRoomRequest, WebhookResponse};
