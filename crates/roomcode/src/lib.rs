//! # Roomcode
//!
//! Hands out short, human-typeable room codes and tracks them through a
//! relay's room webhooks.
//!
//! A client asks for a code (`GET /room/gen_code`), creates a relay room
//! named after it, and shares the code with friends. The relay then calls
//! `POST /room/create` (confirming the code) and later `POST /room/close`
//! (freeing it). Codes whose room never shows up are reclaimed after a
//! timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcode::prelude::*;
//!
//! # async fn run() -> Result<(), RoomcodeError> {
//! let server = RoomcodeServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::RoomcodeError;
pub use server::{RoomcodeServer, RoomcodeServerBuilder};

/// Everything needed to embed or test a Roomcode server.
pub mod prelude {
    pub use crate::{
        ConfigError, RoomcodeError, RoomcodeServer, RoomcodeServerBuilder, ServerConfig,
    };
    pub use roomcode_alloc::{
        AllocError, AllocationRecord, Allocator, AllocatorConfig, AllocatorStats, ReleaseOutcome,
    };
    pub use roomcode_protocol::{
        CloseRoomRequest, Code, CreateRoomRequest, ProtocolError, WebhookResponse,
    };
}
