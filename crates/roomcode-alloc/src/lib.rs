//! Room code allocation for Roomcode.
//!
//! This crate owns the lifecycle of every room code:
//!
//! 1. **Pool** — codes nobody is using ([`CodePool`])
//! 2. **Registry** — codes handed out and waiting for, or holding, a room
//!    ([`Registry`], [`AllocationRecord`])
//! 3. **Allocator** — the coordinator that moves codes between the two and
//!    reclaims codes whose room never showed up ([`Allocator`])
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP handlers (above)  ← call allocate / confirm / release
//!     ↕
//! Allocator (this crate) ← pool + registry behind one lock, timeout tasks
//!     ↕
//! Protocol (below)       ← provides Code
//! ```
//!
//! # Lifecycle of a code
//!
//! ```text
//!   [Pool] ──allocate()──→ [Pending] ──confirm()──→ [Confirmed]
//!     ↑                       │                          │
//!     ├────release()──────────┤                          │
//!     ├────timeout────────────┘                          │
//!     └────release()─────────────────────────────────────┘
//! ```

mod allocator;
mod config;
mod error;
mod pool;
mod registry;

pub use allocator::{Allocator, AllocatorStats, ReleaseOutcome};
pub use config::AllocatorConfig;
pub use error::AllocError;
pub use pool::CodePool;
pub use registry::{AllocationId, AllocationRecord, Confirmation, Registry};
