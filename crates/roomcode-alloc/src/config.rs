//! Allocator configuration.

use std::time::Duration;

use roomcode_protocol::Code;
use tracing::warn;

/// Configuration for an [`Allocator`](crate::Allocator).
///
/// The pool is the codes `0..pool_size`, so a `pool_size` of 5 hands out
/// `"0000"`–`"0004"`. Small pools are useful when testing exhaustion by
/// hand against a running server.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Number of codes in the universe. Clamped to `1..=10_000`.
    pub pool_size: u16,

    /// How long an allocation may stay unconfirmed before its code is
    /// reclaimed.
    pub reclaim_after: Duration,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            pool_size: Code::UNIVERSE,
            reclaim_after: Duration::from_secs(10),
        }
    }
}

impl AllocatorConfig {
    /// Creates a config with the given pool size and default timeout.
    pub fn with_pool_size(pool_size: u16) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Allocator::new`](crate::Allocator::new).
    pub fn validated(mut self) -> Self {
        if self.pool_size == 0 {
            warn!("pool_size is 0, using 1");
            self.pool_size = 1;
        }
        if self.pool_size > Code::UNIVERSE {
            warn!(
                pool_size = self.pool_size,
                max = Code::UNIVERSE,
                "pool_size exceeds code universe, clamping"
            );
            self.pool_size = Code::UNIVERSE;
        }
        self
    }
}
