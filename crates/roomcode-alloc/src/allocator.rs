//! The allocator: moves codes between the pool and the registry.
//!
//! # Concurrency
//!
//! The pool and registry live together behind ONE `tokio::sync::Mutex`.
//! Every public operation takes the lock once, does its whole
//! check-and-act step, and releases it. That single domain is what makes
//! "exactly one of {release, timeout} returns the code" hold: whichever
//! takes the lock first removes the record, and the other finds it gone.
//!
//! # Timeout reclaimers
//!
//! `allocate` spawns one Tokio task per allocation. The task sleeps until
//! `created_at + reclaim_after`, then takes the lock and removes the record only if it
//! is still pending AND still the same allocation. It is never cancelled:
//! confirm and release just leave it with nothing to do.
//!
//! Reclaimers hold a `Weak` reference to the shared state, so dropping
//! every [`Allocator`] handle turns outstanding reclaimers into no-ops.

use std::sync::{Arc, Weak};

use roomcode_protocol::Code;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    AllocError, AllocationId, AllocationRecord, AllocatorConfig, CodePool, Confirmation,
    Registry,
};

/// What [`Allocator::release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// This call removed the allocation and returned the code to the pool.
    Released,
    /// There was no allocation to remove (already released or reclaimed).
    AlreadyReleased,
}

/// A point-in-time view of the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocatorStats {
    /// Total codes in the universe.
    pub capacity: usize,
    /// Codes in the pool.
    pub free: usize,
    /// Allocated codes waiting for a room.
    pub pending: usize,
    /// Allocated codes with a confirmed room.
    pub confirmed: usize,
}

/// Pool and registry, always mutated together.
struct State {
    pool: CodePool,
    registry: Registry,
    /// Id for the next successful allocation.
    next_allocation_id: u64,
}

impl State {
    fn next_allocation_id(&mut self) -> AllocationId {
        let id = AllocationId(self.next_allocation_id);
        self.next_allocation_id += 1;
        id
    }

    /// Removes the record (if any) and returns its code to the pool.
    fn release(&mut self, code: Code) -> Option<AllocationRecord> {
        let record = self.registry.remove(&code)?;
        let returned = self.pool.give(code);
        debug_assert!(returned, "code {code} was in both pool and registry");
        Some(record)
    }

    /// Cheap per-code partition check, run after every mutation in debug
    /// builds.
    fn code_is_partitioned(&self, code: Code) -> bool {
        !self.pool.covers(code) || (self.pool.contains(code) != self.registry.contains(&code))
    }

    fn verify_partition(&self) -> Result<(), AllocError> {
        let capacity = self.pool.capacity();
        if self.pool.len() + self.registry.len() != capacity {
            return Err(AllocError::Invariant(format!(
                "{} free + {} allocated != {} total",
                self.pool.len(),
                self.registry.len(),
                capacity
            )));
        }
        if let Some(code) = self.registry.codes().find(|c| !self.pool.covers(*c)) {
            return Err(AllocError::Invariant(format!(
                "allocated code {code} is outside the pool"
            )));
        }
        if let Some(code) = self.registry.codes().find(|c| self.pool.contains(*c)) {
            return Err(AllocError::Invariant(format!(
                "code {code} is both free and allocated"
            )));
        }
        Ok(())
    }
}

struct Inner {
    state: Mutex<State>,
    config: AllocatorConfig,
}

impl Inner {
    /// The timeout reclaimer's check-and-act step.
    async fn reclaim(&self, code: Code, allocation_id: AllocationId) {
        let mut state = self.state.lock().await;
        match state.registry.remove_if_pending(&code, allocation_id) {
            Some(record) => {
                let returned = state.pool.give(code);
                debug_assert!(returned, "code {code} was in both pool and registry");
                info!(
                    %code,
                    %allocation_id,
                    age_ms = record.age().as_millis() as u64,
                    "allocation timed out, code reclaimed"
                );
            }
            None => {
                debug!(%code, %allocation_id, "reclaimer fired, nothing to reclaim");
            }
        }
        debug_assert!(state.code_is_partitioned(code));
    }
}

/// Hands out room codes and takes them back.
///
/// Cheap to clone: every clone shares the same pool and registry. Build
/// one at startup and give a clone to each request handler.
///
/// ```text
/// allocate() ──→ confirm() ──→ release()
///     │                            ↑
///     └──(reclaim_after, unconfirmed)──→ code back in pool
/// ```
#[derive(Clone)]
pub struct Allocator {
    inner: Arc<Inner>,
}

impl Allocator {
    /// Creates an allocator with a full pool.
    pub fn new(config: AllocatorConfig) -> Self {
        let config = config.validated();
        Self::with_pool(CodePool::new(config.pool_size), config)
    }

    /// Creates an allocator around a caller-built pool.
    ///
    /// Useful with a seeded pool for reproducible tests. The pool's
    /// capacity wins over `config.pool_size`.
    pub fn with_pool(pool: CodePool, mut config: AllocatorConfig) -> Self {
        config.pool_size = u16::try_from(pool.capacity()).unwrap_or(Code::UNIVERSE);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    pool,
                    registry: Registry::new(),
                    next_allocation_id: 1,
                }),
                config,
            }),
        }
    }

    /// Returns the configuration in effect.
    pub fn config(&self) -> &AllocatorConfig {
        &self.inner.config
    }

    /// Allocates a code and schedules its timeout reclaimer.
    ///
    /// # Errors
    /// - [`AllocError::PoolExhausted`] — every code is in use. Nothing
    ///   changes; the caller decides whether to retry.
    /// - [`AllocError::DuplicateCode`] — internal invariant violation.
    pub async fn allocate(&self) -> Result<Code, AllocError> {
        let (code, allocation_id, deadline) = {
            let mut state = self.inner.state.lock().await;

            let code = match state.pool.take() {
                Ok(code) => code,
                Err(e) => {
                    warn!(capacity = state.pool.capacity(), "code pool exhausted");
                    return Err(e);
                }
            };

            let allocation_id = state.next_allocation_id();
            let created_at = Instant::now();
            let record = AllocationRecord::pending(code, allocation_id, created_at);
            if let Err(e) = state.registry.insert(record) {
                // The code was free AND allocated. Leave it with the
                // existing record rather than handing it out twice.
                error!(%code, error = %e, "pool handed out an allocated code");
                debug_assert!(false, "pool handed out allocated code {code}");
                return Err(e);
            }

            debug_assert!(state.code_is_partitioned(code));
            (code, allocation_id, created_at + self.inner.config.reclaim_after)
        };

        self.schedule_reclaim(code, allocation_id, deadline);

        info!(%code, %allocation_id, "code allocated");
        Ok(code)
    }

    /// Marks the allocation for `code` as confirmed.
    ///
    /// Confirmed allocations are never reclaimed by timeout; only
    /// [`release`](Self::release) returns their code. Confirming twice is
    /// harmless.
    ///
    /// # Errors
    /// Returns [`AllocError::UnknownCode`] if the code has no live
    /// allocation (never allocated, released, or timed out).
    pub async fn confirm(&self, code: Code) -> Result<(), AllocError> {
        let mut state = self.inner.state.lock().await;
        match state.registry.set_confirmed(&code, Instant::now()) {
            Confirmation::Confirmed(allocation_id) => {
                info!(%code, %allocation_id, "room confirmed");
                Ok(())
            }
            Confirmation::AlreadyConfirmed(allocation_id) => {
                debug!(%code, %allocation_id, "room already confirmed");
                Ok(())
            }
            Confirmation::Missing => Err(AllocError::UnknownCode(code)),
        }
    }

    /// Removes the allocation for `code` and returns the code to the pool.
    ///
    /// Never fails: if the allocation is already gone (released earlier,
    /// or reclaimed by its timeout), this is a no-op that reports
    /// [`ReleaseOutcome::AlreadyReleased`].
    pub async fn release(&self, code: Code) -> ReleaseOutcome {
        let mut state = self.inner.state.lock().await;
        let outcome = match state.release(code) {
            Some(record) => {
                info!(
                    %code,
                    allocation_id = %record.allocation_id,
                    confirmed = record.confirmed,
                    "code released"
                );
                ReleaseOutcome::Released
            }
            None => {
                debug!(%code, "release of unallocated code ignored");
                ReleaseOutcome::AlreadyReleased
            }
        };
        debug_assert!(state.code_is_partitioned(code));
        outcome
    }

    /// Returns a snapshot of the allocation record for `code`, if any.
    pub async fn get(&self, code: Code) -> Option<AllocationRecord> {
        let state = self.inner.state.lock().await;
        state.registry.get(&code).cloned()
    }

    /// Returns `true` if `code` is currently in the pool.
    pub async fn is_free(&self, code: Code) -> bool {
        self.inner.state.lock().await.pool.contains(code)
    }

    /// Returns pool and registry counts, taken under one lock.
    pub async fn stats(&self) -> AllocatorStats {
        let state = self.inner.state.lock().await;
        AllocatorStats {
            capacity: state.pool.capacity(),
            free: state.pool.len(),
            pending: state.registry.pending_count(),
            confirmed: state.registry.confirmed_count(),
        }
    }

    /// Checks that every code is in exactly one of pool and registry.
    ///
    /// O(capacity). Meant for tests and diagnostics.
    ///
    /// # Errors
    /// Returns [`AllocError::Invariant`] describing the first violation.
    pub async fn verify_partition(&self) -> Result<(), AllocError> {
        self.inner.state.lock().await.verify_partition()
    }

    /// Spawns the timeout reclaimer for one allocation.
    ///
    /// `deadline` is fixed from the record's `created_at`, so a task that
    /// starts late still fires on time.
    fn schedule_reclaim(&self, code: Code, allocation_id: AllocationId, deadline: Instant) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            match weak.upgrade() {
                Some(inner) => inner.reclaim(code, allocation_id).await,
                None => debug!(%code, "allocator dropped before reclaim"),
            }
        });
    }
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
