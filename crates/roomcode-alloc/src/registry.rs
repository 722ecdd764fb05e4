//! The allocation registry: every code currently handed out.
//!
//! A record enters the registry when a code is allocated and leaves it
//! when the code is released or reclaimed. While it is here the record
//! tracks WHEN it was allocated, WHETHER the relay has confirmed a room
//! for it, and WHICH allocation it is (codes are reused, so the code alone
//! doesn't identify an allocation).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use roomcode_protocol::Code;
use tokio::time::Instant;

use crate::AllocError;

// ---------------------------------------------------------------------------
// AllocationId
// ---------------------------------------------------------------------------

/// Identifies one use of a code.
///
/// Code `0042` may be allocated, released, and allocated again within a
/// single reclaim window. The timeout task scheduled for the first
/// allocation must not touch the second; it compares ids to tell them
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocationId(pub u64);

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AllocationRecord
// ---------------------------------------------------------------------------

/// One outstanding allocation.
///
/// Uses Tokio's `Instant` so paused-clock tests see consistent ages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRecord {
    /// The code this record is keyed by.
    pub code: Code,

    /// Which use of the code this is.
    pub allocation_id: AllocationId,

    /// `true` once the relay reported the room as created.
    /// Never goes back to `false`.
    pub confirmed: bool,

    /// When the code was allocated.
    pub created_at: Instant,

    /// When the room was confirmed, if it was.
    pub confirmed_at: Option<Instant>,
}

impl AllocationRecord {
    /// Creates a pending (unconfirmed) record.
    pub fn pending(code: Code, allocation_id: AllocationId, now: Instant) -> Self {
        Self {
            code,
            allocation_id,
            confirmed: false,
            created_at: now,
            confirmed_at: None,
        }
    }

    /// Returns `true` if the room has not been confirmed yet.
    pub fn is_pending(&self) -> bool {
        !self.confirmed
    }

    /// Time since allocation.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

/// Result of [`Registry::set_confirmed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The record went from pending to confirmed.
    Confirmed(AllocationId),
    /// The record was already confirmed; nothing changed.
    AlreadyConfirmed(AllocationId),
    /// No record exists for the code.
    Missing,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps allocated codes to their records.
///
/// Like [`CodePool`](crate::CodePool), this is a plain single-owner
/// structure. The allocator's lock is what makes each method atomic with
/// respect to the others.
#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<Code, AllocationRecord>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record.
    ///
    /// # Errors
    /// Returns [`AllocError::DuplicateCode`] if the code already has a
    /// live record. The existing record is kept.
    pub fn insert(&mut self, record: AllocationRecord) -> Result<(), AllocError> {
        let code = record.code;
        if self.records.contains_key(&code) {
            return Err(AllocError::DuplicateCode(code));
        }
        self.records.insert(code, record);
        Ok(())
    }

    /// Looks up the record for a code.
    pub fn get(&self, code: &Code) -> Option<&AllocationRecord> {
        self.records.get(code)
    }

    /// Returns `true` if the code has a live record.
    pub fn contains(&self, code: &Code) -> bool {
        self.records.contains_key(code)
    }

    /// Removes and returns the record for a code.
    ///
    /// `None` means someone else removed it first.
    pub fn remove(&mut self, code: &Code) -> Option<AllocationRecord> {
        self.records.remove(code)
    }

    /// Marks a record as confirmed.
    pub fn set_confirmed(&mut self, code: &Code, now: Instant) -> Confirmation {
        match self.records.get_mut(code) {
            Some(record) if record.confirmed => {
                Confirmation::AlreadyConfirmed(record.allocation_id)
            }
            Some(record) => {
                record.confirmed = true;
                record.confirmed_at = Some(now);
                Confirmation::Confirmed(record.allocation_id)
            }
            None => Confirmation::Missing,
        }
    }

    /// Removes the record only if it still belongs to `allocation_id` and
    /// is still unconfirmed.
    ///
    /// This is the timeout reclaimer's single check-and-act step. Returns
    /// `None` (and changes nothing) if the record is gone, was confirmed,
    /// or belongs to a later allocation of the same code.
    pub fn remove_if_pending(
        &mut self,
        code: &Code,
        allocation_id: AllocationId,
    ) -> Option<AllocationRecord> {
        let owned = self
            .records
            .get(code)
            .is_some_and(|r| r.allocation_id == allocation_id && r.is_pending());
        if owned {
            self.records.remove(code)
        } else {
            None
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is allocated.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records still waiting for confirmation.
    pub fn pending_count(&self) -> usize {
        self.records.values().filter(|r| r.is_pending()).count()
    }

    /// Number of confirmed records.
    pub fn confirmed_count(&self) -> usize {
        self.records.values().filter(|r| r.confirmed).count()
    }

    /// Iterates over the allocated codes, in no particular order.
    pub fn codes(&self) -> impl Iterator<Item = Code> + '_ {
        self.records.keys().copied()
    }
}
