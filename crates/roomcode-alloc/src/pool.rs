//! The code pool: every code that is not currently allocated.
//!
//! Layout is a dense `Vec<Code>` of free codes plus a position index
//! (`slots`) keyed by code value:
//!
//! ```text
//! free:  [0003, 0000, 0004]          slots[0] = Some(1)
//!                                    slots[1] = None     (allocated)
//!                                    slots[2] = None     (allocated)
//!                                    slots[3] = Some(0)
//!                                    slots[4] = Some(2)
//! ```
//!
//! `take` picks a random position and `swap_remove`s it, patching the slot
//! of the element that moved into the hole. `give` pushes to the end.
//! Both are O(1), and `slots` makes membership O(1) so a code can never be
//! in `free` twice.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roomcode_protocol::Code;

use crate::AllocError;

/// The set of unassigned codes.
///
/// Not thread-safe by itself; the [`Allocator`](crate::Allocator) keeps it
/// behind the same lock as the [`Registry`](crate::Registry) so the two
/// always change together.
pub struct CodePool {
    /// Free codes, in no particular order.
    free: Vec<Code>,

    /// `slots[code]` is the position of `code` in `free`, or `None` if the
    /// code is allocated. Its length is the pool capacity.
    slots: Vec<Option<usize>>,

    rng: StdRng,
}

impl CodePool {
    /// Creates a full pool holding codes `0..size`.
    ///
    /// `size` is capped at [`Code::UNIVERSE`].
    pub fn new(size: u16) -> Self {
        Self::with_rng(size, StdRng::from_os_rng())
    }

    /// Creates a full pool with a caller-supplied RNG.
    ///
    /// Seeded RNGs make selection reproducible in tests.
    pub fn with_rng(size: u16, rng: StdRng) -> Self {
        let size = size.min(Code::UNIVERSE);
        let free: Vec<Code> = (0..size).filter_map(|v| Code::new(v).ok()).collect();
        let slots = (0..free.len()).map(Some).collect();
        Self { free, slots, rng }
    }

    /// Removes and returns a uniformly random free code.
    ///
    /// # Errors
    /// Returns [`AllocError::PoolExhausted`] if no code is free. The pool
    /// is left unchanged.
    pub fn take(&mut self) -> Result<Code, AllocError> {
        if self.free.is_empty() {
            return Err(AllocError::PoolExhausted);
        }

        let pos = self.rng.random_range(0..self.free.len());
        let code = self.free.swap_remove(pos);
        self.set_slot(code, None);

        // The former last element now sits at `pos` (unless we removed
        // the last element itself).
        if let Some(&moved) = self.free.get(pos) {
            self.set_slot(moved, Some(pos));
        }

        Ok(code)
    }

    /// Returns a code to the pool.
    ///
    /// Returns `false` and changes nothing if the code is already free or
    /// lies outside this pool's capacity.
    pub fn give(&mut self, code: Code) -> bool {
        match self.slots.get(code.index()) {
            Some(None) => {
                self.free.push(code);
                self.set_slot(code, Some(self.free.len() - 1));
                true
            }
            Some(Some(_)) | None => false,
        }
    }

    /// Returns `true` if the code is currently free.
    pub fn contains(&self, code: Code) -> bool {
        matches!(self.slots.get(code.index()), Some(Some(_)))
    }

    /// Returns `true` if the code belongs to this pool's universe
    /// (free or allocated).
    pub fn covers(&self, code: Code) -> bool {
        code.index() < self.slots.len()
    }

    /// Number of free codes.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Returns `true` if every code is allocated.
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Total number of codes in the universe (free + allocated).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn set_slot(&mut self, code: Code, pos: Option<usize>) {
        if let Some(slot) = self.slots.get_mut(code.index()) {
            *slot = pos;
        }
    }
}

impl std::fmt::Debug for CodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodePool")
            .field("free", &self.free.len())
            .field("capacity", &self.slots.len())
            .finish()
    }
}
