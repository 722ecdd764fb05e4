//! Error types for the allocation layer.

use roomcode_protocol::Code;

/// Errors that can occur during allocation operations.
///
/// `release` has no error case on purpose: releasing a code that is
/// already back in the pool is a normal race with the timeout reclaimer.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// Every code in the universe is currently allocated.
    ///
    /// Retryable: codes come back as rooms close or allocations time out.
    #[error("no free room codes available")]
    PoolExhausted,

    /// No live allocation exists for this code.
    /// It was never handed out, was already released, or timed out.
    #[error("no pending allocation for code {0}")]
    UnknownCode(Code),

    /// The registry already holds a record for this code.
    /// Only reachable if the pool/registry partition is broken.
    #[error("code {0} already has a live allocation")]
    DuplicateCode(Code),

    /// The pool/registry partition does not hold.
    #[error("allocation state corrupted: {0}")]
    Invariant(String),
}

impl AllocError {
    /// Returns `true` if the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }

    /// Returns `true` for errors that indicate a bug in the allocator
    /// rather than a bad or unlucky request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::DuplicateCode(_) | Self::Invariant(_))
    }
}
