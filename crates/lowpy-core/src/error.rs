//! Buffer error types.
//!
//! Two failure kinds reach callers: allocation failures (the allocator
//! refused, or the request exceeds the configured limit) and out-of-bounds
//! accesses. Neither is retried, and neither leaves partial effects.

use std::error::Error;
use std::fmt;

/// Errors that can occur during buffer operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The allocator could not provide the requested region.
    AllocationFailed {
        /// Total size of the region that was requested, in bytes.
        requested: usize,
    },
    /// The requested size exceeds the buffer's `max_bytes` limit, or the
    /// size computation overflowed `usize`.
    CapacityExceeded {
        /// Total size of the region that was requested, in bytes.
        /// Saturates at `usize::MAX` on overflow.
        requested: usize,
        /// The configured limit.
        max_bytes: usize,
    },
    /// An access of `width` bytes at `offset` does not fit inside the
    /// buffer's current length.
    OutOfBounds {
        /// Byte offset of the access.
        offset: usize,
        /// Number of bytes the access spans.
        width: usize,
        /// Buffer length at the time of the access.
        len: usize,
    },
}

impl BufferError {
    /// Whether this error is one of the allocation-failure kinds.
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. } | Self::CapacityExceeded { .. }
        )
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "allocation of {requested} bytes failed")
            }
            Self::CapacityExceeded {
                requested,
                max_bytes,
            } => {
                write!(
                    f,
                    "allocation of {requested} bytes exceeds limit of {max_bytes} bytes"
                )
            }
            Self::OutOfBounds { offset, width, len } => {
                write!(
                    f,
                    "memory access out of bounds: {width} bytes at offset {offset}, buffer length {len}"
                )
            }
        }
    }
}

impl Error for BufferError {}
