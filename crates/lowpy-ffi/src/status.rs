//! C-compatible status codes.
//!
//! [`LowpyStatus`] is a `repr(i32)` enum covering every error condition a
//! buffer call can report. Conversions from the core error types are
//! provided so call sites can map with `LowpyStatus::from(&err)`.

use lowpy_core::{BufferError, ConfigError};

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LowpyStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already destroyed.
    InvalidHandle = -1,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -2,
    /// The requested memory could not be provided (allocator refusal or
    /// configured limit).
    AllocationFailed = -3,
    /// A read, write, or raw copy range exceeds the buffer length.
    OutOfBounds = -4,
    /// Buffer configuration failed validation.
    ConfigError = -5,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -6,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&BufferError> for LowpyStatus {
    fn from(e: &BufferError) -> Self {
        match e {
            BufferError::AllocationFailed { .. } | BufferError::CapacityExceeded { .. } => {
                LowpyStatus::AllocationFailed
            }
            BufferError::OutOfBounds { .. } => LowpyStatus::OutOfBounds,
        }
    }
}

impl From<&ConfigError> for LowpyStatus {
    fn from(_e: &ConfigError) -> Self {
        LowpyStatus::ConfigError
    }
}
