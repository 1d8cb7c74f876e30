//! Buffer configuration parameters.

use std::error::Error;
use std::fmt;

/// Configuration for a [`Buffer`](crate::Buffer).
///
/// Bounds how large the buffer may grow. Validated at construction; the
/// limit is fixed for the lifetime of the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    /// Largest length, in bytes, the buffer may reach through `allocate`,
    /// `reallocate`, sized construction, or `copy_into`.
    ///
    /// Default: `isize::MAX`, the largest size a single Rust allocation
    /// can have. Zero is allowed and yields a buffer that can never hold data.
    pub max_bytes: usize,
}

impl BufferConfig {
    /// Default and largest accepted value for [`max_bytes`](Self::max_bytes).
    pub const MAX_BYTES_LIMIT: usize = isize::MAX as usize;

    /// Create a config with the given byte limit.
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Check that the config can be honoured by the allocator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes > Self::MAX_BYTES_LIMIT {
            return Err(ConfigError::MaxBytesTooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new(Self::MAX_BYTES_LIMIT)
    }
}

/// Errors detected by [`BufferConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_bytes` is larger than any allocation can be.
    MaxBytesTooLarge {
        /// The configured value.
        max_bytes: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxBytesTooLarge { max_bytes } => write!(
                f,
                "max_bytes {max_bytes} exceeds the allocation limit of {} bytes",
                BufferConfig::MAX_BYTES_LIMIT
            ),
        }
    }
}

impl Error for ConfigError {}
