//! LowPy: owned raw memory buffers with bounds-checked typed access.
//!
//! This is the top-level facade crate that re-exports the public Rust API.
//! Foreign callers use the C ABI in `lowpy-ffi` or the `_lowpy` Python
//! extension instead.
//!
//! # Quick start
//!
//! ```rust
//! use lowpy::prelude::*;
//!
//! let mut buffer = Buffer::with_size(16).unwrap();
//! buffer.write(42i32, 0).unwrap();
//! buffer.write(0.5f64, 8).unwrap();
//! assert_eq!(buffer.read::<i32>(0).unwrap(), 42);
//!
//! // Out-of-range accesses fail and leave the buffer untouched.
//! let err = buffer.write_raw(&[0u8; 6], 12).unwrap_err();
//! assert!(matches!(err, BufferError::OutOfBounds { .. }));
//!
//! // Copies are independent.
//! let mut copy = Buffer::new();
//! buffer.copy_into(&mut copy).unwrap();
//! buffer.write(7i32, 0).unwrap();
//! assert_eq!(copy.read::<i32>(0).unwrap(), 42);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Buffer, config, and error types (`lowpy-core`).
pub use lowpy_core as buffer;

/// Common imports for typical LowPy usage.
///
/// ```rust
/// use lowpy::prelude::*;
/// ```
pub mod prelude {
    pub use lowpy_core::{Buffer, BufferConfig, BufferError, ConfigError, Pod};
}
