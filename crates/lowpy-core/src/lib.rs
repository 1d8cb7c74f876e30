//! Core buffer type for the lowpy raw memory library.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! [`Buffer`]: one owned, contiguous, resizable region of untyped bytes
//! with bounds-checked typed and raw access. The FFI and Python crates
//! build on top of it and never touch the storage directly.
//!
//! # Buffer states
//!
//! ```text
//! empty ──allocate(n) / reallocate(n)──▶ allocated (len = n)
//!   ▲                                        │
//!   └──────────── deallocate() / drop ───────┘
//! ```
//!
//! Every read or write of `width` bytes at `offset` requires
//! `offset + width <= len`. Failed operations leave the buffer unchanged.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;

pub use buffer::Buffer;
pub use config::{BufferConfig, ConfigError};
pub use error::BufferError;

/// Fixed-size plain-data types that can be stored in a [`Buffer`].
///
/// Any [`bytemuck::Pod`] type qualifies; values are stored in native
/// byte order with no padding or alignment requirements on the offset.
pub use bytemuck::Pod;
