//! The owned raw byte buffer.
//!
//! A [`Buffer`] owns one contiguous `Vec<u8>` whose length is the buffer
//! length. Typed access goes through [`bytemuck::Pod`], so values are
//! copied in and out as native-endian bytes at any offset with no alignment
//! requirement and no pointer casts.

use std::fmt;
use std::mem::size_of;
use std::ops::Range;

use bytemuck::Pod;

use crate::config::{BufferConfig, ConfigError};
use crate::error::BufferError;

/// An owned, resizable, contiguous region of untyped bytes.
///
/// All accesses are bounds-checked against the current length. Every
/// fallible operation either succeeds completely or leaves the buffer
/// exactly as it was.
///
/// Not internally synchronised: a `Buffer` is `Send` but concurrent
/// access to one value must be arranged by the owner.
pub struct Buffer {
    /// Backing storage. `data.len()` is the buffer length.
    data: Vec<u8>,
    config: BufferConfig,
}

impl Buffer {
    /// Create an empty buffer with no storage and the default config.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            config: BufferConfig::default(),
        }
    }

    /// Create an empty buffer governed by `config`.
    pub fn with_config(config: BufferConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            data: Vec::new(),
            config,
        })
    }

    /// Create a buffer with `initial_size` bytes allocated immediately.
    ///
    /// The contents are zero-filled, but callers should treat them as
    /// unspecified until written.
    pub fn with_size(initial_size: usize) -> Result<Self, BufferError> {
        let mut buffer = Self::new();
        buffer.allocate(initial_size)?;
        Ok(buffer)
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The config this buffer was created with.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Replace the storage with a fresh region of exactly `bytes` bytes.
    ///
    /// Any previous contents are released and the length becomes `bytes`;
    /// use [`reallocate`](Self::reallocate) to grow while keeping data.
    /// If the new region cannot be obtained the old one is kept untouched.
    pub fn allocate(&mut self, bytes: usize) -> Result<(), BufferError> {
        let mut fresh = self.reserve_fresh(bytes)?;
        fresh.resize(bytes, 0);
        let released = std::mem::replace(&mut self.data, fresh);
        log::debug!(
            "buffer allocated: len={bytes}, released={}",
            released.len()
        );
        Ok(())
    }

    /// Grow the buffer by `additional_bytes`, preserving existing contents.
    ///
    /// On an empty buffer this is a fresh allocation of `additional_bytes`.
    /// On failure the buffer is unchanged.
    pub fn reallocate(&mut self, additional_bytes: usize) -> Result<(), BufferError> {
        let old_len = self.data.len();
        let new_len = old_len
            .checked_add(additional_bytes)
            .ok_or(BufferError::CapacityExceeded {
                requested: usize::MAX,
                max_bytes: self.config.max_bytes,
            })?;
        self.check_limit(new_len)?;
        if self.data.try_reserve_exact(additional_bytes).is_err() {
            return Err(self.refused(new_len));
        }
        self.data.resize(new_len, 0);
        log::debug!("buffer reallocated: len={old_len} -> {new_len}");
        Ok(())
    }

    /// Release the storage. The length becomes zero.
    ///
    /// Calling this on an empty buffer is a no-op.
    pub fn deallocate(&mut self) {
        if self.data.capacity() == 0 {
            return;
        }
        let released = std::mem::take(&mut self.data);
        log::debug!("buffer deallocated: released={}", released.len());
    }

    /// Write `value` as `size_of::<T>()` native-endian bytes at `offset`.
    pub fn write<T: Pod>(&mut self, value: T, offset: usize) -> Result<(), BufferError> {
        let range = self.range(offset, size_of::<T>())?;
        self.data[range].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Read a `T` from the `size_of::<T>()` bytes at `offset`.
    pub fn read<T: Pod>(&self, offset: usize) -> Result<T, BufferError> {
        let range = self.range(offset, size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(&self.data[range]))
    }

    /// Copy `destination.len()` bytes starting at `offset` into `destination`.
    pub fn read_raw(&self, destination: &mut [u8], offset: usize) -> Result<(), BufferError> {
        let range = self.range(offset, destination.len())?;
        destination.copy_from_slice(&self.data[range]);
        Ok(())
    }

    /// Copy all of `source` into the buffer starting at `offset`.
    pub fn write_raw(&mut self, source: &[u8], offset: usize) -> Result<(), BufferError> {
        let range = self.range(offset, source.len())?;
        self.data[range].copy_from_slice(source);
        Ok(())
    }

    /// Make `target` an independent byte-for-byte copy of this buffer.
    ///
    /// The target's previous storage is released and replaced by a new
    /// region of this buffer's length, subject to the target's own limit.
    /// Copying an empty buffer leaves the target empty. If the new region
    /// cannot be obtained the target is unchanged.
    pub fn copy_into(&self, target: &mut Buffer) -> Result<(), BufferError> {
        let mut fresh = target.reserve_fresh(self.data.len())?;
        fresh.extend_from_slice(&self.data);
        target.data = fresh;
        log::debug!("buffer copied: len={}", self.data.len());
        Ok(())
    }

    /// Allocate an independent copy with the same config and contents.
    pub fn try_clone(&self) -> Result<Buffer, BufferError> {
        let mut copy = Buffer {
            data: Vec::new(),
            config: self.config,
        };
        self.copy_into(&mut copy)?;
        Ok(copy)
    }

    /// Copy the whole contents out into a new `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Validate an access of `width` bytes at `offset`.
    fn range(&self, offset: usize, width: usize) -> Result<Range<usize>, BufferError> {
        let len = self.data.len();
        match offset.checked_add(width) {
            Some(end) if end <= len => Ok(offset..end),
            _ => Err(BufferError::OutOfBounds { offset, width, len }),
        }
    }

    fn check_limit(&self, requested: usize) -> Result<(), BufferError> {
        if requested > self.config.max_bytes {
            log::warn!(
                "buffer allocation rejected: requested={requested}, max_bytes={}",
                self.config.max_bytes
            );
            return Err(BufferError::CapacityExceeded {
                requested,
                max_bytes: self.config.max_bytes,
            });
        }
        Ok(())
    }

    /// An empty vector with room for exactly `len` bytes.
    fn reserve_fresh(&self, len: usize) -> Result<Vec<u8>, BufferError> {
        self.check_limit(len)?;
        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            return Err(self.refused(len));
        }
        Ok(data)
    }

    fn refused(&self, requested: usize) -> BufferError {
        log::warn!("buffer allocation failed: requested={requested}");
        BufferError::AllocationFailed { requested }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.len())
            .field("max_bytes", &self.config.max_bytes)
            .finish()
    }
}
