//! Benchmark fixtures for the lowpy raw memory buffer.
//!
//! - [`patterned_buffer`]: a buffer filled with a repeating byte ramp
//! - [`payload`]: a matching byte vector for raw-write benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use lowpy_core::Buffer;

/// Sizes used by the size-sweeping benchmarks: 64 B, 4 KiB, 1 MiB.
pub const SIZES: [usize; 3] = [64, 4 * 1024, 1024 * 1024];

/// A byte ramp `0, 1, .., 255, 0, 1, ..` of length `len`.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// A buffer of `len` bytes holding [`payload`]`(len)`.
///
/// # Panics
///
/// Panics if the allocation fails.
pub fn patterned_buffer(len: usize) -> Buffer {
    let mut buffer = Buffer::with_size(len).expect("bench buffer allocation");
    buffer
        .write_raw(&payload(len), 0)
        .expect("payload fits by construction");
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterned_buffer_matches_payload() {
        let buffer = patterned_buffer(300);
        assert_eq!(buffer.len(), 300);
        assert_eq!(buffer.to_vec(), payload(300));
        assert_eq!(buffer.read::<u8>(257).unwrap(), 1);
    }
}
