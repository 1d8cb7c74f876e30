//! Typed and raw buffer access FFI.
//!
//! The core exposes one generic `read`/`write` pair; C has no generics, so
//! this module instantiates it once per supported scalar type. Raw
//! transfers copy between a caller span and the buffer.

use lowpy_core::Pod;

use crate::registry::lookup;
use crate::report;
use crate::status::LowpyStatus;

#[allow(unsafe_code)]
fn read_scalar<T: Pod>(handle: u64, offset: usize, out: *mut T) -> i32 {
    if out.is_null() {
        return LowpyStatus::InvalidArgument as i32;
    }
    let arc = match lookup(handle) {
        Some(arc) => arc,
        None => return LowpyStatus::InvalidHandle as i32,
    };
    let buffer = ffi_lock!(arc);
    match buffer.read::<T>(offset) {
        Ok(value) => {
            // SAFETY: out is non-null and points to a valid, aligned T per caller contract.
            unsafe { *out = value };
            LowpyStatus::Ok as i32
        }
        Err(e) => report(&e),
    }
}

fn write_scalar<T: Pod>(handle: u64, value: T, offset: usize) -> i32 {
    let arc = match lookup(handle) {
        Some(arc) => arc,
        None => return LowpyStatus::InvalidHandle as i32,
    };
    let mut buffer = ffi_lock!(arc);
    match buffer.write(value, offset) {
        Ok(()) => LowpyStatus::Ok as i32,
        Err(e) => report(&e),
    }
}

/// Read a 32-bit signed integer at `offset` into `*out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_read_i32(handle: u64, offset: usize, out: *mut i32) -> i32 {
    ffi_guard!({ read_scalar(handle, offset, out) })
}

/// Read a 32-bit float at `offset` into `*out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_read_f32(handle: u64, offset: usize, out: *mut f32) -> i32 {
    ffi_guard!({ read_scalar(handle, offset, out) })
}

/// Read a 64-bit float at `offset` into `*out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_read_f64(handle: u64, offset: usize, out: *mut f64) -> i32 {
    ffi_guard!({ read_scalar(handle, offset, out) })
}

/// Read a single byte at `offset` into `*out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_read_u8(handle: u64, offset: usize, out: *mut u8) -> i32 {
    ffi_guard!({ read_scalar(handle, offset, out) })
}

/// Write a 32-bit signed integer at `offset`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_write_i32(handle: u64, value: i32, offset: usize) -> i32 {
    ffi_guard!({ write_scalar(handle, value, offset) })
}

/// Write a 32-bit float at `offset`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_write_f32(handle: u64, value: f32, offset: usize) -> i32 {
    ffi_guard!({ write_scalar(handle, value, offset) })
}

/// Write a 64-bit float at `offset`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_write_f64(handle: u64, value: f64, offset: usize) -> i32 {
    ffi_guard!({ write_scalar(handle, value, offset) })
}

/// Write a single byte at `offset`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_write_u8(handle: u64, value: u8, offset: usize) -> i32 {
    ffi_guard!({ write_scalar(handle, value, offset) })
}

/// Copy `num_bytes` bytes starting at `offset` into `dest`.
///
/// `dest` may be null only when `num_bytes == 0`. Nothing is written to
/// `dest` if the range is out of bounds.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_read_raw(
    handle: u64,
    dest: *mut u8,
    offset: usize,
    num_bytes: usize,
) -> i32 {
    ffi_guard!({
        if dest.is_null() && num_bytes > 0 {
            return LowpyStatus::InvalidArgument as i32;
        }
        let arc = match lookup(handle) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        let buffer = ffi_lock!(arc);
        let dest: &mut [u8] = if num_bytes == 0 {
            &mut []
        } else {
            // SAFETY: dest points to num_bytes writable bytes per caller contract
            // and cannot alias buffer storage, which is never exposed.
            unsafe { std::slice::from_raw_parts_mut(dest, num_bytes) }
        };
        match buffer.read_raw(dest, offset) {
            Ok(()) => LowpyStatus::Ok as i32,
            Err(e) => report(&e),
        }
    })
}

/// Copy `num_bytes` bytes from `src` into the buffer starting at `offset`.
///
/// `src` may be null only when `num_bytes == 0`. The buffer is unchanged
/// if the range is out of bounds.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_write_raw(
    handle: u64,
    src: *const u8,
    offset: usize,
    num_bytes: usize,
) -> i32 {
    ffi_guard!({
        if src.is_null() && num_bytes > 0 {
            return LowpyStatus::InvalidArgument as i32;
        }
        let arc = match lookup(handle) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        let mut buffer = ffi_lock!(arc);
        let src: &[u8] = if num_bytes == 0 {
            &[]
        } else {
            // SAFETY: src points to num_bytes readable bytes per caller contract.
            unsafe { std::slice::from_raw_parts(src, num_bytes) }
        };
        match buffer.write_raw(src, offset) {
            Ok(()) => LowpyStatus::Ok as i32,
            Err(e) => report(&e),
        }
    })
}
