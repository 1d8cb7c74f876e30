//! C FFI bindings for the lowpy raw memory buffer.
//!
//! Exposes a C-compatible API for language bindings. Buffers live in a
//! global handle table and are addressed by opaque `u64` handles; every
//! entry point returns a [`LowpyStatus`] code and never unwinds into the
//! caller. This is the only crate in the workspace that contains `unsafe`
//! code besides the Python extension.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::cell::RefCell;
use std::ffi::c_char;

use lowpy_core::BufferError;

thread_local! {
    /// Message of the most recent panic caught by `ffi_guard!` on this thread.
    pub(crate) static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };

    /// Message of the most recent buffer error reported on this thread.
    pub(crate) static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Run an FFI body, converting any panic into `LowpyStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::LowpyStatus::Panicked as i32, $body)
    };
}

/// Run an FFI body, returning `$fallback` if it panics.
macro_rules! ffi_guard_or {
    ($fallback:expr, $body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(payload) => {
                $crate::record_panic(payload.as_ref());
                $fallback
            }
        }
    };
}

/// Lock a mutex, returning `InternalError` from the enclosing closure if poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::LowpyStatus::InternalError as i32,
        }
    };
}

mod access;
mod buffer;
mod registry;
mod status;

pub use access::{
    lowpy_buffer_read_f32, lowpy_buffer_read_f64, lowpy_buffer_read_i32, lowpy_buffer_read_raw,
    lowpy_buffer_read_u8, lowpy_buffer_write_f32, lowpy_buffer_write_f64, lowpy_buffer_write_i32,
    lowpy_buffer_write_raw, lowpy_buffer_write_u8,
};
pub use buffer::{
    lowpy_buffer_allocate, lowpy_buffer_copy, lowpy_buffer_create, lowpy_buffer_create_sized,
    lowpy_buffer_create_with_config, lowpy_buffer_deallocate, lowpy_buffer_destroy,
    lowpy_buffer_reallocate, lowpy_buffer_size, lowpy_buffer_size_get, LowpyBufferConfig,
};
pub use status::LowpyStatus;

pub(crate) fn record_panic(payload: &(dyn std::any::Any + Send)) {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    log::error!("panic caught at FFI boundary: {msg}");
    LAST_PANIC.with(|cell| *cell.borrow_mut() = msg);
}

/// Store the message of `err` for [`lowpy_last_error_message`] and return
/// the matching status code.
pub(crate) fn report<E>(err: &E) -> i32
where
    E: std::fmt::Display,
    for<'a> LowpyStatus: From<&'a E>,
{
    LAST_ERROR.with(|cell| *cell.borrow_mut() = err.to_string());
    LowpyStatus::from(err) as i32
}

/// Copy `msg` into a caller buffer: at most `cap - 1` bytes plus a NUL.
///
/// Returns the full message length so callers can size a second call.
#[allow(unsafe_code)]
fn copy_message(msg: &str, buf: *mut c_char, cap: usize) -> i32 {
    let bytes = msg.as_bytes();
    if !buf.is_null() && cap > 0 {
        let n = bytes.len().min(cap - 1);
        // SAFETY: buf points to at least `cap` writable bytes per caller contract,
        // and n + 1 <= cap.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf as *mut u8, n);
            *buf.add(n) = 0;
        }
    }
    i32::try_from(bytes.len()).unwrap_or(i32::MAX)
}

/// Retrieve the message of the most recent panic caught on this thread.
///
/// Pass a null `buf` to query the length. Returns the full message length
/// (0 if no panic has been recorded); copies at most `cap - 1` bytes and
/// NUL-terminates.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_last_panic_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_PANIC.with(|cell| copy_message(&cell.borrow(), buf, cap))
}

/// Retrieve the message of the most recent buffer error on this thread.
///
/// Same calling convention as [`lowpy_last_panic_message`]. The message is
/// kept until the next error, so only read it right after a failing call.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_last_error_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_ERROR.with(|cell| copy_message(&cell.borrow(), buf, cap))
}
