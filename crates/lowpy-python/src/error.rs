//! LowpyStatus -> Python exception mapping with recovery hints.

use std::ffi::c_char;

use lowpy_ffi::{lowpy_last_error_message, lowpy_last_panic_message};
use pyo3::exceptions::{PyIndexError, PyMemoryError, PyRuntimeError, PyValueError};
use pyo3::PyResult;

/// Check an FFI status code. Returns `Ok(())` on success, raises a typed
/// Python exception carrying the failure kind, the core's message, and a
/// recovery hint on error.
///
/// Must run on the thread that made the failing FFI call, since the
/// detailed messages are kept thread-locally.
pub(crate) fn check_status(code: i32) -> PyResult<()> {
    if code == 0 {
        return Ok(());
    }
    let full = format_error(code, fetch_detail(code).as_deref());
    match code {
        // Bounds violations mirror Python sequence semantics.
        -4 => Err(PyIndexError::new_err(full)),

        // Allocation failure or configured limit → MemoryError
        -3 => Err(PyMemoryError::new_err(full)),

        // Caller's fault → ValueError
        -2 | -5 => Err(PyValueError::new_err(full)),

        // Everything else → RuntimeError
        _ => Err(PyRuntimeError::new_err(full)),
    }
}

/// Render the exception text for `code`: kind, optional detail, hint.
pub(crate) fn format_error(code: i32, detail: Option<&str>) -> String {
    let (kind, hint) = error_detail(code);
    match detail {
        Some(detail) => format!("lowpy error {code} ({kind}): {detail}\n  Hint: {hint}"),
        None => format!("lowpy error {code} ({kind})\n  Hint: {hint}"),
    }
}

/// Pull the thread-local message recorded by the FFI layer for `code`.
fn fetch_detail(code: i32) -> Option<String> {
    let reader: extern "C" fn(*mut c_char, usize) -> i32 = match code {
        -3 | -4 | -5 => lowpy_last_error_message,
        -128 => lowpy_last_panic_message,
        _ => return None,
    };
    let len = reader(std::ptr::null_mut(), 0);
    if len <= 0 {
        return None;
    }
    let mut buf = vec![0u8; len as usize + 1];
    let written = reader(buf.as_mut_ptr() as *mut c_char, buf.len());
    buf.truncate(written.max(0) as usize);
    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// Returns `(kind, recovery_hint)` for each FFI status code.
fn error_detail(code: i32) -> (&'static str, &'static str) {
    match code {
        -1 => (
            "invalid handle",
            "The MemoryPtr has been destroyed. Don't call .destroy() and then \
             continue using the object. If using a context manager, access is \
             only valid inside the `with` block.",
        ),
        -2 => (
            "invalid argument",
            "An argument was null or out of range. Check that arrays passed to \
             read_into()/write_from() are C-contiguous uint8 arrays.",
        ),
        -3 => (
            "allocation error",
            "The requested memory could not be provided. Request fewer bytes, \
             or raise max_bytes if the pointer was created with a limit.",
        ),
        -4 => (
            "out of bounds",
            "The access does not fit inside the allocated memory. Check that \
             offset + width <= size, and grow the pointer with reallocate() \
             before writing past its end.",
        ),
        -5 => (
            "configuration error",
            "max_bytes must not exceed the largest possible allocation \
             (sys.maxsize).",
        ),
        -6 => (
            "internal error",
            "A previous operation on this pointer panicked and left it in an \
             unusable state. Destroy it and create a new MemoryPtr.",
        ),
        -128 => (
            "panic",
            "A Rust panic was caught at the FFI boundary. This is a bug in \
             lowpy; please report it with the message above.",
        ),
        _ => (
            "unknown lowpy error",
            "An unrecognized error code was returned from the FFI layer. \
             This may indicate a version mismatch between the Python \
             bindings and the native library.",
        ),
    }
}
