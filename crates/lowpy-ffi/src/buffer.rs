//! Buffer lifecycle FFI: create, allocate, reallocate, deallocate, copy, destroy.
//!
//! Each buffer sits behind its own mutex in the handle registry,
//! so host threads working on different buffers never contend on the same
//! lock beyond the handle lookup.

use lowpy_core::{Buffer, BufferConfig};

use crate::registry::{lookup, registry};
use crate::report;
use crate::status::LowpyStatus;

/// C-compatible buffer configuration.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LowpyBufferConfig {
    /// Largest length in bytes the buffer may reach.
    pub max_bytes: usize,
}

impl Default for LowpyBufferConfig {
    fn default() -> Self {
        Self {
            max_bytes: BufferConfig::default().max_bytes,
        }
    }
}

/// Register `buffer` and write its handle to `out`.
///
/// Fails with `AllocationFailed` if the registry has no slot index left.
#[allow(unsafe_code)]
fn register(buffer: Buffer, out: *mut u64) -> i32 {
    let handle = match ffi_lock!(registry()).insert(buffer) {
        Some(handle) => handle,
        None => return LowpyStatus::AllocationFailed as i32,
    };
    // SAFETY: out is non-null (checked by every caller) and valid per caller contract.
    unsafe { *out = handle };
    LowpyStatus::Ok as i32
}

/// Create an empty buffer with no storage. Returns the handle via `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_create(out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return LowpyStatus::InvalidArgument as i32;
        }
        register(Buffer::new(), out)
    })
}

/// Create a buffer with `size` bytes allocated. Returns the handle via `out`.
///
/// `out` is not written if the allocation fails.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_create_sized(size: usize, out: *mut u64) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return LowpyStatus::InvalidArgument as i32;
        }
        match Buffer::with_size(size) {
            Ok(buffer) => register(buffer, out),
            Err(e) => report(&e),
        }
    })
}

/// Create a buffer governed by `config`, with `initial_size` bytes allocated
/// (0 for an empty buffer). Returns the handle via `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_create_with_config(
    config: *const LowpyBufferConfig,
    initial_size: usize,
    out: *mut u64,
) -> i32 {
    ffi_guard!({
        if config.is_null() || out.is_null() {
            return LowpyStatus::InvalidArgument as i32;
        }
        // SAFETY: config points to a valid LowpyBufferConfig per caller contract.
        let config = unsafe { *config };
        let mut buffer = match Buffer::with_config(BufferConfig::new(config.max_bytes)) {
            Ok(b) => b,
            Err(e) => return report(&e),
        };
        if initial_size > 0 {
            if let Err(e) = buffer.allocate(initial_size) {
                return report(&e);
            }
        }
        register(buffer, out)
    })
}

/// Destroy a buffer, releasing its storage. Destroying twice returns
/// `InvalidHandle` and is otherwise harmless.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(registry()).remove(handle) {
            Some(_) => LowpyStatus::Ok as i32,
            None => LowpyStatus::InvalidHandle as i32,
        }
    })
}

/// Replace the buffer's storage with a fresh region of `bytes` bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_allocate(handle: u64, bytes: usize) -> i32 {
    ffi_guard!({
        let arc = match lookup(handle) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        let mut buffer = ffi_lock!(arc);
        match buffer.allocate(bytes) {
            Ok(()) => LowpyStatus::Ok as i32,
            Err(e) => report(&e),
        }
    })
}

/// Grow the buffer by `additional_bytes`, preserving its contents.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_reallocate(handle: u64, additional_bytes: usize) -> i32 {
    ffi_guard!({
        let arc = match lookup(handle) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        let mut buffer = ffi_lock!(arc);
        match buffer.reallocate(additional_bytes) {
            Ok(()) => LowpyStatus::Ok as i32,
            Err(e) => report(&e),
        }
    })
}

/// Release the buffer's storage; the handle stays valid with size 0.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_deallocate(handle: u64) -> i32 {
    ffi_guard!({
        let arc = match lookup(handle) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        ffi_lock!(arc).deallocate();
        LowpyStatus::Ok as i32
    })
}

/// Make `target` an independent copy of `source`.
///
/// Both buffers are locked in handle order. Copying a buffer onto itself
/// succeeds without changing it.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_copy(source: u64, target: u64) -> i32 {
    ffi_guard!({
        let source_arc = match lookup(source) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        if source == target {
            return LowpyStatus::Ok as i32;
        }
        let target_arc = match lookup(target) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };

        let source_first = source < target;
        let (first, second) = if source_first {
            (&source_arc, &target_arc)
        } else {
            (&target_arc, &source_arc)
        };
        let mut first = ffi_lock!(first);
        let mut second = ffi_lock!(second);
        let result = if source_first {
            first.copy_into(&mut second)
        } else {
            second.copy_into(&mut first)
        };
        match result {
            Ok(()) => LowpyStatus::Ok as i32,
            Err(e) => report(&e),
        }
    })
}

/// Current buffer length in bytes.
///
/// **Ambiguity warning:** returns 0 for both "empty" and "invalid handle."
/// Prefer [`lowpy_buffer_size_get`] for unambiguous error detection.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_size(handle: u64) -> usize {
    ffi_guard_or!(0, {
        lookup(handle)
            .and_then(|arc| arc.lock().ok().map(|b| b.len()))
            .unwrap_or(0)
    })
}

/// Current buffer length with explicit error reporting.
///
/// Writes the length to `*out` and returns `LOWPY_OK`. Returns
/// `InvalidHandle` or `InternalError` without writing to `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn lowpy_buffer_size_get(handle: u64, out: *mut usize) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return LowpyStatus::InvalidArgument as i32;
        }
        let arc = match lookup(handle) {
            Some(arc) => arc,
            None => return LowpyStatus::InvalidHandle as i32,
        };
        let len = ffi_lock!(arc).len();
        // SAFETY: out is non-null and valid per caller contract.
        unsafe { *out = len };
        LowpyStatus::Ok as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{lowpy_buffer_read_u8, lowpy_buffer_write_raw};

    fn create_sized(size: usize) -> u64 {
        let mut h = 0u64;
        assert_eq!(
            lowpy_buffer_create_sized(size, &mut h),
            LowpyStatus::Ok as i32
        );
        h
    }

    fn contents(h: u64) -> Vec<u8> {
        let arc = lookup(h).expect("live handle");
        let bytes = arc.lock().unwrap().to_vec();
        bytes
    }

    #[test]
    fn create_and_destroy() {
        let mut h = 0u64;
        assert_eq!(lowpy_buffer_create(&mut h), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(h), 0);
        assert_eq!(lowpy_buffer_destroy(h), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_destroy(h), LowpyStatus::InvalidHandle as i32);
    }

    #[test]
    fn create_with_null_out_is_invalid_argument() {
        assert_eq!(
            lowpy_buffer_create(std::ptr::null_mut()),
            LowpyStatus::InvalidArgument as i32
        );
        assert_eq!(
            lowpy_buffer_create_sized(8, std::ptr::null_mut()),
            LowpyStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn sized_create_reports_size() {
        let h = create_sized(24);
        let mut size = 0usize;
        assert_eq!(lowpy_buffer_size_get(h, &mut size), LowpyStatus::Ok as i32);
        assert_eq!(size, 24);
        lowpy_buffer_destroy(h);
    }

    #[test]
    fn destroyed_handle_is_rejected_everywhere() {
        let h = create_sized(8);
        lowpy_buffer_destroy(h);

        let mut size = 77usize;
        assert_eq!(
            lowpy_buffer_size_get(h, &mut size),
            LowpyStatus::InvalidHandle as i32
        );
        assert_eq!(size, 77, "out must not be written on error");
        assert_eq!(lowpy_buffer_size(h), 0);
        assert_eq!(
            lowpy_buffer_allocate(h, 4),
            LowpyStatus::InvalidHandle as i32
        );
        assert_eq!(
            lowpy_buffer_reallocate(h, 4),
            LowpyStatus::InvalidHandle as i32
        );
        assert_eq!(
            lowpy_buffer_deallocate(h),
            LowpyStatus::InvalidHandle as i32
        );
        assert!(lookup(h).is_none());
    }

    #[test]
    fn allocate_reallocate_deallocate_cycle() {
        let h = create_sized(0);
        assert_eq!(lowpy_buffer_allocate(h, 16), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(h), 16);
        assert_eq!(lowpy_buffer_allocate(h, 4), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(h), 4);
        assert_eq!(lowpy_buffer_reallocate(h, 6), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(h), 10);
        assert_eq!(lowpy_buffer_deallocate(h), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_deallocate(h), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(h), 0);
        lowpy_buffer_destroy(h);
    }

    #[test]
    fn config_limit_surfaces_as_allocation_failed() {
        let config = LowpyBufferConfig { max_bytes: 8 };
        let mut h = 0u64;
        assert_eq!(
            lowpy_buffer_create_with_config(&config, 8, &mut h),
            LowpyStatus::Ok as i32
        );
        assert_eq!(
            lowpy_buffer_reallocate(h, 1),
            LowpyStatus::AllocationFailed as i32
        );
        assert_eq!(lowpy_buffer_size(h), 8);

        let mut buf = [0u8; 128];
        let len = crate::lowpy_last_error_message(buf.as_mut_ptr() as *mut _, buf.len());
        let msg = std::str::from_utf8(&buf[..len as usize]).unwrap();
        assert!(msg.contains("exceeds limit of 8 bytes"), "got: {msg:?}");
        lowpy_buffer_destroy(h);
    }

    #[test]
    fn oversized_initial_size_does_not_write_out() {
        let config = LowpyBufferConfig { max_bytes: 4 };
        let mut h = 12345u64;
        assert_eq!(
            lowpy_buffer_create_with_config(&config, 5, &mut h),
            LowpyStatus::AllocationFailed as i32
        );
        assert_eq!(h, 12345);
    }

    #[test]
    fn invalid_config_is_config_error() {
        let config = LowpyBufferConfig {
            max_bytes: usize::MAX,
        };
        let mut h = 0u64;
        assert_eq!(
            lowpy_buffer_create_with_config(&config, 0, &mut h),
            LowpyStatus::ConfigError as i32
        );
        assert_eq!(
            lowpy_buffer_create_with_config(std::ptr::null(), 0, &mut h),
            LowpyStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn copy_makes_independent_target() {
        let src = create_sized(4);
        assert_eq!(
            lowpy_buffer_write_raw(src, [1u8, 2, 3, 4].as_ptr(), 0, 4),
            LowpyStatus::Ok as i32
        );
        let dst = create_sized(100);
        assert_eq!(lowpy_buffer_copy(src, dst), LowpyStatus::Ok as i32);
        assert_eq!(contents(dst), vec![1, 2, 3, 4]);

        lowpy_buffer_write_raw(src, [9u8].as_ptr(), 0, 1);
        let mut first = 0u8;
        lowpy_buffer_read_u8(dst, 0, &mut first);
        assert_eq!(first, 1);

        lowpy_buffer_destroy(src);
        lowpy_buffer_destroy(dst);
    }

    #[test]
    fn copy_works_in_either_handle_order() {
        let a = create_sized(2);
        let b = create_sized(6);
        assert_eq!(lowpy_buffer_copy(b, a), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(a), 6);
        assert_eq!(lowpy_buffer_allocate(a, 3), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_copy(a, b), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(b), 3);
        lowpy_buffer_destroy(a);
        lowpy_buffer_destroy(b);
    }

    #[test]
    fn copy_from_empty_empties_target() {
        let mut src = 0u64;
        lowpy_buffer_create(&mut src);
        let dst = create_sized(100);
        assert_eq!(lowpy_buffer_copy(src, dst), LowpyStatus::Ok as i32);
        assert_eq!(lowpy_buffer_size(dst), 0);
        lowpy_buffer_destroy(src);
        lowpy_buffer_destroy(dst);
    }

    #[test]
    fn self_copy_is_noop() {
        let h = create_sized(3);
        lowpy_buffer_write_raw(h, [7u8, 8, 9].as_ptr(), 0, 3);
        assert_eq!(lowpy_buffer_copy(h, h), LowpyStatus::Ok as i32);
        assert_eq!(contents(h), vec![7, 8, 9]);
        lowpy_buffer_destroy(h);
    }

    #[test]
    fn copy_with_stale_handle_is_rejected() {
        let live = create_sized(3);
        let stale = create_sized(3);
        lowpy_buffer_destroy(stale);
        assert_eq!(
            lowpy_buffer_copy(live, stale),
            LowpyStatus::InvalidHandle as i32
        );
        assert_eq!(
            lowpy_buffer_copy(stale, live),
            LowpyStatus::InvalidHandle as i32
        );
        assert_eq!(lowpy_buffer_size(live), 3);
        lowpy_buffer_destroy(live);
    }

    #[test]
    fn poisoned_buffer_reports_internal_error() {
        let h = create_sized(4);
        let arc = lookup(h).unwrap();
        let poisoner = std::thread::spawn(move || {
            let _guard = arc.lock().unwrap();
            panic!("poison the buffer mutex");
        });
        assert!(poisoner.join().is_err());

        assert_eq!(
            lowpy_buffer_allocate(h, 8),
            LowpyStatus::InternalError as i32
        );
        assert_eq!(lowpy_buffer_size(h), 0);
        // Removal does not lock the buffer itself.
        assert_eq!(lowpy_buffer_destroy(h), LowpyStatus::Ok as i32);
    }
}
