//! MemoryPtr: Python wrapper around an FFI buffer handle.
//!
//! All FFI calls release the GIL via `py.detach()` so other Python threads
//! keep running while a large copy is in progress. Raw pointers cross the
//! closure boundary as `usize` so the closures stay `Ungil`.

use numpy::{PyArray1, PyArrayMethods, PyReadonlyArray1, PyUntypedArrayMethods};
use pyo3::exceptions::{PyIndexError, PyMemoryError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use lowpy_ffi::{
    lowpy_buffer_allocate, lowpy_buffer_copy, lowpy_buffer_create, lowpy_buffer_create_sized,
    lowpy_buffer_create_with_config, lowpy_buffer_deallocate, lowpy_buffer_destroy,
    lowpy_buffer_read_f32, lowpy_buffer_read_f64, lowpy_buffer_read_i32, lowpy_buffer_read_raw,
    lowpy_buffer_read_u8, lowpy_buffer_reallocate, lowpy_buffer_size_get, lowpy_buffer_write_f32,
    lowpy_buffer_write_f64, lowpy_buffer_write_i32, lowpy_buffer_write_raw, lowpy_buffer_write_u8,
    LowpyBufferConfig,
};

use crate::error::{check_status, format_error};

/// A pointer to a block of native memory.
///
/// Reads and writes take explicit byte offsets and are bounds-checked;
/// out-of-range accesses raise `IndexError` and change nothing.
#[pyclass(module = "lowpy._lowpy")]
pub(crate) struct MemoryPtr {
    handle: Option<u64>,
}

#[pymethods]
impl MemoryPtr {
    /// Create a new pointer.
    ///
    /// Args:
    ///     bytes: How many bytes to allocate immediately. Defaults to 0.
    ///     max_bytes: Optional upper bound on the pointer's size.
    #[new]
    #[pyo3(signature = (bytes=0, max_bytes=None))]
    fn new(py: Python<'_>, bytes: usize, max_bytes: Option<usize>) -> PyResult<Self> {
        let (status, handle) = py.detach(|| {
            let mut h: u64 = 0;
            let s = match max_bytes {
                Some(max_bytes) => {
                    let config = LowpyBufferConfig { max_bytes };
                    lowpy_buffer_create_with_config(&config, bytes, &mut h)
                }
                None if bytes == 0 => lowpy_buffer_create(&mut h),
                None => lowpy_buffer_create_sized(bytes, &mut h),
            };
            (s, h)
        });
        check_status(status)?;
        Ok(MemoryPtr {
            handle: Some(handle),
        })
    }

    /// Current size of the allocated memory in bytes.
    #[getter]
    fn size(&self, py: Python<'_>) -> PyResult<usize> {
        let h = self.require_handle()?;
        let (status, size) = py.detach(|| {
            let mut size: usize = 0;
            let s = lowpy_buffer_size_get(h, &mut size);
            (s, size)
        });
        check_status(status)?;
        Ok(size)
    }

    fn __len__(&self, py: Python<'_>) -> PyResult<usize> {
        self.size(py)
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        match self.handle {
            Some(_) => match self.size(py) {
                Ok(size) => format!("MemoryPtr(size={size})"),
                Err(_) => "MemoryPtr(<unavailable>)".to_string(),
            },
            None => "MemoryPtr(<destroyed>)".to_string(),
        }
    }

    // ── Memory management ───────────────────────────────────────

    /// Allocate a fresh block of `bytes` bytes, releasing any previous one.
    fn allocate(&self, py: Python<'_>, bytes: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        let status = py.detach(|| lowpy_buffer_allocate(h, bytes));
        check_status(status)
    }

    /// Grow the allocated memory by `bytes`, keeping existing contents.
    fn reallocate(&self, py: Python<'_>, bytes: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        let status = py.detach(|| lowpy_buffer_reallocate(h, bytes));
        check_status(status)
    }

    /// Free all memory the pointer holds. Safe to call repeatedly.
    fn deallocate(&self, py: Python<'_>) -> PyResult<()> {
        let h = self.require_handle()?;
        let status = py.detach(|| lowpy_buffer_deallocate(h));
        check_status(status)
    }

    /// Make `target` an independent copy of this pointer's memory.
    fn copy(&self, py: Python<'_>, target: PyRef<'_, MemoryPtr>) -> PyResult<()> {
        let source = self.require_handle()?;
        let target = target.require_handle()?;
        let status = py.detach(|| lowpy_buffer_copy(source, target));
        check_status(status)
    }

    // ── Typed writes ────────────────────────────────────────────

    /// Store a 32-bit signed integer at `offset`.
    #[pyo3(signature = (value, offset=0))]
    fn write_int(&self, py: Python<'_>, value: i32, offset: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        check_status(py.detach(|| lowpy_buffer_write_i32(h, value, offset)))
    }

    /// Store a 32-bit float at `offset`.
    #[pyo3(signature = (value, offset=0))]
    fn write_float(&self, py: Python<'_>, value: f32, offset: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        check_status(py.detach(|| lowpy_buffer_write_f32(h, value, offset)))
    }

    /// Store a 64-bit float at `offset`.
    #[pyo3(signature = (value, offset=0))]
    fn write_double(&self, py: Python<'_>, value: f64, offset: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        check_status(py.detach(|| lowpy_buffer_write_f64(h, value, offset)))
    }

    /// Store a single Latin-1 character as one byte at `offset`.
    #[pyo3(signature = (value, offset=0))]
    fn write_char(&self, py: Python<'_>, value: char, offset: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        let byte = char_to_byte(value)?;
        check_status(py.detach(|| lowpy_buffer_write_u8(h, byte, offset)))
    }

    /// Copy `data` into memory starting at `offset`.
    #[pyo3(signature = (data, offset=0))]
    fn write_bytes(&self, py: Python<'_>, data: &[u8], offset: usize) -> PyResult<()> {
        let h = self.require_handle()?;
        let (addr, len) = (data.as_ptr() as usize, data.len());
        let status = py.detach(|| lowpy_buffer_write_raw(h, addr as *const u8, offset, len));
        check_status(status)
    }

    /// Alias of `write_bytes`.
    #[pyo3(signature = (value, offset=0))]
    fn write_byte(&self, py: Python<'_>, value: &[u8], offset: usize) -> PyResult<()> {
        self.write_bytes(py, value, offset)
    }

    /// Copy a contiguous NumPy `uint8` array into memory starting at `offset`.
    #[pyo3(signature = (data, offset=0))]
    fn write_from(
        &self,
        py: Python<'_>,
        data: PyReadonlyArray1<'_, u8>,
        offset: usize,
    ) -> PyResult<()> {
        let h = self.require_handle()?;
        let slice = data.as_slice()?;
        let (addr, len) = (slice.as_ptr() as usize, slice.len());
        let status = py.detach(|| lowpy_buffer_write_raw(h, addr as *const u8, offset, len));
        check_status(status)
    }

    // ── Typed reads ─────────────────────────────────────────────

    /// Read the 4 bytes at `offset` as a 32-bit signed integer.
    #[pyo3(signature = (offset=0))]
    fn read_int(&self, py: Python<'_>, offset: usize) -> PyResult<i32> {
        let h = self.require_handle()?;
        let (status, value) = py.detach(|| {
            let mut v: i32 = 0;
            (lowpy_buffer_read_i32(h, offset, &mut v), v)
        });
        check_status(status)?;
        Ok(value)
    }

    /// Read the 4 bytes at `offset` as a 32-bit float.
    #[pyo3(signature = (offset=0))]
    fn read_float(&self, py: Python<'_>, offset: usize) -> PyResult<f32> {
        let h = self.require_handle()?;
        let (status, value) = py.detach(|| {
            let mut v: f32 = 0.0;
            (lowpy_buffer_read_f32(h, offset, &mut v), v)
        });
        check_status(status)?;
        Ok(value)
    }

    /// Read the 8 bytes at `offset` as a 64-bit float.
    #[pyo3(signature = (offset=0))]
    fn read_double(&self, py: Python<'_>, offset: usize) -> PyResult<f64> {
        let h = self.require_handle()?;
        let (status, value) = py.detach(|| {
            let mut v: f64 = 0.0;
            (lowpy_buffer_read_f64(h, offset, &mut v), v)
        });
        check_status(status)?;
        Ok(value)
    }

    /// Read the byte at `offset` as a single Latin-1 character.
    #[pyo3(signature = (offset=0))]
    fn read_char(&self, py: Python<'_>, offset: usize) -> PyResult<char> {
        let h = self.require_handle()?;
        let (status, value) = py.detach(|| {
            let mut v: u8 = 0;
            (lowpy_buffer_read_u8(h, offset, &mut v), v)
        });
        check_status(status)?;
        Ok(latin1_char(value))
    }

    /// Read `amount` bytes starting at `offset` into a new `bytes` object.
    ///
    /// The range is checked against the current size before any output
    /// storage is reserved, so an out-of-range request raises `IndexError`
    /// however large `amount` is.
    #[pyo3(signature = (amount, offset=0))]
    fn read_bytes<'py>(
        &self,
        py: Python<'py>,
        amount: usize,
        offset: usize,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let size = self.size(py)?;
        if let Some(detail) = out_of_range(offset, amount, size) {
            return Err(PyIndexError::new_err(format_error(-4, Some(&detail))));
        }
        let h = self.require_handle()?;
        let mut out: Vec<u8> = Vec::new();
        out.try_reserve_exact(amount).map_err(|_| {
            PyMemoryError::new_err(format!("cannot allocate {amount} bytes for read_bytes"))
        })?;
        out.resize(amount, 0);
        let addr = out.as_mut_ptr() as usize;
        let status = py.detach(|| lowpy_buffer_read_raw(h, addr as *mut u8, offset, amount));
        check_status(status)?;
        Ok(PyBytes::new(py, &out))
    }

    /// Fill a pre-allocated **C-contiguous** NumPy `uint8` array with the
    /// bytes starting at `offset`.
    ///
    /// Raises:
    ///     ValueError: If `out` is not C-contiguous.
    #[allow(unsafe_code)]
    #[pyo3(signature = (out, offset=0))]
    fn read_into<'py>(
        &self,
        py: Python<'py>,
        out: &Bound<'py, PyArray1<u8>>,
        offset: usize,
    ) -> PyResult<()> {
        let h = self.require_handle()?;
        if !out.is_c_contiguous() {
            return Err(PyValueError::new_err("output array must be C-contiguous"));
        }
        let addr = unsafe { out.as_array_mut().as_mut_ptr() } as usize;
        let len = out.len();
        let status = py.detach(|| lowpy_buffer_read_raw(h, addr as *mut u8, offset, len));
        check_status(status)
    }

    // ── Lifetime ────────────────────────────────────────────────

    /// Explicitly destroy the pointer, releasing its memory.
    fn destroy(&mut self, py: Python<'_>) {
        self.do_destroy_with_gil(py);
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    #[pyo3(signature = (_exc_type=None, _exc_val=None, _exc_tb=None))]
    fn __exit__(
        &mut self,
        py: Python<'_>,
        _exc_type: Option<&Bound<'_, PyAny>>,
        _exc_val: Option<&Bound<'_, PyAny>>,
        _exc_tb: Option<&Bound<'_, PyAny>>,
    ) {
        self.do_destroy_with_gil(py);
    }
}

impl MemoryPtr {
    fn require_handle(&self) -> PyResult<u64> {
        self.handle
            .ok_or_else(|| PyRuntimeError::new_err("MemoryPtr already destroyed"))
    }

    fn do_destroy_with_gil(&mut self, py: Python<'_>) {
        if let Some(h) = self.handle.take() {
            // Release GIL: lowpy_buffer_destroy locks BUFFERS.
            py.detach(|| lowpy_buffer_destroy(h));
        }
    }
}

impl Drop for MemoryPtr {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            // PyO3 Drop for #[pyclass] runs with GIL held.
            Python::attach(|py| {
                py.detach(|| lowpy_buffer_destroy(h));
            });
        }
    }
}

fn char_to_byte(value: char) -> PyResult<u8> {
    latin1_byte(value).ok_or_else(|| {
        PyValueError::new_err(format!(
            "write_char expects a Latin-1 character (code point < 256), got {value:?}"
        ))
    })
}

/// The single byte storing `value`, if it lies in the Latin-1 range.
fn latin1_byte(value: char) -> Option<u8> {
    u8::try_from(u32::from(value)).ok()
}

fn latin1_char(byte: u8) -> char {
    char::from(byte)
}

/// Describe why `amount` bytes at `offset` do not fit in `size` bytes, or
/// `None` if they do.
fn out_of_range(offset: usize, amount: usize, size: usize) -> Option<String> {
    match offset.checked_add(amount) {
        Some(end) if end <= size => None,
        _ => Some(format!(
            "memory access out of bounds: {amount} bytes at offset {offset}, buffer length {size}"
        )),
    }
}

/// Return a new pointer holding an independent copy of `source`'s memory.
#[pyfunction]
pub(crate) fn copy_memory_pointer(
    py: Python<'_>,
    source: PyRef<'_, MemoryPtr>,
) -> PyResult<MemoryPtr> {
    let source_h = source.require_handle()?;
    let copy = MemoryPtr::new(py, 0, None)?;
    let target_h = copy.require_handle()?;
    check_status(py.detach(|| lowpy_buffer_copy(source_h, target_h)))?;
    Ok(copy)
}
