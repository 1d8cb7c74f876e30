//! Python bindings for the lowpy raw memory buffer.
//!
//! This crate provides PyO3 bindings wrapping the C FFI layer (`lowpy-ffi`).
//! The native extension is named `_lowpy` and exposes `MemoryPtr` plus the
//! `copy_memory_pointer` helper.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![allow(unsafe_code)]

use pyo3::prelude::*;

mod error;
mod memory;

/// The native `_lowpy` extension module.
#[pymodule]
fn _lowpy(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add(
        "__doc__",
        "LowPy provides low level access to native memory from Python in a memory safe way.",
    )?;

    // Core classes
    m.add_class::<memory::MemoryPtr>()?;

    // Functions
    m.add_function(wrap_pyfunction!(memory::copy_memory_pointer, m)?)?;

    Ok(())
}
