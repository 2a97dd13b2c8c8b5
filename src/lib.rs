// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Rust-accelerated sensitive word filter for MCP Gateway
// Pure Rust core; PyO3 bindings behind the `python` feature

// Allow non-local definitions for PyO3 macros (known issue with PyO3 0.20.x)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod sensitive_words;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module: sensitive_words_rust
///
/// Sensitive word detection, replacement and highlighting with a word list
/// that can be reloaded at runtime without interrupting callers.
///
/// # Examples
///
/// ```python
/// from sensitive_words_rust import SensitiveWordFilterRust
///
/// # Create filter with configuration
/// config = {
///     "words_file": "/etc/gateway/sensitive_words.txt",
///     "auto_reload": True,
///     "reload_interval": 5000,
/// }
/// words = SensitiveWordFilterRust(config)
///
/// # Detect sensitive words
/// words.check("This has badword")  # {"status": "detected", "words": ["badword"], "count": 1}
///
/// # Mask them
/// words.replace("This is badword")  # "This is ***"
/// ```
#[cfg(feature = "python")]
#[pymodule]
fn sensitive_words_rust(m: &Bound<'_, pyo3::types::PyModule>) -> PyResult<()> {
    // Route Rust `log` records into Python logging; a logger may already be set
    let _ = pyo3_log::try_init();

    m.add_class::<sensitive_words::python::SensitiveWordFilterRust>()?;

    // Module metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add(
        "__doc__",
        "High-performance sensitive word detection with hot reload",
    )?;

    Ok(())
}
