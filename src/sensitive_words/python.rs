// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// PyO3 bindings for the sensitive word filter

use log::warn;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::time::UNIX_EPOCH;

use super::config::{ConfigLayer, FilterConfig, RuntimeOptions};
use super::detector::SensitiveWordDetector;
use super::error::FilterError;
use super::masking::{Replacement, DEFAULT_REPLACEMENT};

fn to_py_err(err: FilterError) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

/// Convert a Python value into JSON; unsupported objects become their `str()`
fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool before int: Python bools are ints
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if obj.downcast::<PyInt>().is_ok() {
        if let Ok(n) = obj.extract::<i64>() {
            return Ok(Value::Number(n.into()));
        }
    }
    if let Ok(f) = obj.downcast::<PyFloat>() {
        return Ok(Number::from_f64(f.value())
            .map(Value::Number)
            .unwrap_or(Value::Null));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::String(s.to_str()?.to_string()));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list
            .iter()
            .map(|item| py_to_json(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut map = Map::new();
        for (key, value) in dict.iter() {
            map.insert(key.str()?.to_string(), py_to_json(&value)?);
        }
        return Ok(Value::Object(map));
    }
    Ok(Value::String(obj.str()?.to_string()))
}

fn json_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    Ok(match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(b) => PyBool::new(py, *b).to_owned().into_any(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into_pyobject(py)?.into_any(),
            None => n.as_f64().unwrap_or(0.0).into_pyobject(py)?.into_any(),
        },
        Value::String(s) => PyString::new(py, s).into_any(),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(json_to_py(py, item)?)?;
            }
            list.into_any()
        }
        Value::Object(map) => {
            let dict = PyDict::new(py);
            for (key, item) in map {
                dict.set_item(key, json_to_py(py, item)?)?;
            }
            dict.into_any()
        }
    })
}

fn serialize_to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<Py<PyAny>> {
    let json = serde_json::to_value(value)
        .map_err(|e| PyRuntimeError::new_err(format!("serialization failed: {}", e)))?;
    Ok(json_to_py(py, &json)?.unbind())
}

/// Wrap a Python callable as a per-match replacement
///
/// Errors raised by the callable are logged and the default replacement is
/// used, keeping query operations total.
fn callable_replacement(callable: Py<PyAny>) -> Replacement {
    Replacement::with(move |matched| {
        Python::attach(|py| {
            callable
                .call1(py, (matched,))
                .and_then(|result| result.extract::<String>(py))
                .unwrap_or_else(|err| {
                    warn!("replacement callback failed: {}", err);
                    DEFAULT_REPLACEMENT.to_string()
                })
        })
    })
}

fn extract_replacement(value: &Bound<'_, PyAny>) -> PyResult<Replacement> {
    if let Ok(text) = value.extract::<String>() {
        return Ok(Replacement::Fixed(text));
    }
    if value.is_callable() {
        return Ok(callable_replacement(value.clone().unbind()));
    }
    Err(pyo3::exceptions::PyTypeError::new_err(
        "replacement must be a str or a callable",
    ))
}

/// Sensitive word filter exposed to Python
///
/// # Example (Python)
/// ```python
/// from sensitive_words_rust import SensitiveWordFilterRust
///
/// words = SensitiveWordFilterRust({"words": ["badword", "evil"]})
/// words.check("This has badword")   # {"status": "detected", "words": ["badword"], "count": 1}
/// words.replace("This is badword")  # "This is ***"
/// words.highlight("BADWORD")        # "<mark>BADWORD</mark>"
/// words.add_words(["spam"])         # {"added": 1, "total": 3}
/// ```
#[pyclass]
pub struct SensitiveWordFilterRust {
    detector: SensitiveWordDetector,
}

#[pymethods]
impl SensitiveWordFilterRust {
    /// Create a filter
    ///
    /// # Configuration Keys
    /// * `words` (list[str]): Inline word list
    /// * `words_file` (str): Word file path, one word per line, `#` comments
    /// * `auto_reload` (bool): Poll the word file for changes
    /// * `reload_interval` (int): Poll interval in milliseconds (default 5000)
    /// * `case_sensitive` (bool): Match case exactly (default False)
    /// * `replacement` (str | callable): Replacement text or per-match function
    /// * `detection_mode` (str): "detect", "replace" or "highlight"
    /// * `cache_ttl` (int): Snapshot lifetime in seconds (default 3600)
    ///
    /// `SENSITIVE_WORDS_*` environment variables override the dict.
    #[new]
    #[pyo3(signature = (config_dict=None))]
    pub fn new(config_dict: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let mut runtime = RuntimeOptions::default();
        let app = match config_dict {
            Some(dict) => {
                let mut raw = py_to_json(dict.as_any())?;
                if let Some(value) = dict.get_item("replacement")? {
                    if !value.is_instance_of::<PyString>() && value.is_callable() {
                        runtime.replacement = Some(callable_replacement(value.unbind()));
                        if let Value::Object(map) = &mut raw {
                            map.remove("replacement");
                        }
                    }
                }
                Some(ConfigLayer::from_json(raw).map_err(to_py_err)?)
            }
            None => None,
        };

        let env = ConfigLayer::from_env();
        let config = FilterConfig::resolve(app.as_ref(), Some(&env), Some(&runtime));
        let detector = SensitiveWordDetector::new(config).map_err(to_py_err)?;
        Ok(Self { detector })
    }

    /// Returns {"status": "clean"} or {"status": "detected", "words": [...], "count": n}
    #[pyo3(signature = (text=None))]
    pub fn check(&self, py: Python<'_>, text: Option<&str>) -> PyResult<Py<PyAny>> {
        let result = self.detector.check(text.unwrap_or_default());
        serialize_to_py(py, &result)
    }

    #[pyo3(signature = (text=None))]
    pub fn contains(&self, text: Option<&str>) -> bool {
        self.detector.contains(text.unwrap_or_default())
    }

    #[pyo3(signature = (text=None))]
    pub fn find_all(&self, text: Option<&str>) -> Vec<String> {
        self.detector.find_all(text.unwrap_or_default())
    }

    /// Replace matches with the configured replacement, or `replacement`
    /// (str or callable receiving the matched text)
    #[pyo3(signature = (text=None, replacement=None))]
    pub fn replace(
        &self,
        text: Option<&str>,
        replacement: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<Option<String>> {
        let Some(text) = text else {
            return Ok(None);
        };
        let replaced = match replacement {
            Some(value) => self
                .detector
                .replace_with(text, &extract_replacement(value)?),
            None => self.detector.replace(text),
        };
        Ok(Some(replaced.into_owned()))
    }

    #[pyo3(signature = (text=None))]
    pub fn highlight(&self, text: Option<&str>) -> Option<String> {
        text.map(|t| self.detector.highlight(t).into_owned())
    }

    /// Apply the configured detection mode; returns (text, check result)
    #[pyo3(signature = (text=None))]
    pub fn process(
        &self,
        py: Python<'_>,
        text: Option<&str>,
    ) -> PyResult<(String, Py<PyAny>)> {
        let processed = self.detector.process(text.unwrap_or_default());
        let result = serialize_to_py(py, &processed.result)?;
        Ok((processed.text.into_owned(), result))
    }

    /// Check dict fields in order, stopping at the first detection
    pub fn check_fields(
        &self,
        py: Python<'_>,
        record: &Bound<'_, PyDict>,
        fields: Vec<String>,
    ) -> PyResult<Py<PyAny>> {
        let record = text_fields(record, &fields)?;
        let result = self.detector.check_fields(&record, &fields);
        serialize_to_py(py, &result)
    }

    /// Copy of `record` with the named text fields replaced
    #[pyo3(signature = (record, fields, replacement=None))]
    pub fn replace_fields<'py>(
        &self,
        py: Python<'py>,
        record: &Bound<'py, PyDict>,
        fields: Vec<String>,
        replacement: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let replacement = replacement.map(extract_replacement).transpose()?;
        let texts = text_fields(record, &fields)?;
        let replaced = self
            .detector
            .replace_fields(&texts, &fields, replacement.as_ref());

        let output = record.copy()?;
        for (key, value) in replaced {
            if let Value::String(text) = value {
                output.set_item(key, PyString::new(py, &text))?;
            }
        }
        Ok(output)
    }

    /// Returns {"success": True, "loaded_count": n} or {"success": False, "error": reason}
    pub fn reload(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        let dict = PyDict::new(py);
        match self.detector.reload() {
            Ok(outcome) => {
                dict.set_item("success", true)?;
                dict.set_item("loaded_count", outcome.loaded_count)?;
            }
            Err(err) => {
                dict.set_item("success", false)?;
                dict.set_item("error", err.to_string())?;
            }
        }
        Ok(dict.into_any().unbind())
    }

    pub fn add_words(&self, py: Python<'_>, words: Vec<String>) -> PyResult<Py<PyAny>> {
        let outcome = self.detector.add_words(&words).map_err(to_py_err)?;
        serialize_to_py(py, &outcome)
    }

    pub fn remove_words(&self, py: Python<'_>, words: Vec<String>) -> PyResult<Py<PyAny>> {
        let outcome = self.detector.remove_words(&words).map_err(to_py_err)?;
        serialize_to_py(py, &outcome)
    }

    /// {"total", "last_updated" (epoch seconds), "source_kind", "status", ...}
    pub fn stats(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
        let stats = self.detector.stats();
        let dict = PyDict::new(py);
        dict.set_item("total", stats.total)?;
        dict.set_item(
            "last_updated",
            stats
                .last_updated
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64()),
        )?;
        dict.set_item("source_kind", stats.source_kind.as_str())?;
        dict.set_item("status", serialize_to_py(py, &stats.status)?)?;
        dict.set_item("case_sensitive", stats.case_sensitive)?;
        dict.set_item("auto_reload", stats.auto_reload)?;
        Ok(dict.into_any().unbind())
    }

    pub fn stop(&self) {
        self.detector.stop();
    }
}

/// Text-valued entries of the requested fields; other values are left out
fn text_fields(record: &Bound<'_, PyDict>, fields: &[String]) -> PyResult<Map<String, Value>> {
    let mut map = Map::new();
    for field in fields {
        if let Some(value) = record.get_item(field)? {
            if let Ok(text) = value.extract::<String>() {
                map.insert(field.clone(), Value::String(text));
            }
        }
    }
    Ok(map)
}
