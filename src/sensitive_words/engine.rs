// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Read-only query layer over a PatternSet snapshot

use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::config::DetectionMode;
use super::masking::{self, Replacement};
use super::patterns::PatternSet;

/// Outcome of scanning a single text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckResult {
    Clean,
    Detected { words: Vec<String>, count: usize },
}

impl CheckResult {
    pub fn is_clean(&self) -> bool {
        matches!(self, CheckResult::Clean)
    }

    pub fn words(&self) -> &[String] {
        match self {
            CheckResult::Clean => &[],
            CheckResult::Detected { words, .. } => words,
        }
    }
}

/// Outcome of scanning the fields of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldCheckResult {
    Clean,
    Detected {
        field: String,
        words: Vec<String>,
        count: usize,
    },
}

impl FieldCheckResult {
    pub fn is_clean(&self) -> bool {
        matches!(self, FieldCheckResult::Clean)
    }
}

/// Text after the configured detection mode has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed<'a> {
    pub text: Cow<'a, str>,
    pub result: CheckResult,
}

/// Stateless matcher over one borrowed snapshot
///
/// Every call is pure with respect to the snapshot: nothing blocks and
/// nothing shared is mutated.
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine<'a> {
    patterns: &'a PatternSet,
}

impl<'a> MatchEngine<'a> {
    pub fn new(patterns: &'a PatternSet) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &'a PatternSet {
        self.patterns
    }

    pub fn check(&self, text: &str) -> CheckResult {
        let words = self.find_all(text);
        if words.is_empty() {
            CheckResult::Clean
        } else {
            let count = words.len();
            CheckResult::Detected { words, count }
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.patterns.is_match(text)
    }

    /// Distinct matched words in first-occurrence order
    pub fn find_all(&self, text: &str) -> Vec<String> {
        self.patterns
            .matched_patterns(text)
            .into_iter()
            .map(|id| self.patterns.pattern(id).original().to_string())
            .collect()
    }

    pub fn replace<'t>(&self, text: &'t str, replacement: &Replacement) -> Cow<'t, str> {
        masking::replace_cover(text, &self.patterns.cover(text), replacement)
    }

    pub fn highlight<'t>(&self, text: &'t str) -> Cow<'t, str> {
        masking::highlight_cover(text, &self.patterns.cover(text))
    }

    /// Check `fields` in order, stopping at the first text field that matches
    ///
    /// Absent and non-text fields are skipped.
    pub fn check_fields<S: AsRef<str>>(
        &self,
        record: &Map<String, Value>,
        fields: &[S],
    ) -> FieldCheckResult {
        for field in fields {
            let Some((key, Value::String(text))) = record.get_key_value(field.as_ref()) else {
                continue;
            };
            if let CheckResult::Detected { words, count } = self.check(text) {
                return FieldCheckResult::Detected {
                    field: key.clone(),
                    words,
                    count,
                };
            }
        }
        FieldCheckResult::Clean
    }

    /// Apply `replace` to each named text field; everything else passes through
    pub fn replace_fields<S: AsRef<str>>(
        &self,
        record: &Map<String, Value>,
        fields: &[S],
        replacement: &Replacement,
    ) -> Map<String, Value> {
        let mut output = record.clone();
        for field in fields {
            if let Some(Value::String(text)) = output.get_mut(field.as_ref()) {
                let replaced = match self.replace(text, replacement) {
                    Cow::Owned(replaced) => replaced,
                    Cow::Borrowed(_) => continue,
                };
                *text = replaced;
            }
        }
        output
    }

    /// Check `text` and rewrite it according to `mode`
    pub fn process<'t>(
        &self,
        text: &'t str,
        mode: DetectionMode,
        replacement: &Replacement,
    ) -> Processed<'t> {
        let result = self.check(text);
        let text = match (&result, mode) {
            (CheckResult::Clean, _) | (_, DetectionMode::Detect) => Cow::Borrowed(text),
            (_, DetectionMode::Replace) => self.replace(text, replacement),
            (_, DetectionMode::Highlight) => self.highlight(text),
        };
        Processed { text, result }
    }
}
