// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Sensitive Word Filter - Rust Implementation
//
// Detection, replacement and highlighting of a configurable word set:
// - Aho-Corasick automaton for single-pass multi-word matching
// - Copy-on-write strings for zero-copy clean text
// - ArcSwap-published snapshots with a single serialized writer for hot reload

pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod loader;
pub mod masking;
pub mod patterns;
pub mod reload;

#[cfg(feature = "python")]
pub mod python;

pub use config::{ConfigLayer, DetectionMode, FilterConfig, RuntimeOptions};
pub use detector::SensitiveWordDetector;
pub use engine::{CheckResult, FieldCheckResult, MatchEngine, Processed};
pub use error::{FilterError, Result};
pub use loader::{SourceDescriptor, SourceKind};
pub use masking::Replacement;
pub use patterns::{Occurrence, Pattern, PatternSet};
pub use reload::{
    AddOutcome, ManagerStats, ReloadManager, ReloadOptions, ReloadOutcome, ReloadStatus,
    RemoveOutcome,
};
