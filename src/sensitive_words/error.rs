// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Error types for the sensitive word filter

use std::path::PathBuf;

/// Errors raised by configuration, loading and reload management.
///
/// Query operations (`check`, `replace`, ...) never produce these; they are
/// total over their inputs.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Malformed option value. Resolved by falling back to the default.
    #[error("invalid config option '{option}': {reason}")]
    InvalidConfig { option: String, reason: String },

    /// Configured word file missing or unreadable.
    #[error("word source unavailable at {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first build failed, so there is no snapshot to fall back to.
    #[error("initial word list load failed: {0}")]
    InitialLoadFailed(#[source] Box<FilterError>),

    /// Pattern compilation failed. The previous snapshot stays published.
    #[error("pattern set rebuild failed: {0}")]
    RebuildFailure(String),

    /// The manager has been shut down.
    #[error("reload manager is stopped")]
    Stopped,
}

/// Result alias for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    pub(crate) fn invalid_config(option: &str, reason: impl Into<String>) -> Self {
        FilterError::InvalidConfig {
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}
