// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Sensitive word detector: resolved configuration + hot-reloaded word list

use serde_json::{Map, Value};
use std::borrow::Cow;

use super::config::{ConfigLayer, FilterConfig, RuntimeOptions};
use super::engine::{CheckResult, FieldCheckResult, MatchEngine, Processed};
use super::error::Result;
use super::masking::Replacement;
use super::reload::{
    AddOutcome, ManagerStats, ReloadManager, ReloadOptions, ReloadOutcome, RemoveOutcome,
};

/// Main entry point for adapters (CLI, middleware, Python binding)
///
/// Every query takes the current snapshot at call start and uses it for the
/// whole call, so a concurrent swap is never observed half-way.
///
/// # Example
/// ```
/// use sensitive_words_rust::sensitive_words::{FilterConfig, SensitiveWordDetector};
///
/// let config = FilterConfig {
///     words: vec!["badword".to_string(), "evil".to_string()],
///     ..Default::default()
/// };
/// let detector = SensitiveWordDetector::new(config).unwrap();
///
/// assert!(detector.contains("This has BADWORD"));
/// assert_eq!(detector.replace("This is badword"), "This is ***");
/// ```
pub struct SensitiveWordDetector {
    manager: ReloadManager,
    config: FilterConfig,
}

impl SensitiveWordDetector {
    /// Start a detector; fails only when the initial word list cannot load
    pub fn new(config: FilterConfig) -> Result<Self> {
        let manager =
            ReloadManager::start(config.source_descriptor(), ReloadOptions::from(&config))?;
        Ok(Self { manager, config })
    }

    /// Resolve configuration from application settings, the process
    /// environment and runtime options, then start
    pub fn from_layers(
        app: Option<&ConfigLayer>,
        runtime: Option<&RuntimeOptions>,
    ) -> Result<Self> {
        let env = ConfigLayer::from_env();
        Self::new(FilterConfig::resolve(app, Some(&env), runtime))
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn manager(&self) -> &ReloadManager {
        &self.manager
    }

    pub fn check(&self, text: &str) -> CheckResult {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).check(text)
    }

    pub fn contains(&self, text: &str) -> bool {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).contains(text)
    }

    pub fn find_all(&self, text: &str) -> Vec<String> {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).find_all(text)
    }

    /// Replace with the configured replacement
    pub fn replace<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.replace_with(text, &self.config.replacement)
    }

    pub fn replace_with<'t>(&self, text: &'t str, replacement: &Replacement) -> Cow<'t, str> {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).replace(text, replacement)
    }

    pub fn highlight<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).highlight(text)
    }

    pub fn check_fields<S: AsRef<str>>(
        &self,
        record: &Map<String, Value>,
        fields: &[S],
    ) -> FieldCheckResult {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).check_fields(record, fields)
    }

    pub fn replace_fields<S: AsRef<str>>(
        &self,
        record: &Map<String, Value>,
        fields: &[S],
        replacement: Option<&Replacement>,
    ) -> Map<String, Value> {
        let replacement = replacement.unwrap_or(&self.config.replacement);
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).replace_fields(record, fields, replacement)
    }

    /// Apply the configured detection mode
    pub fn process<'t>(&self, text: &'t str) -> Processed<'t> {
        let snapshot = self.manager.snapshot();
        MatchEngine::new(&snapshot).process(
            text,
            self.config.detection_mode,
            &self.config.replacement,
        )
    }

    pub fn reload(&self) -> Result<ReloadOutcome> {
        self.manager.reload()
    }

    pub fn add_words<S: AsRef<str>>(&self, words: &[S]) -> Result<AddOutcome> {
        self.manager.add_words(words)
    }

    pub fn remove_words<S: AsRef<str>>(&self, words: &[S]) -> Result<RemoveOutcome> {
        self.manager.remove_words(words)
    }

    pub fn stats(&self) -> ManagerStats {
        self.manager.stats()
    }

    pub fn stop(&self) {
        self.manager.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitive_words::config::DetectionMode;

    fn detector(words: &[&str]) -> SensitiveWordDetector {
        SensitiveWordDetector::new(FilterConfig {
            words: words.iter().map(|w| w.to_string()).collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_queries_follow_word_changes() {
        let detector = detector(&["badword"]);
        assert!(detector.check("spam and eggs").is_clean());

        detector.add_words(&["spam"]).unwrap();
        assert_eq!(detector.find_all("spam and eggs"), vec!["spam"]);

        detector.remove_words(&["spam"]).unwrap();
        assert!(!detector.contains("spam and eggs"));
    }

    #[test]
    fn test_configured_replacement_and_mode() {
        let detector = SensitiveWordDetector::new(FilterConfig {
            words: vec!["evil".to_string()],
            replacement: Replacement::from("[x]"),
            detection_mode: DetectionMode::Replace,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(detector.replace("so evil"), "so [x]");
        assert_eq!(detector.process("so EVIL").text, "so [x]");
        assert_eq!(
            detector.replace_with("so evil", &Replacement::from("#")),
            "so #"
        );
    }

    #[test]
    fn test_case_sensitive_config() {
        let detector = SensitiveWordDetector::new(FilterConfig {
            words: vec!["Evil".to_string()],
            case_sensitive: true,
            ..Default::default()
        })
        .unwrap();
        assert!(detector.contains("Evil"));
        assert!(!detector.contains("evil"));
        assert!(detector.stats().case_sensitive);
    }

    #[test]
    fn test_process_missing_text_is_clean() {
        let detector = SensitiveWordDetector::new(FilterConfig {
            words: vec!["evil".to_string()],
            detection_mode: DetectionMode::Highlight,
            ..Default::default()
        })
        .unwrap();
        let processed = detector.process("");
        assert_eq!(processed.text, "");
        assert!(processed.result.is_clean());
    }
}
