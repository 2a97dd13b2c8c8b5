// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Configuration types for the sensitive word filter
//
// Precedence, low to high: defaults < application config < environment
// variables < explicit runtime options. Values are validated once, at
// resolution time; an invalid value is logged and replaced by the default.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::FilterError;
use super::loader::SourceDescriptor;
use super::masking::Replacement;

/// Prefix of the recognized environment variables
pub const ENV_PREFIX: &str = "SENSITIVE_WORDS_";

pub const DEFAULT_RELOAD_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// What the filter does with detected words when processing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    #[default]
    Detect,
    Replace,
    Highlight,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::Detect => "detect",
            DetectionMode::Replace => "replace",
            DetectionMode::Highlight => "highlight",
        }
    }
}

impl FromStr for DetectionMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detect" => Ok(DetectionMode::Detect),
            "replace" => Ok(DetectionMode::Replace),
            "highlight" => Ok(DetectionMode::Highlight),
            other => Err(FilterError::invalid_config(
                "detection_mode",
                format!("unknown detection mode '{}'", other),
            )),
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub words: Vec<String>,
    pub words_file: Option<PathBuf>,
    pub auto_reload: bool,
    pub reload_interval: Duration,
    pub case_sensitive: bool,
    pub replacement: Replacement,
    pub detection_mode: DetectionMode,
    pub cache_ttl: Duration,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            words: Vec::new(),
            words_file: None,
            auto_reload: false,
            reload_interval: Duration::from_millis(DEFAULT_RELOAD_INTERVAL_MS),
            case_sensitive: false,
            replacement: Replacement::default(),
            detection_mode: DetectionMode::Detect,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

/// One untyped configuration layer (application config or environment)
///
/// Values are kept raw so that type mismatches surface as `InvalidConfig`
/// during resolution instead of failing deserialization of the whole layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub words: Option<Value>,
    pub words_file: Option<Value>,
    pub auto_reload: Option<Value>,
    pub reload_interval: Option<Value>,
    pub case_sensitive: Option<Value>,
    pub replacement: Option<Value>,
    pub detection_mode: Option<Value>,
    pub cache_ttl: Option<Value>,
}

impl ConfigLayer {
    /// Parse a layer from a JSON object
    pub fn from_json(value: Value) -> Result<Self, FilterError> {
        serde_json::from_value(value)
            .map_err(|e| FilterError::invalid_config("<root>", e.to_string()))
    }

    /// Build a layer from `SENSITIVE_WORDS_*` variables
    ///
    /// `SENSITIVE_WORDS_WORDS` is a comma separated list; every other value
    /// is passed through as text and validated during resolution.
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            let Some(option) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            let slot = match option {
                "WORDS" => {
                    let words = value
                        .split(',')
                        .map(|w| Value::String(w.trim().to_string()))
                        .collect();
                    layer.words = Some(Value::Array(words));
                    continue;
                }
                "FILE" | "WORDS_FILE" => &mut layer.words_file,
                "AUTO_RELOAD" => &mut layer.auto_reload,
                "RELOAD_INTERVAL" => &mut layer.reload_interval,
                "CASE_SENSITIVE" => &mut layer.case_sensitive,
                "REPLACEMENT" => &mut layer.replacement,
                "DETECTION_MODE" => &mut layer.detection_mode,
                "CACHE_TTL" => &mut layer.cache_ttl,
                _ => continue,
            };
            *slot = Some(Value::String(value));
        }
        layer
    }

    /// Layer from the process environment
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::vars())
    }
}

/// Explicit runtime options, the highest precedence layer
///
/// This is the only layer that can carry a per-match replacement function.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub words: Option<Vec<String>>,
    pub words_file: Option<PathBuf>,
    pub auto_reload: Option<bool>,
    pub reload_interval_ms: Option<u64>,
    pub case_sensitive: Option<bool>,
    pub replacement: Option<Replacement>,
    pub detection_mode: Option<DetectionMode>,
    pub cache_ttl_secs: Option<u64>,
}

fn report(err: FilterError) {
    warn!("{}; falling back to default", err);
}

fn parse_bool(option: &str, value: &Value) -> Result<bool, FilterError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(FilterError::invalid_config(
                option,
                format!("expected a boolean, got '{}'", s),
            )),
        },
        other => Err(FilterError::invalid_config(
            option,
            format!("expected a boolean, got {}", other),
        )),
    }
}

fn parse_positive(option: &str, value: &Value) -> Result<u64, FilterError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n > 0 => Ok(n),
        _ => Err(FilterError::invalid_config(
            option,
            format!("expected a positive integer, got {}", value),
        )),
    }
}

fn parse_text(option: &str, value: &Value) -> Result<String, FilterError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(FilterError::invalid_config(
            option,
            format!("expected text, got {}", other),
        )),
    }
}

fn parse_words(value: &Value) -> Result<Vec<String>, FilterError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(FilterError::invalid_config(
                    "words",
                    format!("non-text word entry {}", other),
                )),
            })
            .collect(),
        other => Err(FilterError::invalid_config(
            "words",
            format!("expected a list of text, got {}", other),
        )),
    }
}

fn positive_or_default(option: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        report(FilterError::invalid_config(option, "must be positive"));
        default
    } else {
        value
    }
}

impl FilterConfig {
    /// Merge one untyped layer over `self`
    fn apply_layer(&mut self, layer: &ConfigLayer) {
        let config = self;
        let defaults = Self::default();

        // Helper macro: validate one raw option, fall back to the default on error
        macro_rules! apply {
            ($field:ident, $parse:expr, $assign:expr) => {
                if let Some(raw) = &layer.$field {
                    match $parse(raw) {
                        Ok(value) => $assign(&mut *config, value),
                        Err(err) => {
                            report(err);
                            config.$field = defaults.$field.clone();
                        }
                    }
                }
            };
        }

        apply!(words, parse_words, |c: &mut Self, v| c.words = v);
        apply!(
            words_file,
            |v| parse_text("words_file", v),
            |c: &mut Self, v: String| c.words_file = Some(PathBuf::from(v))
        );
        apply!(
            auto_reload,
            |v| parse_bool("auto_reload", v),
            |c: &mut Self, v| c.auto_reload = v
        );
        apply!(
            reload_interval,
            |v| parse_positive("reload_interval", v),
            |c: &mut Self, v| c.reload_interval = Duration::from_millis(v)
        );
        apply!(
            case_sensitive,
            |v| parse_bool("case_sensitive", v),
            |c: &mut Self, v| c.case_sensitive = v
        );
        apply!(
            replacement,
            |v| parse_text("replacement", v),
            |c: &mut Self, v: String| c.replacement = Replacement::Fixed(v)
        );
        apply!(
            detection_mode,
            |v: &Value| parse_text("detection_mode", v).and_then(|s| s.parse::<DetectionMode>()),
            |c: &mut Self, v| c.detection_mode = v
        );
        apply!(
            cache_ttl,
            |v| parse_positive("cache_ttl", v),
            |c: &mut Self, v| c.cache_ttl = Duration::from_secs(v)
        );
    }

    fn apply_runtime(&mut self, options: &RuntimeOptions) {
        if let Some(words) = &options.words {
            self.words = words.clone();
        }
        if let Some(path) = &options.words_file {
            self.words_file = Some(path.clone());
        }
        if let Some(auto_reload) = options.auto_reload {
            self.auto_reload = auto_reload;
        }
        if let Some(ms) = options.reload_interval_ms {
            let ms = positive_or_default("reload_interval", ms, DEFAULT_RELOAD_INTERVAL_MS);
            self.reload_interval = Duration::from_millis(ms);
        }
        if let Some(case_sensitive) = options.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(replacement) = &options.replacement {
            self.replacement = replacement.clone();
        }
        if let Some(mode) = options.detection_mode {
            self.detection_mode = mode;
        }
        if let Some(secs) = options.cache_ttl_secs {
            let secs = positive_or_default("cache_ttl", secs, DEFAULT_CACHE_TTL_SECS);
            self.cache_ttl = Duration::from_secs(secs);
        }
    }

    /// Resolve the effective configuration from all layers
    pub fn resolve(
        app: Option<&ConfigLayer>,
        env: Option<&ConfigLayer>,
        runtime: Option<&RuntimeOptions>,
    ) -> Self {
        let mut config = Self::default();
        if let Some(layer) = app {
            config.apply_layer(layer);
        }
        if let Some(layer) = env {
            config.apply_layer(layer);
        }
        if let Some(options) = runtime {
            config.apply_runtime(options);
        }
        config
    }

    /// Word source described by this configuration
    ///
    /// A configured `words_file` takes precedence over inline `words`.
    pub fn source_descriptor(&self) -> SourceDescriptor {
        match &self.words_file {
            Some(path) => SourceDescriptor::file(path.clone()),
            None => SourceDescriptor::List(self.words.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert!(config.words.is_empty());
        assert!(config.words_file.is_none());
        assert!(!config.auto_reload);
        assert_eq!(config.reload_interval, Duration::from_millis(5000));
        assert!(!config.case_sensitive);
        assert_eq!(config.replacement, Replacement::Fixed("***".to_string()));
        assert_eq!(config.detection_mode, DetectionMode::Detect);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_detection_mode_from_str() {
        assert_eq!("Replace".parse::<DetectionMode>().unwrap(), DetectionMode::Replace);
        assert!("shout".parse::<DetectionMode>().is_err());
    }

    #[test]
    fn test_precedence() {
        let app = ConfigLayer::from_json(json!({
            "words": ["a", "b"],
            "replacement": "[app]",
            "reload_interval": 1000,
            "detection_mode": "highlight"
        }))
        .unwrap();
        let env = ConfigLayer::from_env_vars([
            ("SENSITIVE_WORDS_REPLACEMENT", "[env]"),
            ("SENSITIVE_WORDS_CASE_SENSITIVE", "true"),
            ("UNRELATED", "x"),
        ]);
        let runtime = RuntimeOptions {
            replacement: Some(Replacement::from("[runtime]")),
            ..Default::default()
        };

        let config = FilterConfig::resolve(Some(&app), Some(&env), Some(&runtime));
        assert_eq!(config.words, vec!["a", "b"]);
        assert_eq!(config.reload_interval, Duration::from_millis(1000));
        assert_eq!(config.detection_mode, DetectionMode::Highlight);
        assert!(config.case_sensitive);
        assert_eq!(config.replacement, Replacement::from("[runtime]"));

        let without_runtime = FilterConfig::resolve(Some(&app), Some(&env), None);
        assert_eq!(without_runtime.replacement, Replacement::from("[env]"));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let app = ConfigLayer::from_json(json!({
            "reload_interval": 0,
            "cache_ttl": "soon",
            "auto_reload": "maybe",
            "detection_mode": "shout",
            "words": ["ok", 3]
        }))
        .unwrap();
        let config = FilterConfig::resolve(Some(&app), None, None);
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_invalid_env_value_overrides_app_with_default() {
        let app = ConfigLayer::from_json(json!({"reload_interval": 250})).unwrap();
        let env = ConfigLayer::from_env_vars([("SENSITIVE_WORDS_RELOAD_INTERVAL", "-5")]);
        let config = FilterConfig::resolve(Some(&app), Some(&env), None);
        assert_eq!(config.reload_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_runtime_non_positive_interval() {
        let runtime = RuntimeOptions {
            reload_interval_ms: Some(0),
            cache_ttl_secs: Some(10),
            ..Default::default()
        };
        let config = FilterConfig::resolve(None, None, Some(&runtime));
        assert_eq!(config.reload_interval, Duration::from_millis(5000));
        assert_eq!(config.cache_ttl, Duration::from_secs(10));
    }

    #[test]
    fn test_env_words_and_file() {
        let env = ConfigLayer::from_env_vars([
            ("SENSITIVE_WORDS_WORDS", "spam, eggs ,ham"),
            ("SENSITIVE_WORDS_FILE", "/etc/words.txt"),
            ("SENSITIVE_WORDS_AUTO_RELOAD", "yes"),
        ]);
        let config = FilterConfig::resolve(None, Some(&env), None);
        assert_eq!(config.words, vec!["spam", "eggs", "ham"]);
        assert_eq!(config.words_file, Some(PathBuf::from("/etc/words.txt")));
        assert!(config.auto_reload);
        assert_eq!(
            config.source_descriptor(),
            SourceDescriptor::file("/etc/words.txt")
        );
    }
}
