// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Word sources: explicit lists and line-oriented word files

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::error::{FilterError, Result};
use super::patterns::fold;

/// Lines starting with this marker are comments
pub const COMMENT_MARKER: char = '#';

/// Kind of word source backing a manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    List,
    File,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::List => "list",
            SourceKind::File => "file",
        }
    }
}

/// Where the word list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    List(Vec<String>),
    File {
        path: PathBuf,
        /// Modification time seen at the last successful load
        last_modified: Option<SystemTime>,
    },
}

impl SourceDescriptor {
    pub fn list<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceDescriptor::List(words.into_iter().map(Into::into).collect())
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::File {
            path: path.into(),
            last_modified: None,
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::List(_) => SourceKind::List,
            SourceDescriptor::File { .. } => SourceKind::File,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceDescriptor::List(_) => None,
            SourceDescriptor::File { path, .. } => Some(path),
        }
    }
}

/// Trim, drop blanks and deduplicate, keeping first occurrences in order
pub fn normalize_words<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut normalized = Vec::new();
    for word in words {
        let word = word.as_ref().trim();
        if word.is_empty() || seen.contains(word) {
            continue;
        }
        seen.insert(word.to_string());
        normalized.push(word.to_string());
    }
    normalized
}

/// Keep only the first spelling of each matching form
///
/// With case-insensitive matching `Bad` and `BAD` are the same word.
pub fn dedup_folded(words: Vec<String>, case_sensitive: bool) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(words.len());
    words
        .into_iter()
        .filter(|word| seen.insert(fold(word, case_sensitive).into_owned()))
        .collect()
}

/// Parse word-file contents: one word per line, `#` comments, blanks ignored
pub fn parse_word_file(contents: &str) -> Vec<String> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    normalize_words(
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with(COMMENT_MARKER)),
    )
}

pub fn read_word_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|source| FilterError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_word_file(&contents))
}

/// Current modification time of a word file
pub fn modified_time(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| FilterError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Load the normalized word list for a descriptor
pub fn load_words(descriptor: &SourceDescriptor) -> Result<Vec<String>> {
    match descriptor {
        SourceDescriptor::List(words) => Ok(normalize_words(words)),
        SourceDescriptor::File { path, .. } => read_word_file(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_words() {
        let words = normalize_words(["bad", "  ", "", " evil ", "bad", "evil"]);
        assert_eq!(words, vec!["bad", "evil"]);
    }

    #[test]
    fn test_dedup_folded() {
        let words = vec!["Bad".to_string(), "bad".to_string(), "BAD".to_string()];
        assert_eq!(dedup_folded(words.clone(), false), vec!["Bad"]);
        assert_eq!(dedup_folded(words, true).len(), 3);
    }

    #[test]
    fn test_parse_word_file() {
        let contents = "\u{feff}# header\nbadword\n\n  evil  \n#comment\nbadword\nspam\n";
        assert_eq!(parse_word_file(contents), vec!["badword", "evil", "spam"]);
    }

    #[test]
    fn test_indented_comment_is_dropped() {
        assert_eq!(parse_word_file("   # not a word\nword"), vec!["word"]);
    }

    #[test]
    fn test_load_missing_file() {
        let descriptor = SourceDescriptor::file("/definitely/not/here/words.txt");
        let err = load_words(&descriptor).unwrap_err();
        assert!(matches!(err, FilterError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha\n# skip\nbeta").unwrap();
        let descriptor = SourceDescriptor::file(file.path());
        assert_eq!(descriptor.kind(), SourceKind::File);
        assert_eq!(load_words(&descriptor).unwrap(), vec!["alpha", "beta"]);
        assert!(modified_time(file.path()).is_ok());
    }

    #[test]
    fn test_load_list() {
        let descriptor = SourceDescriptor::list(["a", " a", "b"]);
        assert_eq!(descriptor.kind(), SourceKind::List);
        assert!(descriptor.path().is_none());
        assert_eq!(load_words(&descriptor).unwrap(), vec!["a", "b"]);
    }
}
