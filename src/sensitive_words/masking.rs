// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Rewriting of resolved occurrences: replacement and highlighting

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::patterns::Occurrence;

/// Default replacement text
pub const DEFAULT_REPLACEMENT: &str = "***";

/// Highlight markers wrapped around each occurrence
pub const HIGHLIGHT_OPEN: &str = "<mark>";
pub const HIGHLIGHT_CLOSE: &str = "</mark>";

/// Per-match replacement callback, receives the matched substring as it
/// appears in the input text
pub type ReplaceFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// What an occurrence is replaced with
#[derive(Clone)]
pub enum Replacement {
    Fixed(String),
    With(ReplaceFn),
}

impl Replacement {
    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Replacement::With(Arc::new(f))
    }

    fn apply(&self, matched: &str, out: &mut String) {
        match self {
            Replacement::Fixed(text) => out.push_str(text),
            Replacement::With(f) => out.push_str(&f(matched)),
        }
    }
}

impl Default for Replacement {
    fn default() -> Self {
        Replacement::Fixed(DEFAULT_REPLACEMENT.to_string())
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Fixed(text) => f.debug_tuple("Fixed").field(text).finish(),
            Replacement::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

impl PartialEq for Replacement {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Replacement::Fixed(a), Replacement::Fixed(b)) => a == b,
            (Replacement::With(a), Replacement::With(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Replacement {
    fn from(text: &str) -> Self {
        Replacement::Fixed(text.to_string())
    }
}

impl From<String> for Replacement {
    fn from(text: String) -> Self {
        Replacement::Fixed(text)
    }
}

/// Rewrite every occurrence in `cover` through `emit`
///
/// `cover` must be non-overlapping and sorted by start. Text between
/// occurrences is copied byte for byte.
fn rewrite<'a>(
    text: &'a str,
    cover: &[Occurrence],
    mut emit: impl FnMut(&str, &mut String),
) -> Cow<'a, str> {
    if cover.is_empty() {
        // Zero-copy when nothing matched
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len() + cover.len() * 8);
    let mut cursor = 0;
    for occ in cover {
        result.push_str(&text[cursor..occ.start]);
        emit(&text[occ.start..occ.end], &mut result);
        cursor = occ.end;
    }
    result.push_str(&text[cursor..]);

    Cow::Owned(result)
}

/// Replace each occurrence with `replacement`
pub fn replace_cover<'a>(
    text: &'a str,
    cover: &[Occurrence],
    replacement: &Replacement,
) -> Cow<'a, str> {
    rewrite(text, cover, |matched, out| replacement.apply(matched, out))
}

/// Wrap each occurrence, in its original casing, with the highlight markers
pub fn highlight_cover<'a>(text: &'a str, cover: &[Occurrence]) -> Cow<'a, str> {
    rewrite(text, cover, |matched, out| {
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(matched);
        out.push_str(HIGHLIGHT_CLOSE);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(start: usize, end: usize) -> Occurrence {
        Occurrence {
            pattern: 0,
            start,
            end,
        }
    }

    #[test]
    fn test_replace_empty_cover_is_borrowed() {
        let result = replace_cover("nothing here", &[], &Replacement::default());
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_replace_fixed() {
        let result = replace_cover("This is badword", &[occ(8, 15)], &Replacement::default());
        assert_eq!(result, "This is ***");
    }

    #[test]
    fn test_replace_with_function_sees_original_casing() {
        let replacement = Replacement::with(|m| "#".repeat(m.chars().count()));
        let result = replace_cover("a BaD b", &[occ(2, 5)], &replacement);
        assert_eq!(result, "a ### b");

        let echo = Replacement::with(|m| format!("[{}]", m));
        assert_eq!(replace_cover("a BaD b", &[occ(2, 5)], &echo), "a [BaD] b");
    }

    #[test]
    fn test_highlight() {
        let result = highlight_cover("BADWORD and BadWord", &[occ(0, 7), occ(12, 19)]);
        assert_eq!(result, "<mark>BADWORD</mark> and <mark>BadWord</mark>");
    }

    #[test]
    fn test_replacement_debug_hides_function() {
        let replacement = Replacement::with(|m| m.to_string());
        assert_eq!(format!("{:?}", replacement), "With(<fn>)");
        assert_eq!(Replacement::from("x"), Replacement::Fixed("x".to_string()));
    }
}
