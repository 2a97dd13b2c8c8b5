// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Multi-pattern matching for sensitive words
// One overlapping Aho-Corasick pass over the folded text finds every
// occurrence of every word; offsets are mapped back to the original text.

use aho_corasick::{AhoCorasick, MatchKind};
use std::borrow::Cow;
use std::collections::HashSet;

use super::error::{FilterError, Result};

/// Index of a pattern inside its `PatternSet`
pub type PatternId = usize;

/// Fold a single character into `out`
///
/// Folding is done per character (not `str::to_lowercase`) so that pattern
/// and text are folded identically regardless of surrounding context.
#[inline]
fn fold_char(c: char, case_sensitive: bool, mut out: impl FnMut(char)) {
    if case_sensitive {
        out(c);
    } else {
        for lower in c.to_lowercase() {
            out(lower);
        }
    }
}

/// Folded form of a whole word
pub fn fold(word: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        return Cow::Borrowed(word);
    }
    let mut folded = String::with_capacity(word.len());
    for c in word.chars() {
        fold_char(c, case_sensitive, |f| folded.push(f));
    }
    Cow::Owned(folded)
}

/// A normalized word: original spelling plus the form used for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    original: String,
    folded: String,
}

impl Pattern {
    pub fn new(word: &str, case_sensitive: bool) -> Self {
        Self {
            original: word.to_string(),
            folded: fold(word, case_sensitive).into_owned(),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }
}

/// A located match of one pattern within one text (byte offsets, end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub pattern: PatternId,
    pub start: usize,
    pub end: usize,
}

impl Occurrence {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Folded text plus, for every folded byte, the span of the original
/// character it came from
struct FoldedText<'t> {
    text: Cow<'t, str>,
    origin: Option<Vec<(usize, usize)>>,
}

impl<'t> FoldedText<'t> {
    fn new(text: &'t str, case_sensitive: bool) -> Self {
        if case_sensitive {
            return Self {
                text: Cow::Borrowed(text),
                origin: None,
            };
        }

        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (offset, c) in text.char_indices() {
            let span = (offset, offset + c.len_utf8());
            fold_char(c, false, |f| {
                folded.push(f);
                origin.resize(folded.len(), span);
            });
        }
        Self {
            text: Cow::Owned(folded),
            origin: Some(origin),
        }
    }

    /// Original span of the folded byte range `start..end` (non-empty)
    fn original_span(&self, start: usize, end: usize) -> (usize, usize) {
        match &self.origin {
            None => (start, end),
            Some(origin) => (origin[start].0, origin[end - 1].1),
        }
    }
}

/// Immutable compiled word list
///
/// Once built a `PatternSet` is never mutated; a changed word list produces
/// a new one. It is `Send + Sync` and shared read-only between readers.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    // None when there is nothing to match
    automaton: Option<AhoCorasick>,
    case_sensitive: bool,
}

impl PatternSet {
    /// A set that matches nothing
    pub fn empty(case_sensitive: bool) -> Self {
        Self {
            patterns: Vec::new(),
            automaton: None,
            case_sensitive,
        }
    }

    /// Compile a word list
    ///
    /// Empty words are skipped, as are words whose matching form repeats an
    /// earlier one (so `BAD` after `bad` is dropped unless matching is case
    /// sensitive). The first spelling is kept for reporting.
    pub fn build<S: AsRef<str>>(words: &[S], case_sensitive: bool) -> Result<Self> {
        let mut patterns = Vec::with_capacity(words.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(words.len());

        for word in words {
            let pattern = Pattern::new(word.as_ref(), case_sensitive);
            if pattern.folded.is_empty() || !seen.insert(pattern.folded.clone()) {
                continue;
            }
            patterns.push(pattern);
        }

        if patterns.is_empty() {
            return Ok(Self::empty(case_sensitive));
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(patterns.iter().map(Pattern::folded))
            .map_err(|e| FilterError::RebuildFailure(e.to_string()))?;

        Ok(Self {
            patterns,
            automaton: Some(automaton),
            case_sensitive,
        })
    }

    /// Walk `text` once, calling `visit` for every occurrence in walk order
    ///
    /// Occurrences are reported by ascending end offset. Offsets are byte
    /// offsets into the original (unfolded) text and always fall on char
    /// boundaries. Return `false` from `visit` to stop early.
    pub fn scan(&self, text: &str, mut visit: impl FnMut(Occurrence) -> bool) {
        let Some(automaton) = &self.automaton else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let folded = FoldedText::new(text, self.case_sensitive);
        for found in automaton.find_overlapping_iter(folded.text.as_ref()) {
            let (start, end) = folded.original_span(found.start(), found.end());
            let occurrence = Occurrence {
                pattern: found.pattern().as_usize(),
                start,
                end,
            };
            if !visit(occurrence) {
                return;
            }
        }
    }

    /// Every occurrence, overlapping ones included, in walk order
    pub fn occurrences(&self, text: &str) -> Vec<Occurrence> {
        let mut found = Vec::new();
        self.scan(text, |occ| {
            found.push(occ);
            true
        });
        found
    }

    /// Whether any pattern occurs in `text`
    pub fn is_match(&self, text: &str) -> bool {
        let mut matched = false;
        self.scan(text, |_| {
            matched = true;
            false
        });
        matched
    }

    /// Distinct matched patterns in first-occurrence order
    pub fn matched_patterns(&self, text: &str) -> Vec<PatternId> {
        let mut seen = vec![false; self.patterns.len()];
        let mut ids = Vec::new();
        self.scan(text, |occ| {
            if !seen[occ.pattern] {
                seen[occ.pattern] = true;
                ids.push(occ.pattern);
            }
            true
        });
        ids
    }

    /// Non-overlapping cover of `text`, ordered by start offset
    pub fn cover(&self, text: &str) -> Vec<Occurrence> {
        resolve_cover(self.occurrences(text))
    }

    pub fn pattern(&self, id: PatternId) -> &Pattern {
        &self.patterns[id]
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Original spellings in build order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::original)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Heap bytes held by the compiled automaton
    pub fn memory_usage(&self) -> usize {
        self.automaton.as_ref().map_or(0, AhoCorasick::memory_usage)
    }
}

/// Resolve occurrences into a non-overlapping cover
///
/// Occurrences are scanned left to right by start offset. Among candidates
/// sharing a start the greater end wins, ties keep walk order. A candidate
/// overlapping an occurrence already in the cover is dropped.
pub fn resolve_cover(mut occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
    // Stable: equal (start, end) keep walk order
    occurrences.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut cover: Vec<Occurrence> = Vec::with_capacity(occurrences.len());
    for occ in occurrences {
        match cover.last() {
            Some(last) if occ.start < last.end => continue,
            _ => cover.push(occ),
        }
    }
    cover
}
