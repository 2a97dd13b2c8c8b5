// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Property tests: the automaton against a naive case-folded substring scan

use proptest::prelude::*;
use std::collections::HashSet;

use sensitive_words_rust::sensitive_words::{MatchEngine, PatternSet, Replacement};

fn naive_fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Folded forms of the words that occur in `text` as case-folded substrings
fn naive_matches(words: &[String], text: &str) -> HashSet<String> {
    let folded = naive_fold(text);
    words
        .iter()
        .map(|w| naive_fold(w))
        .filter(|w| !w.is_empty() && folded.contains(w.as_str()))
        .collect()
}

/// Total overlapping occurrences of each distinct folded word
fn naive_occurrence_count(words: &[String], text: &str) -> usize {
    let folded = naive_fold(text);
    let distinct: HashSet<String> = words
        .iter()
        .map(|w| naive_fold(w))
        .filter(|w| !w.is_empty())
        .collect();
    distinct
        .into_iter()
        .map(|w| {
            (0..folded.len())
                .filter(|&i| folded[i..].starts_with(&w))
                .count()
        })
        .sum()
}

// Small alphabet so that overlaps and nested words are common
fn word() -> impl Strategy<Value = String> {
    "[abcAB]{1,4}"
}

fn text() -> impl Strategy<Value = String> {
    "[abcAB ]{0,40}"
}

// Characters whose lowercase form differs in byte length or char count:
// 'İ' folds to two chars, 'ẞ' shrinks from 3 to 2 bytes, 'Σ' and 'Ä' change
// bytes in place
fn unicode_word() -> impl Strategy<Value = String> {
    "[aiİẞßΣσäÄ]{1,3}"
}

fn unicode_text() -> impl Strategy<Value = String> {
    "[aiİẞßΣσäÄx ]{0,30}"
}

proptest! {
    #[test]
    fn find_all_agrees_with_naive_scan(words in prop::collection::vec(word(), 0..8), text in text()) {
        let set = PatternSet::build(&words, false).unwrap();
        let engine = MatchEngine::new(&set);

        let found = engine.find_all(&text);
        let unique: HashSet<String> = found.iter().map(|w| naive_fold(w)).collect();

        prop_assert_eq!(unique.len(), found.len(), "case duplicates in {:?}", found);
        prop_assert_eq!(unique, naive_matches(&words, &text));
        prop_assert_eq!(engine.check(&text).is_clean(), found.is_empty());
    }

    #[test]
    fn every_overlapping_occurrence_is_reported(words in prop::collection::vec(word(), 0..8), text in text()) {
        let set = PatternSet::build(&words, false).unwrap();
        prop_assert_eq!(set.occurrences(&text).len(), naive_occurrence_count(&words, &text));
    }

    #[test]
    fn replace_is_idempotent(words in prop::collection::vec(word(), 0..8), text in text()) {
        let set = PatternSet::build(&words, false).unwrap();
        let engine = MatchEngine::new(&set);
        let replacement = Replacement::default();

        let once = engine.replace(&text, &replacement).into_owned();
        let twice = engine.replace(&once, &replacement).into_owned();
        prop_assert_eq!(&once, &twice);
        prop_assert!(engine.check(&once).is_clean());
    }

    #[test]
    fn case_insensitive_checks_agree(words in prop::collection::vec(word(), 0..8), text in text()) {
        let set = PatternSet::build(&words, false).unwrap();
        let engine = MatchEngine::new(&set);

        prop_assert_eq!(
            engine.check(&text.to_uppercase()),
            engine.check(&text.to_lowercase())
        );
    }

    #[test]
    fn highlight_only_adds_markers(words in prop::collection::vec(word(), 0..8), text in text()) {
        let set = PatternSet::build(&words, false).unwrap();
        let engine = MatchEngine::new(&set);

        let marked = engine.highlight(&text);
        let stripped = marked.replace("<mark>", "").replace("</mark>", "");
        prop_assert_eq!(stripped, text);
    }

    #[test]
    fn case_sensitive_matches_plain_substring(words in prop::collection::vec(word(), 0..8), text in text()) {
        let set = PatternSet::build(&words, true).unwrap();
        let engine = MatchEngine::new(&set);

        let expected: HashSet<String> = words
            .iter()
            .filter(|w| text.contains(w.as_str()))
            .cloned()
            .collect();
        let found: HashSet<String> = engine.find_all(&text).into_iter().collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn unicode_find_all_agrees_with_naive_scan(
        words in prop::collection::vec(unicode_word(), 0..6),
        text in unicode_text(),
    ) {
        let set = PatternSet::build(&words, false).unwrap();
        let engine = MatchEngine::new(&set);

        let found = engine.find_all(&text);
        let unique: HashSet<String> = found.iter().map(|w| naive_fold(w)).collect();

        prop_assert_eq!(unique.len(), found.len(), "case duplicates in {:?}", found);
        prop_assert_eq!(unique, naive_matches(&words, &text));
    }

    #[test]
    fn unicode_highlight_only_adds_markers(
        words in prop::collection::vec(unicode_word(), 0..6),
        text in unicode_text(),
    ) {
        let set = PatternSet::build(&words, false).unwrap();
        let engine = MatchEngine::new(&set);

        let marked = engine.highlight(&text);
        let stripped = marked.replace("<mark>", "").replace("</mark>", "");
        prop_assert_eq!(stripped, text.clone());

        for occ in set.occurrences(&text) {
            prop_assert!(text.is_char_boundary(occ.start) && text.is_char_boundary(occ.end));
        }
    }
}
