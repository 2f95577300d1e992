/// Integration tests for the first-letter word index
///
/// Tests verify:
/// - Bucket contents for mixed-case built-in words
/// - Rebuilds are idempotent and replace the previous index wholesale
/// - Every indexable word lands in exactly one bucket
/// - Lookups never mutate stored word case

use std::collections::BTreeSet;

use quickcheck::{QuickCheck, TestResult};

use dict_completion_server::lsp::features::completion::dictionary::{bucket_letter, is_indexable_entry};
use dict_completion_server::lsp::features::completion::word_sources::{parse_word_list, BUILTIN_WORD_LIST};
use dict_completion_server::lsp::features::completion::{LetterBuckets, SharedWordIndex};
use dict_completion_server::lsp::features::completion::suggestions::build_suggestions;

fn as_sets(buckets: &LetterBuckets) -> Vec<(char, BTreeSet<String>)> {
    buckets
        .iter()
        .map(|(letter, words)| (letter, words.iter().cloned().collect()))
        .collect()
}

#[test]
fn test_builtin_words_split_by_first_letter() {
    let index = SharedWordIndex::new();
    index.rebuild(&["apple", "Banana"], &[] as &[&str]);

    assert_eq!(index.lookup('a'), vec!["apple".to_string()]);
    assert_eq!(index.lookup('b'), vec!["Banana".to_string()]);
    assert!(index.lookup('c').is_empty());
}

#[test]
fn test_compiled_word_list_is_indexed() {
    let words = parse_word_list(BUILTIN_WORD_LIST);
    let buckets = LetterBuckets::from_sources(&words, &[] as &[&str]);

    assert!(buckets.word_count() > 1000);
    assert!(buckets.bucket('a').iter().any(|w| w == "apple"));
    assert!(buckets.iter().all(|(letter, words)| {
        words.iter().all(|w| w.chars().next().and_then(bucket_letter) == Some(letter))
    }));
}

#[test]
fn test_rebuild_replaces_user_words() {
    let index = SharedWordIndex::new();
    index.rebuild(&["apple"], &["aardvark"]);
    let before = index.snapshot();

    let version = index.rebuild(&["apple"], &["antelope"]);

    assert_eq!(version, 2);
    assert_eq!(index.lookup('a'), vec!["apple".to_string(), "antelope".to_string()]);
    // Earlier snapshots keep the index they were taken from
    assert_eq!(before.bucket('a'), ["apple".to_string(), "aardvark".to_string()]);
}

#[test]
fn test_idempotent_rebuild() {
    fn prop(builtin: Vec<String>, user: Vec<String>) -> TestResult {
        let index = SharedWordIndex::new();
        index.rebuild(&builtin, &user);
        let first = as_sets(&index.snapshot());
        index.rebuild(&builtin, &user);
        let second = as_sets(&index.snapshot());
        TestResult::from_bool(first == second)
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>, Vec<String>) -> TestResult);
}

#[test]
fn test_partition_completeness() {
    fn prop(builtin: Vec<String>, user: Vec<String>) -> TestResult {
        let buckets = LetterBuckets::from_sources(&builtin, &user);

        for word in builtin.iter().chain(user.iter()) {
            let home = word.chars().next().and_then(bucket_letter);
            let occurrences: usize = buckets
                .iter()
                .map(|(_, words)| words.iter().filter(|w| *w == word).count())
                .sum();

            match home {
                Some(letter) if is_indexable_entry(word) => {
                    if occurrences != 1 || !buckets.bucket(letter).contains(word) {
                        return TestResult::failed();
                    }
                }
                _ => {
                    if occurrences != 0 {
                        return TestResult::failed();
                    }
                }
            }
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>, Vec<String>) -> TestResult);
}

#[test]
fn test_uppercase_lookup_does_not_mutate_case() {
    let index = SharedWordIndex::new();
    index.rebuild(&["apple", "avocado"], &[] as &[&str]);

    for _ in 0..2 {
        let upper = build_suggestions(index.lookup('A'), 'A', None, false);
        assert_eq!(upper[0].label, "Apple");
    }

    let lower = build_suggestions(index.lookup('a'), 'a', None, false);
    let labels: Vec<&str> = lower.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["apple", "avocado"]);
}
