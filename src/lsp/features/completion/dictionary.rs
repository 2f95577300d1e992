//! First-letter word index for dictionary completion
//!
//! The index keeps every candidate word in one of 26 buckets keyed by the
//! lowercase ASCII letter its first character folds to. Words whose first
//! character does not fold to `a..=z` are never indexed and therefore never
//! suggested.
//!
//! Architecture:
//! - `LetterBuckets`: immutable result of one rebuild pass
//! - `WordIndex`: owns the current buckets plus a rebuild counter
//! - `SharedWordIndex`: cloneable handle used by the server; a rebuild swaps the
//!   whole `WordIndex` behind a write lock so readers see either the old or the
//!   new index, never a partially filled one
//!
//! Stored words keep the case they had in their source. Lookups hand out owned
//! copies, so any case transformation done by the caller cannot leak back into
//! the index.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Number of buckets, one per ASCII letter.
pub const BUCKET_COUNT: usize = 26;

/// Lines starting with this marker are comments in word list files.
pub const COMMENT_MARKER: &str = "//";

/// Maps a character to its bucket letter.
///
/// Returns `None` unless the lowercase form of `c` is exactly one ASCII letter.
pub fn bucket_letter(c: char) -> Option<char> {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(letter), None) if letter.is_ascii_lowercase() => Some(letter),
        _ => None,
    }
}

fn bucket_slot(c: char) -> Option<usize> {
    bucket_letter(c).map(|letter| (letter as u8 - b'a') as usize)
}

/// Whether a raw word list entry survives filtering.
pub fn is_indexable_entry(word: &str) -> bool {
    !word.is_empty() && !word.starts_with(COMMENT_MARKER)
}

/// The 26 letter buckets produced by a single rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterBuckets {
    buckets: [Vec<String>; BUCKET_COUNT],
}

impl LetterBuckets {
    /// Builds buckets from the built-in and user word sources.
    ///
    /// Words are de-duplicated by exact (case-sensitive) equality, comment and
    /// empty entries are dropped, and the remaining words are appended to the
    /// bucket of their first letter in first-seen order.
    pub fn from_sources<B, U>(builtin_words: &[B], user_words: &[U]) -> Self
    where
        B: AsRef<str>,
        U: AsRef<str>,
    {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut buckets: [Vec<String>; BUCKET_COUNT] = Default::default();

        let words = builtin_words
            .iter()
            .map(AsRef::as_ref)
            .chain(user_words.iter().map(AsRef::as_ref));

        for word in words {
            if !seen.insert(word) || !is_indexable_entry(word) {
                continue;
            }
            let Some(slot) = word.chars().next().and_then(bucket_slot) else {
                continue;
            };
            buckets[slot].push(word.to_string());
        }

        Self { buckets }
    }

    /// Words stored under `letter`, in rebuild order.
    pub fn bucket(&self, letter: char) -> &[String] {
        match bucket_slot(letter) {
            Some(slot) => &self.buckets[slot],
            None => &[],
        }
    }

    /// Iterates `(letter, words)` for all 26 buckets, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (char, &[String])> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(slot, words)| ((b'a' + slot as u8) as char, words.as_slice()))
    }

    /// Total number of indexed words.
    pub fn word_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Word index owning the current buckets.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    buckets: Arc<LetterBuckets>,
    version: u64,
}

impl WordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole index with one built from the given sources.
    pub fn rebuild<B, U>(&mut self, builtin_words: &[B], user_words: &[U])
    where
        B: AsRef<str>,
        U: AsRef<str>,
    {
        self.install(LetterBuckets::from_sources(builtin_words, user_words));
    }

    /// Installs prebuilt buckets, bumping the version.
    pub fn install(&mut self, buckets: LetterBuckets) {
        self.buckets = Arc::new(buckets);
        self.version += 1;
    }

    /// Returns an owned copy of the bucket for `letter` (case-insensitive).
    ///
    /// Non-alphabetic letters yield an empty list.
    pub fn lookup(&self, letter: char) -> Vec<String> {
        self.buckets.bucket(letter).to_vec()
    }

    /// Number of rebuilds applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn buckets(&self) -> Arc<LetterBuckets> {
        Arc::clone(&self.buckets)
    }

    pub fn word_count(&self) -> usize {
        self.buckets.word_count()
    }
}

/// Thread-safe handle to a `WordIndex`.
#[derive(Debug, Clone, Default)]
pub struct SharedWordIndex {
    inner: Arc<RwLock<WordIndex>>,
}

impl SharedWordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds outside the lock, then swaps the result in.
    ///
    /// Returns the new index version.
    pub fn rebuild<B, U>(&self, builtin_words: &[B], user_words: &[U]) -> u64
    where
        B: AsRef<str>,
        U: AsRef<str>,
    {
        let buckets = LetterBuckets::from_sources(builtin_words, user_words);
        let word_count = buckets.word_count();

        let mut index = self.inner.write();
        index.install(buckets);
        debug!("Installed word index v{} with {} words", index.version(), word_count);
        index.version()
    }

    pub fn lookup(&self, letter: char) -> Vec<String> {
        self.inner.read().lookup(letter)
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version()
    }

    pub fn word_count(&self) -> usize {
        self.inner.read().word_count()
    }

    /// Snapshot of the current buckets; later rebuilds do not affect it.
    pub fn snapshot(&self) -> Arc<LetterBuckets> {
        self.inner.read().buckets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_letter() {
        assert_eq!(bucket_letter('a'), Some('a'));
        assert_eq!(bucket_letter('Q'), Some('q'));
        assert_eq!(bucket_letter('1'), None);
        assert_eq!(bucket_letter('_'), None);
        assert_eq!(bucket_letter('é'), None);
        // Lowercases to "i" plus a combining dot
        assert_eq!(bucket_letter('İ'), None);
    }

    #[test]
    fn test_empty_index_has_all_buckets() {
        let buckets = LetterBuckets::from_sources::<&str, &str>(&[], &[]);
        let letters: Vec<char> = buckets.iter().map(|(letter, _)| letter).collect();
        assert_eq!(letters.len(), BUCKET_COUNT);
        assert_eq!(letters.first(), Some(&'a'));
        assert_eq!(letters.last(), Some(&'z'));
        assert!(buckets.iter().all(|(_, words)| words.is_empty()));
    }

    #[test]
    fn test_filters_comments_empty_and_non_letters() {
        let buckets = LetterBuckets::from_sources(
            &["", "// header", "42nd", "_private", "élan", "kept"],
            &["/not a comment"],
        );
        assert_eq!(buckets.word_count(), 1);
        assert_eq!(buckets.bucket('k'), ["kept".to_string()]);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let buckets = LetterBuckets::from_sources(&["apple", "Apple"], &["apple"]);
        assert_eq!(buckets.bucket('a'), ["apple".to_string(), "Apple".to_string()]);
    }

    #[test]
    fn test_user_words_follow_builtin() {
        let buckets = LetterBuckets::from_sources(&["cat"], &["cow", "Crab"]);
        assert_eq!(buckets.bucket('C'), ["cat", "cow", "Crab"].map(String::from));
    }

    #[test]
    fn test_rebuild_bumps_version_and_replaces() {
        let mut index = WordIndex::new();
        assert_eq!(index.version(), 0);

        index.rebuild(&["alpha", "beta"], &[] as &[&str]);
        assert_eq!(index.version(), 1);
        assert_eq!(index.word_count(), 2);

        index.rebuild(&["gamma"], &[] as &[&str]);
        assert_eq!(index.version(), 2);
        assert!(index.lookup('a').is_empty());
        assert_eq!(index.lookup('g'), vec!["gamma".to_string()]);
    }

    #[test]
    fn test_lookup_returns_owned_copy() {
        let mut index = WordIndex::new();
        index.rebuild(&["apple"], &[] as &[&str]);

        let mut words = index.lookup('A');
        words[0].make_ascii_uppercase();

        assert_eq!(index.lookup('a'), vec!["apple".to_string()]);
    }

    #[test]
    fn test_shared_snapshot_survives_rebuild() {
        let shared = SharedWordIndex::new();
        shared.rebuild(&["old"], &[] as &[&str]);
        let snapshot = shared.snapshot();

        let version = shared.rebuild(&["new"], &[] as &[&str]);

        assert_eq!(version, 2);
        assert_eq!(snapshot.bucket('o'), ["old".to_string()]);
        assert_eq!(shared.lookup('n'), vec!["new".to_string()]);
        assert!(shared.lookup('o').is_empty());
    }
}
