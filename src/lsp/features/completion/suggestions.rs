//! Suggestion construction: casing and trailing-space rules applied to a
//! bucket of dictionary words.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

/// Characters after the cursor that already separate words, so no space is
/// appended in front of them.
pub const PUNCTUATION_AFTER_CURSOR: &[char] = &[' ', ',', '.', ':', ';', '?', '!', '-'];

/// Kind reported to the host for every dictionary suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    PlainText,
}

/// A single completion suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Text shown in the completion list
    pub label: String,
    /// Text inserted on accept; equals `label` unless a space is appended
    pub insert_text: String,
    pub kind: SuggestionKind,
}

impl Suggestion {
    pub fn new(label: String, append_space: bool) -> Self {
        let insert_text = if append_space {
            format!("{label} ")
        } else {
            label.clone()
        };
        Self {
            label,
            insert_text,
            kind: SuggestionKind::PlainText,
        }
    }
}

impl From<Suggestion> for CompletionItem {
    fn from(suggestion: Suggestion) -> Self {
        let insert_text = (suggestion.insert_text != suggestion.label).then_some(suggestion.insert_text);
        let kind = match suggestion.kind {
            SuggestionKind::PlainText => CompletionItemKind::TEXT,
        };
        CompletionItem {
            label: suggestion.label,
            kind: Some(kind),
            insert_text,
            ..Default::default()
        }
    }
}

/// Whether a space should follow an accepted suggestion.
///
/// `following_char` is `None` at the end of a line, which counts as
/// "not punctuated".
pub fn should_append_space(add_space_setting: bool, following_char: Option<char>) -> bool {
    add_space_setting && !following_char.is_some_and(|c| PUNCTUATION_AFTER_CURSOR.contains(&c))
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds suggestions from bucket words.
///
/// An uppercase `typed_first_letter` capitalizes every label; anything else
/// keeps the stored case. Every suggestion is a fresh value.
pub fn build_suggestions(
    bucket_words: Vec<String>,
    typed_first_letter: char,
    following_char: Option<char>,
    add_space_setting: bool,
) -> Vec<Suggestion> {
    let append_space = should_append_space(add_space_setting, following_char);
    let capitalize = typed_first_letter.is_uppercase();

    bucket_words
        .into_iter()
        .map(|word| {
            let label = if capitalize { capitalize_first(&word) } else { word };
            Suggestion::new(label, append_space)
        })
        .collect()
}
