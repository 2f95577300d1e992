//! Dictionary word completion
//!
//! This module provides:
//! - A first-letter word index rebuilt wholesale from built-in and user words
//! - Per-mode cursor context guards (Markdown, LaTeX, HTML)
//! - Casing and trailing-space rules for suggestions
//! - Loading of the built-in word list and the user dictionary

pub mod context;
pub mod dictionary;
pub mod provider;
pub mod suggestions;
pub mod word_sources;

pub use context::{CompletionRejected, DocumentMode, extract_lookup_key, should_suppress};
pub use dictionary::{LetterBuckets, SharedWordIndex, WordIndex};
pub use provider::{DictionaryCompleter, LineContext};
pub use suggestions::{Suggestion, SuggestionKind, build_suggestions};
pub use word_sources::DictionaryError;
