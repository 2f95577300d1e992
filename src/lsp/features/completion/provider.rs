//! Completion pipeline: cursor context → gate → bucket lookup → suggestions.

use tracing::trace;

use super::context::{extract_lookup_key, should_suppress, CompletionRejected, DocumentMode};
use super::dictionary::SharedWordIndex;
use super::suggestions::build_suggestions;
use crate::lsp::features::traits::{CursorPosition, DocumentSource, SettingsStore, SuggestionSink};

/// Text around the cursor on its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineContext {
    /// Line text up to the cursor
    pub text_before: String,
    /// Character right after the cursor, `None` at the end of the line
    pub following_char: Option<char>,
}

impl LineContext {
    pub fn from_line(line_text: &str, column: usize) -> Self {
        let text_before = line_text.chars().take(column).collect();
        let following_char = line_text.chars().nth(column);
        Self {
            text_before,
            following_char,
        }
    }
}

/// Dictionary completion provider over a shared word index.
#[derive(Debug, Clone, Default)]
pub struct DictionaryCompleter {
    index: SharedWordIndex,
}

impl DictionaryCompleter {
    pub fn new(index: SharedWordIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &SharedWordIndex {
        &self.index
    }

    /// Pushes the suggestions for `cursor` into `sink`.
    ///
    /// Returns the number of suggestions, or an error when the lookup is
    /// impossible in this context (HTML `<style>`/`<script>` blocks).
    pub fn complete<D, S, K>(
        &self,
        mode: DocumentMode,
        document: &D,
        cursor: CursorPosition,
        settings: &S,
        sink: &mut K,
    ) -> Result<usize, CompletionRejected>
    where
        D: DocumentSource + ?Sized,
        S: SettingsStore + ?Sized,
        K: SuggestionSink + ?Sized,
    {
        let line_text = document.line_text(cursor.line).unwrap_or_default();
        let line = LineContext::from_line(&line_text, cursor.column);
        self.complete_line(mode, &line, settings, sink, || {
            document.text_range(CursorPosition::origin(), cursor)
        })
    }

    /// Same as [`complete`](Self::complete) for an already extracted line.
    ///
    /// `document_before` must yield the document text from its start to the
    /// cursor; it is only called for HTML.
    pub fn complete_line<S, K, F>(
        &self,
        mode: DocumentMode,
        line: &LineContext,
        settings: &S,
        sink: &mut K,
        document_before: F,
    ) -> Result<usize, CompletionRejected>
    where
        S: SettingsStore + ?Sized,
        K: SuggestionSink + ?Sized,
        F: FnOnce() -> String,
    {
        let word = extract_lookup_key(&line.text_before);
        if word.chars().count() < settings.least_num_of_chars() {
            trace!("Typed word {:?} is below the minimum length", word);
            return Ok(0);
        }

        if should_suppress(mode, &line.text_before, document_before)? {
            return Ok(0);
        }

        let Some(first_letter) = word.chars().next() else {
            return Ok(0);
        };

        let suggestions = build_suggestions(
            self.index.lookup(first_letter),
            first_letter,
            line.following_char,
            settings.add_space_after_completion(),
        );
        let count = suggestions.len();
        for suggestion in suggestions {
            sink.push(suggestion);
        }
        Ok(count)
    }
}
