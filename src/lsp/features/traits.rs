//! Narrow host interfaces for dictionary completion
//!
//! The completion core never touches the LSP document store, the settings
//! payload or the response types directly. It goes through these traits:
//!
//! ```text
//! ┌──────────────────────┐   line text, prefix    ┌──────────────────────┐
//! │  DocumentSource      │ ─────────────────────▶ │                      │
//! ├──────────────────────┤   thresholds, flags    │  DictionaryCompleter │
//! │  SettingsStore       │ ─────────────────────▶ │                      │
//! ├──────────────────────┤   suggestions          │                      │
//! │  SuggestionSink      │ ◀───────────────────── │                      │
//! └──────────────────────┘                        └──────────────────────┘
//! ```

use ropey::Rope;
use tower_lsp::lsp_types::CompletionItem;

use super::completion::suggestions::Suggestion;

/// Zero-based cursor location, with `column` counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Start of the document.
    pub fn origin() -> Self {
        Self::default()
    }
}

/// Read access to the text of one document.
pub trait DocumentSource {
    /// Text of `line` without its line terminator, or `None` past the end.
    fn line_text(&self, line: usize) -> Option<String>;

    /// Text between two positions. Out-of-range positions are clamped.
    fn text_range(&self, start: CursorPosition, end: CursorPosition) -> String;
}

/// Read access to the completion settings.
pub trait SettingsStore {
    fn external_user_dict_file(&self) -> bool;
    fn user_dictionary(&self) -> &[String];
    fn least_num_of_chars(&self) -> usize;
    fn add_space_after_completion(&self) -> bool;
}

/// Receiver of completion suggestions.
pub trait SuggestionSink {
    fn push(&mut self, suggestion: Suggestion);
}

impl SuggestionSink for Vec<Suggestion> {
    fn push(&mut self, suggestion: Suggestion) {
        Vec::push(self, suggestion);
    }
}

impl SuggestionSink for Vec<CompletionItem> {
    fn push(&mut self, suggestion: Suggestion) {
        Vec::push(self, suggestion.into());
    }
}

/// Converts a cursor position to a char index, clamping to the line end.
pub(crate) fn rope_char_index(text: &Rope, position: CursorPosition) -> usize {
    if position.line >= text.len_lines() {
        return text.len_chars();
    }
    let line_start = text.line_to_char(position.line);
    let line_len = line_content_len(text, position.line);
    line_start + position.column.min(line_len)
}

/// Number of chars on `line`, excluding its `\n`, `\r\n` or `\r` terminator.
///
/// Ropey is built with only `cr_lines`, so its line breaks are exactly the
/// protocol's three.
pub(crate) fn line_content_len(text: &Rope, line: usize) -> usize {
    let slice = text.line(line);
    let mut len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' {
        len -= 1;
    }
    if len > 0 && slice.char(len - 1) == '\r' {
        len -= 1;
    }
    len
}

impl DocumentSource for Rope {
    fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.len_lines() {
            return None;
        }
        let len = line_content_len(self, line);
        Some(self.line(line).slice(..len).to_string())
    }

    fn text_range(&self, start: CursorPosition, end: CursorPosition) -> String {
        let start = rope_char_index(self, start);
        let end = rope_char_index(self, end).max(start);
        self.slice(start..end).to_string()
    }
}

impl DocumentSource for str {
    fn line_text(&self, line: usize) -> Option<String> {
        Rope::from_str(self).line_text(line)
    }

    fn text_range(&self, start: CursorPosition, end: CursorPosition) -> String {
        Rope::from_str(self).text_range(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rope_line_text() {
        let rope = Rope::from_str("first\r\nsecond\nthird");
        assert_eq!(rope.line_text(0).as_deref(), Some("first"));
        assert_eq!(rope.line_text(1).as_deref(), Some("second"));
        assert_eq!(rope.line_text(2).as_deref(), Some("third"));
        assert_eq!(rope.line_text(3), None);
    }

    #[test]
    fn test_only_protocol_line_breaks() {
        let rope = Rope::from_str("intro\u{000C}text\u{2028}more\rlone\nap");
        assert_eq!(rope.len_lines(), 3);
        assert_eq!(rope.line_text(0).as_deref(), Some("intro\u{000C}text\u{2028}more"));
        assert_eq!(rope.line_text(1).as_deref(), Some("lone"));
        assert_eq!(rope.line_text(2).as_deref(), Some("ap"));
        assert_eq!(rope_char_index(&rope, CursorPosition::new(0, 99)), 15);

        let text = "intro\u{000C}text\rap";
        assert_eq!(text.line_text(1), rope.line_text(2));
        assert_eq!(text.line_text(1).as_deref(), Some("ap"));
    }

    #[test]
    fn test_rope_text_range_clamps() {
        let rope = Rope::from_str("<style>\nbody{ co\n");
        let prefix = rope.text_range(CursorPosition::origin(), CursorPosition::new(1, 8));
        assert_eq!(prefix, "<style>\nbody{ co");

        let clamped = rope.text_range(CursorPosition::origin(), CursorPosition::new(0, 99));
        assert_eq!(clamped, "<style>");
    }

    #[test]
    fn test_str_source_matches_rope() {
        let text = "intro\r\n<script>le";
        assert_eq!(text.line_text(1).as_deref(), Some("<script>le"));
        assert_eq!(text.line_text(2), None);
        assert_eq!(
            text.text_range(CursorPosition::origin(), CursorPosition::new(1, 8)),
            Rope::from_str(text).text_range(CursorPosition::origin(), CursorPosition::new(1, 8))
        );
    }

    #[test]
    fn test_sinks() {
        let mut plain: Vec<Suggestion> = Vec::new();
        SuggestionSink::push(&mut plain, Suggestion::new("word".to_string(), false));
        assert_eq!(plain.len(), 1);

        let mut items: Vec<CompletionItem> = Vec::new();
        SuggestionSink::push(&mut items, Suggestion::new("word".to_string(), true));
        assert_eq!(items[0].insert_text.as_deref(), Some("word "));
    }
}
