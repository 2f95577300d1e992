use ropey::Rope;

use tower_lsp::lsp_types::{Position, PositionEncodingKind, TextDocumentContentChangeEvent, Url};

use crate::lsp::features::completion::DocumentMode;
use crate::lsp::features::traits::{line_content_len, rope_char_index, CursorPosition};

pub use crate::lsp::models::{LspDocument, LspDocumentState};

/// Unit of `Position.character` agreed with the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionEncoding {
    /// Protocol default
    #[default]
    Utf16,
    Utf32,
}

impl PositionEncoding {
    /// Picks UTF-32 when the client offers it, else the UTF-16 default.
    pub fn negotiate(offered: Option<&[PositionEncodingKind]>) -> Self {
        match offered {
            Some(kinds) if kinds.contains(&PositionEncodingKind::UTF32) => Self::Utf32,
            _ => Self::Utf16,
        }
    }

    pub fn kind(&self) -> PositionEncodingKind {
        match self {
            Self::Utf16 => PositionEncodingKind::UTF16,
            Self::Utf32 => PositionEncodingKind::UTF32,
        }
    }
}

/// Converts an LSP position to a cursor whose column counts chars.
///
/// UTF-16 columns past the end of the line clamp to the line end; a column
/// inside a surrogate pair resolves to the char holding it.
pub fn cursor_position(text: &Rope, position: &Position, encoding: PositionEncoding) -> CursorPosition {
    let line = position.line as usize;
    let character = position.character as usize;
    if encoding == PositionEncoding::Utf32 || line >= text.len_lines() {
        return CursorPosition::new(line, character);
    }

    let line_start = text.line_to_char(line);
    let line_end = line_start + line_content_len(text, line);
    let start_cu = text.char_to_utf16_cu(line_start);
    let end_cu = text.char_to_utf16_cu(line_end);
    let target_cu = (start_cu + character).min(end_cu);
    CursorPosition::new(line, text.utf16_cu_to_char(target_cu) - line_start)
}

/// Converts an LSP position to a char index in the Rope, clamped to the text.
fn position_to_char_index(position: &Position, text: &Rope, encoding: PositionEncoding) -> usize {
    rope_char_index(text, cursor_position(text, position, encoding))
}

impl LspDocumentState {
    /// Applies a list of content changes, updating the text.
    /// Fails without touching the text if `version` is not newer.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
        encoding: PositionEncoding,
    ) -> Result<(), String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = position_to_char_index(&range.start, &self.text, encoding);
                    let end = position_to_char_index(&range.end, &self.text, encoding).max(start);
                    self.text.remove(start..end);
                    self.text.insert(start, &change.text);
                }
                None => self.text = Rope::from_str(&change.text),
            }
        }
        self.version = version;
        Ok(())
    }
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, language_id: &str, text: &str, version: i32) -> Self {
        Self {
            id,
            language_id: language_id.to_string(),
            mode: DocumentMode::from_language_id(language_id),
            state: tokio::sync::RwLock::new(LspDocumentState {
                uri,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    /// Returns the URI of the document.
    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies changes to the document. Returns `false` if they were rejected.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
        encoding: PositionEncoding,
    ) -> bool {
        let mut state = self.state.write().await;
        state.apply(changes, version, encoding).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn create_test_document(text: &str) -> LspDocument {
        LspDocument::new(1, Url::parse("file:///notes.md").unwrap(), "markdown", text, 0)
    }

    fn replace(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mode_from_language_id() {
        let doc = create_test_document("");
        assert_eq!(doc.mode, Some(DocumentMode::Markup));

        let other = LspDocument::new(2, Url::parse("file:///main.rs").unwrap(), "rust", "", 0);
        assert_eq!(other.mode, None);
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        assert!(doc.apply(changes, 1, PositionEncoding::Utf16).await);
        assert_eq!(doc.text().await, "new text");
        assert_eq!(doc.version().await, 1);
    }

    #[tokio::test]
    async fn test_apply_incremental_changes() {
        let doc = create_test_document("hello world\nsecond");
        let changes = vec![replace((0, 6), (0, 11), "rust"), replace((1, 0), (1, 0), "a ")];

        assert!(doc.apply(changes, 1, PositionEncoding::Utf16).await);
        assert_eq!(doc.text().await, "hello rust\na second");
    }

    #[tokio::test]
    async fn test_apply_outdated_version() {
        let doc = create_test_document("initial text");
        assert!(doc.apply(vec![replace((0, 0), (0, 7), "final")], 2, PositionEncoding::Utf16).await);
        assert!(!doc.apply(vec![replace((0, 0), (0, 5), "x")], 1, PositionEncoding::Utf16).await);
        assert_eq!(doc.text().await, "final text");
        assert_eq!(doc.version().await, 2);
    }

    #[test]
    fn test_utf16_columns_after_astral_char() {
        let rope = Rope::from_str("😀 ap xyz\nplain");
        // The emoji is two UTF-16 code units but one char
        let cursor = cursor_position(&rope, &Position::new(0, 5), PositionEncoding::Utf16);
        assert_eq!(cursor, CursorPosition::new(0, 4));

        let utf32 = cursor_position(&rope, &Position::new(0, 4), PositionEncoding::Utf32);
        assert_eq!(utf32, CursorPosition::new(0, 4));

        let past_end = cursor_position(&rope, &Position::new(0, 40), PositionEncoding::Utf16);
        assert_eq!(past_end, CursorPosition::new(0, 8));
        assert_eq!(
            cursor_position(&rope, &Position::new(1, 3), PositionEncoding::Utf16),
            CursorPosition::new(1, 3)
        );
    }

    #[test]
    fn test_negotiate_encoding() {
        let offered = [PositionEncodingKind::UTF8, PositionEncodingKind::UTF32];
        assert_eq!(PositionEncoding::negotiate(Some(&offered[..])), PositionEncoding::Utf32);
        assert_eq!(
            PositionEncoding::negotiate(Some(&[PositionEncodingKind::UTF16][..])),
            PositionEncoding::Utf16
        );
        assert_eq!(PositionEncoding::negotiate(None), PositionEncoding::Utf16);
    }

    #[tokio::test]
    async fn test_utf16_edit_after_emoji() {
        let doc = create_test_document("😀 x\n");
        assert!(doc.apply(vec![replace((0, 3), (0, 4), "ap")], 1, PositionEncoding::Utf16).await);
        assert_eq!(doc.text().await, "😀 ap\n");
    }

    #[tokio::test]
    async fn test_out_of_range_positions_are_clamped() {
        let doc = create_test_document("short");
        assert!(doc.apply(vec![replace((0, 50), (3, 0), "!")], 1, PositionEncoding::Utf16).await);
        assert_eq!(doc.text().await, "short!");
    }
}
