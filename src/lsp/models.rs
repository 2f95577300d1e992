use ropey::Rope;

use tower_lsp::lsp_types::Url;

use crate::lsp::features::completion::DocumentMode;

/// State for an open text document managed by the LSP server.
#[derive(Debug)]
pub struct LspDocumentState {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

/// LSP document with state for open files.
#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub language_id: String,
    /// Completion mode derived from `language_id`; `None` disables completion
    pub mode: Option<DocumentMode>,
    pub state: tokio::sync::RwLock<LspDocumentState>,
}
