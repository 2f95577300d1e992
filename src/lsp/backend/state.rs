//! Backend state management
//!
//! This module defines the DictionaryBackend struct, which holds all state for
//! the LSP server: open documents, client settings, the word index and the
//! watcher on the external user dictionary.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use dashmap::DashMap;
use notify::RecommendedWatcher;
use parking_lot::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::lsp::document::PositionEncoding;
use crate::lsp::features::completion::DictionaryCompleter;
use crate::lsp::models::LspDocument;
use crate::lsp::settings::DictCompletionSettings;

/// The dictionary completion language server backend.
#[derive(Clone)]
pub struct DictionaryBackend {
    pub(super) client: Client,
    pub(super) documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    pub(super) settings: Arc<RwLock<DictCompletionSettings>>,
    /// Negotiated in `initialize`
    pub(super) position_encoding: Arc<RwLock<PositionEncoding>>,
    pub(super) completer: DictionaryCompleter,
    /// Held across settings snapshot, build and install of each rebuild
    pub(super) rebuild_lock: Arc<Mutex<()>>,
    /// Built-in words, loaded once at startup
    pub(super) builtin_words: Arc<Vec<String>>,
    /// External user dictionary location; `None` without a config directory
    pub(super) user_dict_path: Option<PathBuf>,
    pub(super) user_dict_watcher: Arc<Mutex<Option<RecommendedWatcher>>>,
}

// Manual Debug implementation since Client and the watcher don't implement Debug
impl std::fmt::Debug for DictionaryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryBackend")
            .field("documents_count", &self.documents_by_uri.len())
            .field("index_version", &self.completer.index().version())
            .field("user_dict_path", &self.user_dict_path)
            .finish()
    }
}
