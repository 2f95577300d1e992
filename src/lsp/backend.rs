use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::ConfigurationItem;
use tracing::{debug, info, warn};

use crate::lsp::document::PositionEncoding;
use crate::lsp::features::completion::{DictionaryCompleter, DictionaryError, SharedWordIndex};
use crate::lsp::features::completion::word_sources::{collect_user_words, default_user_dict_path, load_builtin_words};
use crate::lsp::settings::{DictCompletionSettings, SettingKey, SETTINGS_SECTION};

mod handlers;
mod state;
mod user_dictionary;

pub use state::DictionaryBackend;
pub use user_dictionary::OPEN_USER_DICT_COMMAND;

/// Startup inputs for the backend, resolved before the server starts.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub builtin_words: Arc<Vec<String>>,
    /// External user dictionary location
    pub user_dict_path: Option<PathBuf>,
}

impl BackendConfig {
    /// Loads the built-in word list (compiled in unless `word_list` is given)
    /// and resolves the user dictionary path (default location unless `user_dict` is given).
    pub fn load(word_list: Option<&Path>, user_dict: Option<PathBuf>) -> Result<Self, DictionaryError> {
        let builtin_words = load_builtin_words(word_list)?;
        let user_dict_path = match user_dict {
            Some(path) => Some(path),
            None => match default_user_dict_path() {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("External user dictionary unavailable: {}", e);
                    None
                }
            },
        };
        debug!("Loaded {} built-in word list entries", builtin_words.len());
        Ok(Self::with_words(builtin_words, user_dict_path))
    }

    pub fn with_words(builtin_words: Vec<String>, user_dict_path: Option<PathBuf>) -> Self {
        Self {
            builtin_words: Arc::new(builtin_words),
            user_dict_path,
        }
    }
}

impl DictionaryBackend {
    /// Creates the backend and builds the initial index from default settings.
    pub fn new(client: Client, config: BackendConfig) -> Self {
        let backend = Self {
            client,
            documents_by_uri: Arc::new(DashMap::new()),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            settings: Arc::new(RwLock::new(DictCompletionSettings::default())),
            position_encoding: Arc::new(RwLock::new(PositionEncoding::default())),
            completer: DictionaryCompleter::new(SharedWordIndex::new()),
            rebuild_lock: Arc::new(Mutex::new(())),
            builtin_words: config.builtin_words,
            user_dict_path: config.user_dict_path,
            user_dict_watcher: Arc::new(Mutex::new(None)),
        };
        backend.rebuild_index();
        backend
    }

    /// Generates the next unique document ID.
    pub(super) fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> DictCompletionSettings {
        self.settings.read().clone()
    }

    pub fn position_encoding(&self) -> PositionEncoding {
        *self.position_encoding.read()
    }

    /// Version of the installed word index; bumps on every rebuild.
    pub fn index_version(&self) -> u64 {
        self.completer.index().version()
    }

    pub fn word_count(&self) -> usize {
        self.completer.index().word_count()
    }

    pub fn user_dict_path(&self) -> Option<&Path> {
        self.user_dict_path.as_deref()
    }

    /// Rebuilds the word index from the built-in words and the user words the
    /// current settings select. An unreadable user dictionary contributes no
    /// words.
    ///
    /// Rebuilds are serialized and read the settings only once they hold the
    /// rebuild lock, so the last install always reflects the latest settings.
    pub(super) fn rebuild_index(&self) -> u64 {
        let _rebuilding = self.rebuild_lock.lock();
        let settings = self.settings();
        let user_words = match collect_user_words(&settings, self.user_dict_path.as_deref()) {
            Ok(words) => words,
            Err(e) => {
                warn!("Rebuilding without user words: {}", e);
                Vec::new()
            }
        };

        let version = self.completer.index().rebuild(self.builtin_words.as_slice(), &user_words);
        info!(
            "Word index v{} ready: {} words ({} user entries, external={})",
            version,
            self.word_count(),
            user_words.len(),
            settings.external_user_dict_file
        );
        version
    }

    /// Replaces the settings, rebuilding the index and the user dictionary
    /// watch when the changed keys call for it. Returns the changed keys.
    pub(super) fn apply_settings(&self, updated: DictCompletionSettings) -> Vec<SettingKey> {
        let changed = {
            let mut settings = self.settings.write();
            let changed = settings.changed_keys(&updated);
            *settings = updated.clone();
            changed
        };
        if changed.is_empty() {
            debug!("Settings unchanged");
            return changed;
        }

        info!(
            "Settings changed: {}",
            changed.iter().map(SettingKey::as_str).collect::<Vec<_>>().join(", ")
        );
        if updated.requires_rebuild(&changed) {
            self.rebuild_index();
        }
        if changed.contains(&SettingKey::ExternalUserDictFile) {
            self.refresh_user_dict_watcher();
        }
        changed
    }

    /// Pulls the `dictCompletion` section with `workspace/configuration`.
    pub(super) async fn pull_settings(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(SETTINGS_SECTION.to_string()),
        }];
        match self.client.configuration(items).await {
            Ok(values) => match values.into_iter().next() {
                Some(value) if !value.is_null() => {
                    // The response is the section itself, never wrapped.
                    let wrapped = serde_json::json!({ SETTINGS_SECTION: value });
                    self.apply_settings(DictCompletionSettings::from_value(&wrapped));
                }
                _ => debug!("Client returned no {} configuration", SETTINGS_SECTION),
            },
            Err(e) => debug!("workspace/configuration failed: {}", e),
        }
    }
}
