//! External user dictionary support: file watching, save detection and the
//! `dictCompletion.openUserDict` command.

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{MessageType, ShowDocumentParams, Url};
use tracing::{debug, error, info, warn};

use super::state::DictionaryBackend;
use crate::lsp::features::completion::word_sources::{ensure_user_dictionary, is_user_dictionary};
use crate::lsp::settings::SettingKey;

/// Command that opens the user dictionary for editing.
pub const OPEN_USER_DICT_COMMAND: &str = "dictCompletion.openUserDict";

impl DictionaryBackend {
    fn external_mode(&self) -> bool {
        self.settings.read().external_user_dict_file
    }

    /// Whether `path` is the external user dictionary and external mode is on.
    pub(super) fn is_active_user_dictionary(&self, path: &Path) -> bool {
        match self.user_dict_path.as_deref() {
            Some(dict) => self.external_mode() && is_user_dictionary(path, dict),
            None => false,
        }
    }

    /// Rebuilds the index after the user dictionary file changed.
    pub(super) fn reload_user_dictionary(&self, trigger: &str) {
        if !self.external_mode() {
            debug!("Ignoring user dictionary {} outside external mode", trigger);
            return;
        }
        info!("User dictionary changed ({}), rebuilding", trigger);
        self.rebuild_index();
    }

    /// Starts watching the user dictionary directory in external mode, and
    /// stops watching otherwise.
    pub(super) fn refresh_user_dict_watcher(&self) {
        let mut guard = self.user_dict_watcher.lock();

        if !self.external_mode() {
            if guard.take().is_some() {
                debug!("Stopped watching user dictionary");
            }
            return;
        }
        if guard.is_some() {
            return;
        }

        let Some(path) = self.user_dict_path.clone() else {
            return;
        };
        let Some(dir) = path.parent().filter(|dir| dir.is_dir()) else {
            debug!("User dictionary directory for {:?} does not exist yet", path);
            return;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )
        .and_then(|mut watcher| watcher.watch(dir, RecursiveMode::NonRecursive).map(|_| watcher));

        match watcher {
            Ok(watcher) => {
                *guard = Some(watcher);
                Self::spawn_user_dict_listener(self.clone(), rx);
                info!("Watching user dictionary {:?}", path);
            }
            Err(e) => warn!("Failed to watch directory {:?}: {}", dir, e),
        }
    }

    /// Consumes watcher events until the watcher (and with it the sender) is dropped.
    fn spawn_user_dict_listener(backend: DictionaryBackend, mut rx: UnboundedReceiver<notify::Result<Event>>) {
        tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                match result {
                    Ok(event) => {
                        let relevant = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                            && event.paths.iter().any(|path| backend.is_active_user_dictionary(path));
                        if relevant {
                            backend.reload_user_dictionary("file watcher");
                        }
                    }
                    Err(e) => warn!("User dictionary watch error: {}", e),
                }
            }
            debug!("User dictionary listener stopped");
        });
    }

    pub(super) fn stop_user_dict_watcher(&self) {
        self.user_dict_watcher.lock().take();
    }

    /// Opens the user dictionary: the external file (created if missing) is
    /// shown in the editor; in inline mode the client is pointed at the
    /// `userDictionary` setting instead.
    pub(super) async fn open_user_dictionary(&self) -> jsonrpc::Result<Option<Value>> {
        if !self.external_mode() {
            let setting = SettingKey::UserDictionary.as_str();
            self.client
                .show_message(MessageType::INFO, format!("User words are kept in the `{}` setting", setting))
                .await;
            return Ok(Some(json!({ "setting": setting })));
        }

        let Some(path) = self.user_dict_path.clone() else {
            return Err(jsonrpc::Error::invalid_request());
        };
        match ensure_user_dictionary(&path) {
            Ok(true) => {
                info!("Created user dictionary {:?}", path);
                self.refresh_user_dict_watcher();
            }
            Ok(false) => {}
            Err(e) => {
                error!("{}", e);
                return Err(jsonrpc::Error {
                    code: jsonrpc::ErrorCode::InternalError,
                    message: e.to_string().into(),
                    data: None,
                });
            }
        }

        let uri = Url::from_file_path(&path)
            .map_err(|_| jsonrpc::Error::invalid_params(format!("Not an absolute path: {:?}", path)))?;
        let params = ShowDocumentParams {
            uri: uri.clone(),
            external: Some(false),
            take_focus: Some(true),
            selection: None,
        };
        match self.client.show_document(params).await {
            Ok(true) => debug!("Opened {}", uri),
            Ok(false) => warn!("Client did not open {}", uri),
            Err(e) => warn!("window/showDocument failed for {}: {}", uri, e),
        }
        Ok(Some(json!({ "uri": uri.as_str() })))
    }
}
