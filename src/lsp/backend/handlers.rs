//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for the
//! dictionary backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_save, did_close)
//! - Settings updates (did_change_configuration)
//! - Completion and the user dictionary command

use std::sync::Arc;

use serde_json::Value;
use tower_lsp::{LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, CompletionItem,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, InitializedParams, InitializeParams, InitializeResult, SaveOptions,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, TextDocumentSyncSaveOptions,
};
use tower_lsp::jsonrpc::Result as LspResult;

use tracing::{debug, info, trace, warn};

use super::state::DictionaryBackend;
use super::user_dictionary::OPEN_USER_DICT_COMMAND;
use crate::lsp::document::{cursor_position, PositionEncoding};
use crate::lsp::features::completion::CompletionRejected;
use crate::lsp::models::LspDocument;
use crate::lsp::settings::DictCompletionSettings;

/// JSON-RPC `RequestFailed`: the request was valid but cannot be served here.
const REQUEST_FAILED: i64 = -32803;

fn rejection_error(rejected: CompletionRejected) -> jsonrpc::Error {
    jsonrpc::Error {
        code: jsonrpc::ErrorCode::ServerError(REQUEST_FAILED),
        message: rejected.to_string().into(),
        data: None,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for DictionaryBackend {
    /// Handles the LSP initialize request: negotiates the position encoding,
    /// reads settings from the initialization options and builds the word index.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!(
            "Received initialize from {}",
            params.client_info.as_ref().map(|info| info.name.as_str()).unwrap_or("unknown client")
        );

        let encoding = PositionEncoding::negotiate(
            params
                .capabilities
                .general
                .as_ref()
                .and_then(|general| general.position_encodings.as_deref()),
        );
        *self.position_encoding.write() = encoding;
        debug!("Position encoding: {:?}", encoding);

        if let Some(options) = params.initialization_options.as_ref() {
            if DictCompletionSettings::section(options).is_some() {
                *self.settings.write() = DictCompletionSettings::from_value(options);
            }
        }
        self.rebuild_index();
        self.refresh_user_dict_watcher();

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                position_encoding: Some(encoding.kind()),
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(false),
                    })),
                    ..Default::default()
                })),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![OPEN_USER_DICT_COMMAND.to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Handles the LSP initialized notification, pulling settings the client
    /// did not pass at initialization.
    async fn initialized(&self, _params: InitializedParams) {
        info!("Initialized with {} words indexed", self.word_count());
        self.pull_settings().await;
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        self.stop_user_dict_watcher();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        info!(
            "Opening document: URI={}, language={}, version={}",
            item.uri, item.language_id, item.version
        );

        let document = Arc::new(LspDocument::new(
            self.next_document_id(),
            item.uri.clone(),
            &item.language_id,
            &item.text,
            item.version,
        ));
        if document.mode.is_none() {
            debug!("No completion mode for language {}", item.language_id);
        }
        self.documents_by_uri.insert(item.uri, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        trace!("textDocument/didChange: {:?}", params);
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if let Some(document) = self.documents_by_uri.get(&uri).map(|r| r.value().clone()) {
            if !document.apply(params.content_changes, version, self.position_encoding()).await {
                warn!("Failed to apply changes to document with URI={}", uri);
            }
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    /// Handles saves; saving the external user dictionary rebuilds the index.
    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("textDocument/didSave: {}", params.text_document.uri);
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };
        if self.is_active_user_dictionary(&path) {
            self.reload_user_dictionary("saved");
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some((_key, document)) = self.documents_by_uri.remove(&uri) {
            info!("Closed document: {}, id: {}", uri, document.id);
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    /// Applies pushed settings; a payload without our section triggers a pull.
    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        debug!("workspace/didChangeConfiguration: {:?}", params.settings);
        if DictCompletionSettings::section(&params.settings).is_some() {
            self.apply_settings(DictCompletionSettings::from_value(&params.settings));
        } else {
            self.pull_settings().await;
        }
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        debug!("Completion request at {}:{:?}", uri, position);

        let Some(document) = self.documents_by_uri.get(&uri).map(|r| r.value().clone()) else {
            debug!("Document not found: {}", uri);
            return Ok(None);
        };
        let Some(mode) = document.mode else {
            return Ok(None);
        };

        let settings = self.settings();
        let state = document.state.read().await;
        let cursor = cursor_position(&state.text, &position, self.position_encoding());
        let mut items: Vec<CompletionItem> = Vec::new();
        match self.completer.complete(mode, &state.text, cursor, &settings, &mut items) {
            Ok(count) => {
                debug!("{} {} completions for {}", count, mode.as_str(), uri);
                Ok(Some(CompletionResponse::Array(items)))
            }
            Err(rejected) => {
                debug!("Completion rejected at {}:{:?}: {}", uri, position, rejected);
                Err(rejection_error(rejected))
            }
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        info!("workspace/executeCommand: {}", params.command);
        match params.command.as_str() {
            OPEN_USER_DICT_COMMAND => self.open_user_dictionary().await,
            other => Err(jsonrpc::Error::invalid_params(format!("Unknown command: {}", other))),
        }
    }
}
