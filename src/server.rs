/// LSP server trait implementation.
///
/// This module contains the `impl LanguageServer for Backend` block,
/// which handles the LSP protocol messages this server supports:
/// lifecycle, full-text document sync and hover.
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::Backend;

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());
        self.set_workspace_root(workspace_root);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let config_source = self.load_config();
        let indexed = self.index_workspace();
        self.reanalyze();

        let report = self.report();
        tracing::info!(
            files = indexed,
            inferences = report.inferences.len(),
            diagnostics = report.diagnostics.len(),
            "workspace indexed"
        );
        self.log(
            MessageType::INFO,
            format!(
                "{} initialized: {} file(s) indexed, config: {}",
                self.name,
                indexed,
                config_source.as_deref().unwrap_or("defaults")
            ),
        )
        .await;

        self.publish_diagnostics().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let uri = doc.uri.to_string();
        self.update_file(&uri, &doc.text);
        self.publish_diagnostics().await;

        self.log(MessageType::LOG, format!("Opened file: {}", uri))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        // Full sync: the last change holds the whole document.
        if let Some(change) = params.content_changes.last() {
            self.update_file(&uri, &change.text);
            self.publish_diagnostics().await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        self.reload_from_disk(&uri);
        self.publish_diagnostics().await;

        self.log(MessageType::LOG, format!("Closed file: {}", uri))
            .await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params
            .text_document_position_params
            .text_document
            .uri
            .to_string();
        let position = params.text_document_position_params.position;
        Ok(self.hover_at(&uri, position))
    }
}
