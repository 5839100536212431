//! `@returnTypeArg` support for PHP static analysis.
//!
//! A factory or service-locator method can declare that its return type is
//! the class named by one of its arguments:
//!
//! ```php
//! /**
//!  * @return mixed
//!  * @returnTypeArg $type
//!  */
//! public static function instance($type, array $args = []) { return new $type(...$args); }
//!
//! ServiceLocator::instance('\App\Mailer');      // \App\Mailer
//! ServiceLocator::instance(Services::MAILER);   // whatever Services::MAILER names
//! ```
//!
//! The core ([`annotation`], [`resolver`], [`engine`]) works over the
//! [`SymbolTable`](resolver::SymbolTable) and
//! [`DiagnosticSink`](diagnostics::DiagnosticSink) traits.  The rest of the
//! crate is a host for it: a mago-based PHP [`parser`], a [`project`]-wide
//! symbol table, a command line checker and a language server
//! ([`Backend`]).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::*;

pub mod annotation;
pub mod config;
pub mod diagnostics;
pub mod docblock;
pub mod engine;
pub mod names;
pub mod parser;
pub mod project;
pub mod report;
pub mod resolver;
mod server;
pub mod stubs;
pub mod types;
pub mod util;
pub mod workspace;

pub use config::Config;
pub use engine::{CallSite, MethodOverrideSpec, OverrideTable};
pub use project::{Inference, Project, Report};

use crate::diagnostics::Severity;
use crate::util::{offset_to_position, position_to_offset};

/// Language server state.
///
/// Documents are keyed by their URI string.  Every edit re-runs the
/// analysis over the whole project; results are cached in `report` for
/// hover and diagnostics.
pub struct Backend {
    name: String,
    version: String,
    client: Option<Client>,
    /// `--config` given on the command line, if any.
    config_path: Option<PathBuf>,
    workspace_root: RwLock<Option<PathBuf>>,
    config: RwLock<Config>,
    project: RwLock<Project>,
    report: RwLock<Report>,
    /// URIs whose diagnostics were last published non-empty.
    published: Mutex<HashSet<String>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
            ..Self::new_test()
        }
    }

    /// A backend without a client, for tests.
    pub fn new_test() -> Self {
        Self {
            name: "phpantom_typearg".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client: None,
            config_path: None,
            workspace_root: RwLock::new(None),
            config: RwLock::new(Config::default()),
            project: RwLock::new(Project::new()),
            report: RwLock::new(Report::default()),
            published: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.read().clone()
    }

    pub fn set_workspace_root(&self, root: Option<PathBuf>) {
        *self.workspace_root.write() = root;
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: Config) {
        let marker = config.marker.clone();
        *self.config.write() = config;
        self.project.write().set_marker(&marker);
    }

    /// Discover the configuration for the current workspace root.
    ///
    /// A broken config file is logged and replaced by the defaults.
    pub fn load_config(&self) -> Option<String> {
        let root = self.workspace_root();
        match Config::discover(self.config_path.as_deref(), root.as_deref()) {
            Ok((config, path)) => {
                self.set_config(config);
                path.map(|p| p.display().to_string())
            }
            Err(err) => {
                tracing::warn!("{}, using defaults", err);
                self.set_config(Config::default());
                None
            }
        }
    }

    /// Load every PHP file under the workspace root.  Returns the number
    /// of files indexed.
    pub fn index_workspace(&self) -> usize {
        let Some(root) = self.workspace_root() else {
            return 0;
        };
        let exclude = self.config.read().exclude.clone();

        let mut project = self.project.write();
        match workspace::index_directory(&mut project, &root, &exclude, uri_for_path) {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!("failed to index workspace: {}", err);
                0
            }
        }
    }

    /// Store new content for `uri` and re-run the analysis.
    pub fn update_file(&self, uri: &str, content: &str) {
        self.project.write().add_file(uri, content);
        self.reanalyze();
    }

    /// Replace the editor's copy of `uri` by the on-disk version, or drop
    /// the file when it no longer exists.
    pub fn reload_from_disk(&self, uri: &str) {
        let on_disk = Url::parse(uri)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .and_then(|path| std::fs::read_to_string(path).ok());

        {
            let mut project = self.project.write();
            match on_disk {
                Some(content) => project.add_file(uri, &content),
                None => {
                    project.remove_file(uri);
                }
            }
        }
        self.reanalyze();
    }

    pub fn reanalyze(&self) {
        let report = self.project.read().analyze();
        *self.report.write() = report;
    }

    pub fn report(&self) -> Report {
        self.report.read().clone()
    }

    pub fn file_content(&self, uri: &str) -> Option<String> {
        self.project.read().content(uri).map(str::to_string)
    }

    /// The current diagnostics of `uri`, converted for the client.
    pub fn diagnostics_for(&self, uri: &str) -> Vec<Diagnostic> {
        // Lock order: project, report, config.
        let project = self.project.read();
        let report = self.report.read();
        let config = self.config.read();
        let content = project.content(uri).unwrap_or("");

        report
            .diagnostics_for(uri)
            .map(|d| Diagnostic {
                range: Range::new(
                    offset_to_position(content, d.location.start),
                    offset_to_position(content, d.location.end),
                ),
                severity: Some(lsp_severity(config.severity_for(d.kind))),
                code: Some(NumberOrString::String(d.kind.name().to_string())),
                source: Some(self.name.clone()),
                message: d.message.clone(),
                ..Diagnostic::default()
            })
            .collect()
    }

    /// Diagnostics that need publishing: every file that has some now,
    /// plus an empty list for every file that had some before and no
    /// longer does.
    pub fn pending_diagnostics(&self) -> Vec<(String, Vec<Diagnostic>)> {
        let current: HashSet<String> = self
            .report
            .read()
            .files_with_diagnostics()
            .map(str::to_string)
            .collect();

        let mut published = self.published.lock();
        let mut pending: Vec<(String, Vec<Diagnostic>)> = published
            .difference(&current)
            .map(|uri| (uri.clone(), Vec::new()))
            .collect();
        for uri in &current {
            pending.push((uri.clone(), self.diagnostics_for(uri)));
        }
        pending.sort_by(|a, b| a.0.cmp(&b.0));

        *published = current;
        pending
    }

    async fn publish_diagnostics(&self) {
        let Some(client) = &self.client else {
            return;
        };
        for (uri, diagnostics) in self.pending_diagnostics() {
            match Url::parse(&uri) {
                Ok(url) => client.publish_diagnostics(url, diagnostics, None).await,
                Err(err) => tracing::debug!(uri, "not publishing diagnostics: {}", err),
            }
        }
    }

    /// Hover text for the call site under `position`.
    pub fn hover_at(&self, uri: &str, position: Position) -> Option<Hover> {
        let project = self.project.read();
        let content = project.content(uri)?;
        let offset = position_to_offset(content, position);

        let report = self.report.read();
        let inference = report.inference_at(uri, offset)?;

        let value = format!(
            "```php\n{}\n```\nReturn type of `{}()` determined by `${}`.",
            inference.return_type, inference.method, inference.parameter
        );
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(Range::new(
                offset_to_position(content, inference.location.start),
                offset_to_position(content, inference.location.end),
            )),
        })
    }

    async fn log(&self, typ: MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }
}

fn lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// The `file://` URI used as a project key for files read from disk.
pub fn uri_for_path(path: &Path) -> String {
    Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| path.display().to_string())
}
