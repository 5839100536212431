//! Issues reported by the return-type override engine and the sink they
//! are emitted into.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::resolver::InferenceFailure;
use crate::types::{Location, MethodId};

/// The two kinds of issue this crate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IssueKind {
    /// `@returnTypeArg` names a parameter the method does not declare.
    UnknownParameter,
    /// A call site's designated argument could not be turned into a class.
    NotInferable,
}

impl IssueKind {
    /// The issue name printed in reports and used as the LSP diagnostic
    /// code.
    pub fn name(self) -> &'static str {
        match self {
            IssueKind::UnknownParameter => "ReturnTypeArgUnknownParameter",
            IssueKind::NotInferable => "ReturnTypeArgNotInferable",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How loudly an issue is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: IssueKind,
    pub location: Location,
    /// Fully formatted, human-readable message.
    pub message: String,
    /// The structured arguments the message was formatted from.
    pub arguments: Vec<String>,
}

impl Diagnostic {
    /// `{parameter} parameter is not found in {method}`.
    pub fn unknown_parameter(parameter: &str, method: &MethodId, location: Location) -> Self {
        Self {
            kind: IssueKind::UnknownParameter,
            location,
            message: format!("{} parameter is not found in {}", parameter, method),
            arguments: vec![parameter.to_string(), method.to_string()],
        }
    }

    /// `Return type for {method} call can't be inferred ({reason})`.
    pub fn not_inferable(method: &MethodId, failure: &InferenceFailure, location: Location) -> Self {
        let mut arguments = vec![method.to_string()];
        arguments.extend(failure.arguments());
        Self {
            kind: IssueKind::NotInferable,
            location,
            message: format!(
                "Return type for {} call can't be inferred ({})",
                method, failure
            ),
            arguments,
        }
    }
}

/// Receives diagnostics.  Implementations must tolerate concurrent
/// emission from several call-site evaluations.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// A sink that keeps everything it receives, in emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// A copy of everything emitted so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Drain the collected diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        tracing::debug!(
            kind = diagnostic.kind.name(),
            file = %diagnostic.location.file,
            line = diagnostic.location.line,
            "{}",
            diagnostic.message
        );
        self.diagnostics.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location::new("input.php", 3, 10, 20)
    }

    #[test]
    fn unknown_parameter_message_and_arguments() {
        let method = MethodId::from("\\App\\Locator::get");
        let diag = Diagnostic::unknown_parameter("typ", &method, location());
        assert_eq!(diag.kind, IssueKind::UnknownParameter);
        assert_eq!(diag.message, "typ parameter is not found in \\App\\Locator::get");
        assert_eq!(diag.arguments, vec!["typ", "\\App\\Locator::get"]);
    }

    #[test]
    fn not_inferable_prepends_the_method_to_failure_arguments() {
        let method = MethodId::from("\\App\\Locator::get");
        let failure = InferenceFailure::ClassNotFound {
            class: "\\App\\Missing".to_string(),
        };
        let diag = Diagnostic::not_inferable(&method, &failure, location());
        assert_eq!(diag.kind, IssueKind::NotInferable);
        assert_eq!(
            diag.message,
            "Return type for \\App\\Locator::get call can't be inferred (class \\App\\Missing does not exist)"
        );
        assert_eq!(diag.arguments, vec!["\\App\\Locator::get", "\\App\\Missing"]);
    }

    #[test]
    fn collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        let method = MethodId::from("\\A::b");
        sink.emit(Diagnostic::unknown_parameter("x", &method, location()));
        sink.emit(Diagnostic::unknown_parameter("y", &method, location()));
        assert_eq!(sink.len(), 2);
        let taken = sink.take();
        assert_eq!(taken[0].arguments[0], "x");
        assert_eq!(taken[1].arguments[0], "y");
        assert!(sink.is_empty());
    }
}
