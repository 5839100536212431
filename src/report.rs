//! Rendering analysis results for the command line.

use serde::Serialize;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, Severity};
use crate::project::{Inference, Report};

/// One output line, so diagnostics and inferences interleave by position.
enum Line<'r> {
    Diagnostic(&'r Diagnostic),
    Inference(&'r Inference),
}

impl Line<'_> {
    fn sort_key(&self) -> (&str, u32, u8) {
        match self {
            Line::Diagnostic(d) => (d.location.file.as_str(), d.location.start, 0),
            Line::Inference(i) => (i.location.file.as_str(), i.location.start, 1),
        }
    }
}

/// Plain text, one line per diagnostic and per evaluated call site:
///
/// ```text
/// src/app.php:12 ReturnTypeArgNotInferable Return type for \App\Locator::get call can't be inferred (...)
/// src/app.php:14 \App\Locator::get() returns \App\Mailer
/// ```
pub fn render_text(report: &Report) -> String {
    let mut lines: Vec<Line<'_>> = report
        .diagnostics
        .iter()
        .map(Line::Diagnostic)
        .chain(report.inferences.iter().map(Line::Inference))
        .collect();
    lines.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut out = String::new();
    for line in lines {
        match line {
            Line::Diagnostic(d) => out.push_str(&format!(
                "{}:{} {} {}\n",
                d.location.file,
                d.location.line,
                d.kind.name(),
                d.message
            )),
            Line::Inference(i) => out.push_str(&format!(
                "{}:{} {}() returns {}\n",
                i.location.file, i.location.line, i.method, i.return_type
            )),
        }
    }
    out
}

#[derive(Serialize)]
struct JsonDiagnostic<'r> {
    issue: &'static str,
    severity: Severity,
    #[serde(flatten)]
    diagnostic: &'r Diagnostic,
}

#[derive(Serialize)]
struct JsonReport<'r> {
    inferences: &'r [Inference],
    diagnostics: Vec<JsonDiagnostic<'r>>,
}

/// The report as pretty-printed JSON, with each diagnostic's issue name
/// and configured severity.
pub fn render_json(report: &Report, config: &Config) -> serde_json::Result<String> {
    let json = JsonReport {
        inferences: &report.inferences,
        diagnostics: report
            .diagnostics
            .iter()
            .map(|diagnostic| JsonDiagnostic {
                issue: diagnostic.kind.name(),
                severity: config.severity_for(diagnostic.kind),
                diagnostic,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&json)
}

/// Whether any diagnostic is configured as an error.
pub fn has_errors(report: &Report, config: &Config) -> bool {
    report
        .diagnostics
        .iter()
        .any(|d| config.severity_for(d.kind) == Severity::Error)
}
