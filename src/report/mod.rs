// Diagnostics model - some accessors reserved for library consumers
#![allow(dead_code)]

mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use miette::Result;
use std::path::PathBuf;

/// Severity of a merge diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Progress,
    Warning,
    Error,
}

impl Severity {
    /// One-letter code used in the stable textual form.
    pub fn letter(&self) -> &'static str {
        match self {
            Severity::Progress => "P",
            Severity::Warning => "W",
            Severity::Error => "E",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Progress => "progress",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file identifier with an optional source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub file: String,
    pub line: Option<usize>,
}

impl FileRef {
    pub fn new(file: impl Into<String>, line: Option<usize>) -> Self {
        Self { file: file.into(), line }
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// A structured record emitted by the merge engine.
///
/// The main manifest's reference always comes first when both sides are
/// involved; `message` may span multiple lines for element diffs.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub primary: Option<FileRef>,
    pub secondary: Option<FileRef>,
    pub message: String,
}

impl Diagnostic {
    /// Stable textual form: `<S> [<fileRef>[, <fileRef>]] <message>`.
    pub fn render(&self) -> String {
        let mut out = String::from(self.severity.letter());
        match (&self.primary, &self.secondary) {
            (Some(p), Some(s)) => {
                out.push_str(&format!(" [{}, {}]", p, s));
            }
            (Some(r), None) | (None, Some(r)) => {
                out.push_str(&format!(" [{}]", r));
            }
            (None, None) => {}
        }
        out.push(' ');
        out.push_str(&self.message);
        out
    }
}

/// Ordered sink for merge diagnostics.
#[derive(Debug, Default)]
pub struct MergeReport {
    diagnostics: Vec<Diagnostic>,
}

impl MergeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(
        &mut self,
        primary: Option<FileRef>,
        secondary: Option<FileRef>,
        message: impl Into<String>,
    ) {
        self.record(Diagnostic {
            severity: Severity::Error,
            primary,
            secondary,
            message: message.into(),
        });
    }

    pub fn warning(
        &mut self,
        primary: Option<FileRef>,
        secondary: Option<FileRef>,
        message: impl Into<String>,
    ) {
        self.record(Diagnostic {
            severity: Severity::Warning,
            primary,
            secondary,
            message: message.into(),
        });
    }

    pub fn progress(
        &mut self,
        primary: Option<FileRef>,
        secondary: Option<FileRef>,
        message: impl Into<String>,
    ) {
        self.record(Diagnostic {
            severity: Severity::Progress,
            primary,
            secondary,
            message: message.into(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    /// Every diagnostic in its stable textual form, in emission order.
    pub fn render_lines(&self) -> Vec<String> {
        self.diagnostics.iter().map(Diagnostic::render).collect()
    }
}

/// Output format for the diagnostics report
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter facade dispatching to the configured format.
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    pub fn report(&self, report: &MergeReport) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(report),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(report),
        }
    }
}
