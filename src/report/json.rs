use crate::report::MergeReport;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, report: &MergeReport) -> Result<()> {
        let json_report = JsonReport::from_report(report);
        let json = serde_json::to_string_pretty(&json_report).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            eprintln!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    success: bool,
    errors: usize,
    warnings: usize,
    diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
struct JsonDiagnostic {
    severity: &'static str,
    file: Option<String>,
    line: Option<usize>,
    secondary_file: Option<String>,
    secondary_line: Option<usize>,
    message: String,
    rendered: String,
}

impl JsonReport {
    fn from_report(report: &MergeReport) -> Self {
        let diagnostics = report
            .diagnostics()
            .iter()
            .map(|d| JsonDiagnostic {
                severity: d.severity.as_str(),
                file: d.primary.as_ref().map(|r| r.file.clone()),
                line: d.primary.as_ref().and_then(|r| r.line),
                secondary_file: d.secondary.as_ref().map(|r| r.file.clone()),
                secondary_line: d.secondary.as_ref().and_then(|r| r.line),
                message: d.message.clone(),
                rendered: d.render(),
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION"),
            success: !report.has_errors(),
            errors: report.error_count(),
            warnings: report.warning_count(),
            diagnostics,
        }
    }
}
