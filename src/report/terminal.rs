use crate::report::{MergeReport, Severity};
use colored::Colorize;
use miette::Result;

/// Terminal reporter with colored output.
///
/// Diagnostics go to stderr so the merged manifest can be piped from stdout.
pub struct TerminalReporter {
    /// Show progress-level records, not just warnings and errors
    show_progress: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_progress: true }
    }

    #[allow(dead_code)] // Builder pattern method for future use
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn report(&self, report: &MergeReport) -> Result<()> {
        for diagnostic in report.diagnostics() {
            if diagnostic.severity == Severity::Progress && !self.show_progress {
                continue;
            }
            let rendered = diagnostic.render();
            let line = match diagnostic.severity {
                Severity::Error => rendered.red().to_string(),
                Severity::Warning => rendered.yellow().to_string(),
                Severity::Progress => rendered.dimmed().to_string(),
            };
            eprintln!("{}", line);
        }

        self.print_summary(report);
        Ok(())
    }

    fn print_summary(&self, report: &MergeReport) {
        let errors = report.error_count();
        let warnings = report.warning_count();

        if errors == 0 && warnings == 0 {
            eprintln!("{}", "Manifest merge completed with no problems.".green());
            return;
        }

        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} errors", errors).red().to_string());
        }
        if warnings > 0 {
            parts.push(format!("{} warnings", warnings).yellow().to_string());
        }
        eprintln!("Summary: {}", parts.join(", "));
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
