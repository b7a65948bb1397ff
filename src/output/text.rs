//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;
use colored::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Text formatter with optional color support
pub struct TextFormatter {
    pub colored: bool,

    /// Show the source line with a caret underline
    pub show_source: bool,

    pub show_help: bool,

    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_help: true,
            show_stats: true,
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.as_str();
        if !self.colored {
            return s.to_string();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Info => s.blue(),
        }
        .to_string()
    }

    fn gutter(&self, mark: &str) -> String {
        self.paint(mark, |s| s.blue())
    }

    fn summary(&self, result: &LintResult) -> String {
        let mut output = format!("\n{} processed", plural(result.files_processed, "file"));

        let mut counts = Vec::new();
        if !result.failures.is_empty() {
            counts.push(self.paint(&plural(result.failures.len(), "failed file"), |s| s.red()));
        }
        if result.error_count > 0 {
            counts.push(self.paint(&plural(result.error_count, "error"), |s| s.red()));
        }
        if result.warning_count > 0 {
            counts.push(self.paint(&plural(result.warning_count, "warning"), |s| s.yellow()));
        }
        if result.info_count > 0 {
            counts.push(self.paint(&plural(result.info_count, "info"), |s| s.blue()));
        }
        if !counts.is_empty() {
            output.push_str(&format!(": {}", counts.join(", ")));
        }
        output.push('\n');
        output.push_str(&format!("Finished in {:.2}s\n", result.duration.as_secs_f64()));
        output
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();

        // diagnostics arrive sorted; keep that order inside each file
        let mut by_file: BTreeMap<&Path, Vec<&Diagnostic>> = BTreeMap::new();
        for diag in &result.diagnostics {
            by_file.entry(diag.location.file.as_path()).or_default().push(diag);
        }

        for (file, diagnostics) in &by_file {
            output.push_str(&self.paint(&file.display().to_string(), |s| s.underline()));
            output.push('\n');
            for diag in diagnostics {
                output.push_str(&self.format_diagnostic(diag));
                output.push('\n');
            }
        }

        for failure in &result.failures {
            output.push_str(&format!(
                "{}: {}: {}\n",
                failure.path.display(),
                self.severity_str(Severity::Error),
                failure.message
            ));
        }

        if self.show_stats {
            output.push_str(&self.summary(result));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = format!(
            "{}:{}:{}: {}[{}]: {}\n",
            diag.location.file.display(),
            diag.location.line,
            diag.location.column,
            self.severity_str(diag.severity),
            self.paint(&diag.rule_id, |s| s.cyan()),
            diag.message
        );

        if self.show_source {
            if let Some(source) = &diag.source_line {
                let line_num = format!("{:>4}", diag.location.line);
                output.push_str(&format!("     {}\n", self.gutter("|")));
                output.push_str(&format!(
                    "{} {} {}\n",
                    self.paint(&line_num, |s| s.blue()),
                    self.gutter("|"),
                    source
                ));

                if diag.location.column > 0 {
                    // tabs keep their width so the caret lines up
                    let padding: String = source
                        .chars()
                        .take(diag.location.column - 1)
                        .map(|c| if c == '\t' { '\t' } else { ' ' })
                        .collect();
                    let underline = "^".repeat(diag.location.length.max(1));
                    output.push_str(&format!(
                        "     {} {}{}\n",
                        self.gutter("|"),
                        padding,
                        self.paint(&underline, |s| s.yellow())
                    ));
                }
            }
        }

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("     {} help: {}\n", self.gutter("="), help));
            }
        }

        for note in &diag.notes {
            output.push_str(&format!("     {} note: {}\n", self.gutter("="), note));
        }

        output
    }
}
