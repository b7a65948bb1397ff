//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::engine::{FileFailure, LintResult};
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.unwrap_or_else(|e| {
            log::warn!("failed to serialize output: {}", e);
            String::new()
        })
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    failures: &'a [FileFailure],
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    rule_id: &'a str,
    severity: &'a str,
    message: &'a str,
    file: String,
    line: usize,
    column: usize,
    length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_line: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    notes: &'a [String],
}

impl<'a> From<&'a Diagnostic> for JsonDiagnostic<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        Self {
            rule_id: &d.rule_id,
            severity: d.severity.as_str(),
            message: &d.message,
            file: d.location.file.display().to_string(),
            line: d.location.line,
            column: d.location.column,
            length: d.location.length,
            source_line: d.source_line.as_deref(),
            help: d.help.as_deref(),
            help_uri: d.help_uri.as_deref(),
            notes: &d.notes,
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    files_processed: usize,
    files_failed: usize,
    files_with_warnings: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &LintResult) -> String {
        let output = JsonOutput {
            diagnostics: result.diagnostics.iter().map(JsonDiagnostic::from).collect(),
            failures: &result.failures,
            summary: JsonSummary {
                files_processed: result.files_processed,
                files_failed: result.failures.len(),
                files_with_warnings: result.files_with_warnings,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                duration_ms: result.duration.as_millis(),
            },
        };
        self.to_json(&output)
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        self.to_json(&JsonDiagnostic::from(diagnostic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Location, Severity};
    use crate::engine::FailureKind;
    use std::path::PathBuf;

    #[test]
    fn test_json_format_diagnostic() {
        let formatter = JsonFormatter::new();
        let diag = Diagnostic::new(
            "SMAPI001",
            Severity::Warning,
            "Test message",
            Location::new(PathBuf::from("ModEntry.cs"), 10, 5),
        )
        .with_help_uri("https://smapi.io/buildmsg/SMAPI001");

        let output = formatter.format_diagnostic(&diag);
        assert!(output.contains("\"rule_id\":\"SMAPI001\""));
        assert!(output.contains("\"severity\":\"warning\""));
        assert!(output.contains("\"line\":10"));
        assert!(output.contains("\"help_uri\":\"https://smapi.io/buildmsg/SMAPI001\""));
        assert!(!output.contains("notes"));
    }

    #[test]
    fn test_json_format_result() {
        let formatter = JsonFormatter::new();
        let result = LintResult {
            files_processed: 5,
            error_count: 2,
            warning_count: 3,
            failures: vec![FileFailure {
                path: PathBuf::from("Broken.cs"),
                kind: FailureKind::Read,
                message: "Failed to read file".to_string(),
            }],
            ..Default::default()
        };

        let output = formatter.format(&result);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["files_processed"], 5);
        assert_eq!(value["summary"]["files_failed"], 1);
        assert_eq!(value["summary"]["warning_count"], 3);
        assert_eq!(value["failures"][0]["kind"], "read");
        assert_eq!(value["failures"][0]["path"], "Broken.cs");
    }

    #[test]
    fn test_json_pretty() {
        let formatter = JsonFormatter::new().pretty();
        let diag = Diagnostic::new(
            "SMAPI002",
            Severity::Warning,
            "msg",
            Location::new(PathBuf::from("f.cs"), 1, 1),
        )
        .with_note("'item' resolves to field Item.category");

        let output = formatter.format_diagnostic(&diag);
        assert!(output.contains('\n'));
        assert!(output.contains("resolves to field"));
    }
}
