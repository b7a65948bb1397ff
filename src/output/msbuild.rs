//! MSBuild-style output formatter
//!
//! One line per diagnostic in the `file(line,col): warning ID: message` shape
//! that Visual Studio and CI log parsers pick up.

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;

#[derive(Debug, Default)]
pub struct MsBuildFormatter;

impl MsBuildFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for MsBuildFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();

        for failure in &result.failures {
            output.push_str(&format!(
                "{}: error NETFIELD0000: {}\n",
                failure.path.display(),
                failure.message
            ));
        }

        for diag in &result.diagnostics {
            output.push_str(&self.format_diagnostic(diag));
            output.push('\n');
        }

        output
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        // MSBuild has no "info" category
        let category = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "message",
        };
        format!(
            "{}({},{}): {} {}: {}",
            diagnostic.location.file.display(),
            diagnostic.location.line,
            diagnostic.location.column,
            category,
            diagnostic.rule_id,
            diagnostic.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Location;
    use crate::engine::{FailureKind, FileFailure};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn diag(rule: &str, severity: Severity, line: usize) -> Diagnostic {
        Diagnostic::new(
            rule,
            severity,
            "message",
            Location::new(PathBuf::from("ModEntry.cs"), line, 5),
        )
    }

    #[test]
    fn test_msbuild_line() {
        let output = MsBuildFormatter::new().format_diagnostic(&diag("SMAPI001", Severity::Warning, 10));
        assert_eq!(output, "ModEntry.cs(10,5): warning SMAPI001: message");

        let output = MsBuildFormatter::new().format_diagnostic(&diag("SMAPI002", Severity::Info, 3));
        assert_eq!(output, "ModEntry.cs(3,5): message SMAPI002: message");
    }

    #[test]
    fn test_msbuild_result() {
        let result = LintResult {
            diagnostics: vec![
                diag("SMAPI001", Severity::Error, 1),
                diag("SMAPI002", Severity::Warning, 2),
            ],
            failures: vec![FileFailure {
                path: PathBuf::from("Broken.cs"),
                kind: FailureKind::Parse,
                message: "syntax error at line 1, column 9: expected '}'".to_string(),
            }],
            ..Default::default()
        };

        let output = MsBuildFormatter::new().format(&result);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Broken.cs: error NETFIELD0000: syntax error at line 1, column 9: expected '}'",
                "ModEntry.cs(1,5): error SMAPI001: message",
                "ModEntry.cs(2,5): warning SMAPI002: message",
            ]
        );
    }
}
