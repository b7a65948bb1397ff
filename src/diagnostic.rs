//! Diagnostic types for analysis results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - likely bug, never fails a build
    #[default]
    Warning,
    /// Error - promoted through a severity override
    Error,
}

impl Severity {
    /// Lowercase label used by the machine-readable formatters
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" | "suggestion" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Source code location
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
    /// Length of the highlighted region in characters
    pub length: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            length: 0,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

/// A single analyzer finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule ID that triggered this diagnostic (e.g. "SMAPI001")
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: Location,
    /// The source line (for display)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
    /// Help text (usually the rule title)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Documentation link for the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_uri: Option<String>,
    /// Additional notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(rule_id: &str, severity: Severity, message: &str, location: Location) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.to_string(),
            location,
            source_line: None,
            help: None,
            help_uri: None,
            notes: Vec::new(),
        }
    }

    /// Add source line for display
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Add the documentation link
    pub fn with_help_uri(mut self, uri: &str) -> Self {
        self.help_uri = Some(uri.to_string());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    /// Replace the severity (used for configured overrides)
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Ordering key used to present diagnostics deterministically
    pub fn sort_key(&self) -> (&PathBuf, usize, usize, &str) {
        (
            &self.location.file,
            self.location.line,
            self.location.column,
            &self.rule_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("suggestion".parse::<Severity>(), Ok(Severity::Info));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_default_severity_is_warning() {
        assert_eq!(Severity::default(), Severity::Warning);
        assert_eq!(format!("{}", Severity::Warning), "warning");
    }

    #[test]
    fn test_diagnostic_creation() {
        let loc = Location::new(PathBuf::from("ModEntry.cs"), 36, 29).with_length(8);
        let diag = Diagnostic::new("SMAPI001", Severity::Warning, "message", loc)
            .with_source_line("if (intField < 42);")
            .with_help_uri("https://smapi.io/buildmsg/SMAPI001")
            .with_note("converted by NetFieldBase");

        assert_eq!(diag.rule_id, "SMAPI001");
        assert!(diag.is_warning());
        assert!(!diag.is_error());
        assert_eq!(diag.location.length, 8);
        assert_eq!(diag.notes.len(), 1);
        assert!(diag.with_severity(Severity::Error).is_error());
    }

    #[test]
    fn test_serialize_skips_empty_extras() {
        let diag = Diagnostic::new(
            "SMAPI002",
            Severity::Warning,
            "m",
            Location::new(PathBuf::from("a.cs"), 1, 1),
        );
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("help_uri"));
        assert!(!json.contains("notes"));
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
