//! Rule metadata and the analyzer rule interface

use crate::analysis::{AnalysisContext, RuleError};
use crate::diagnostic::{Diagnostic, Severity};
use crate::syntax::Expr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default host for rule documentation links
pub const DEFAULT_DOCS_HOST: &str = "smapi.io";

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Code that is likely wrong at runtime
    #[default]
    Correctness,
    /// Code that works but is easy to get wrong
    Suspicious,
    /// Rules that prefer one API surface over another
    Style,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Correctness => write!(f, "correctness"),
            RuleCategory::Suspicious => write!(f, "suspicious"),
            RuleCategory::Style => write!(f, "style"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correctness" => Ok(RuleCategory::Correctness),
            "suspicious" => Ok(RuleCategory::Suspicious),
            "style" => Ok(RuleCategory::Style),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Static description of an analyzer rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    /// Unique rule identifier (e.g., "SMAPI001")
    pub id: String,

    /// Short human-readable title
    pub title: String,

    /// One-sentence description
    pub description: String,

    /// Default severity level
    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub category: RuleCategory,

    /// Why the pattern is a problem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    /// Example of code that triggers this rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_bad: Option<String>,

    /// Example of correct code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_good: Option<String>,

    /// Related rule IDs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl RuleMetadata {
    /// Create metadata with the default severity and category
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            severity: Severity::Warning,
            category: RuleCategory::default(),
            rationale: None,
            example_bad: None,
            example_good: None,
            related: Vec::new(),
        }
    }

    /// Documentation link for this rule on the given host
    pub fn help_uri(&self, host: &str) -> String {
        format!("https://{}/buildmsg/{}", host, self.id)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    pub fn with_example_bad(mut self, example: &str) -> Self {
        self.example_bad = Some(example.to_string());
        self
    }

    pub fn with_example_good(mut self, example: &str) -> Self {
        self.example_good = Some(example.to_string());
        self
    }

    pub fn with_related(mut self, rule_id: &str) -> Self {
        self.related.push(rule_id.to_string());
        self
    }
}

/// A stateless analyzer rule, offered every expression node of a file
pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;

    /// Inspect one node; at most one diagnostic per node
    fn check(
        &self,
        ctx: &AnalysisContext<'_>,
        expr: &Expr,
    ) -> Result<Option<Diagnostic>, RuleError>;

    fn id(&self) -> &str {
        &self.metadata().id
    }
}
