//! Output formatters for analysis results

mod json;
mod msbuild;
mod sarif;
mod text;

pub use json::JsonFormatter;
pub use msbuild::MsBuildFormatter;
pub use sarif::SarifFormatter;
pub use text::TextFormatter;

use crate::config::OutputFormat;
use crate::diagnostic::Diagnostic;
use crate::engine::LintResult;
use crate::rule::RuleMetadata;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire result
    fn format(&self, result: &LintResult) -> String;

    /// Format a single diagnostic
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;
}

/// Build the formatter for `format`; `rules` and `docs_host` feed the SARIF rule table
pub fn formatter_for(
    format: OutputFormat,
    colored: bool,
    show_stats: bool,
    rules: &[RuleMetadata],
    docs_host: &str,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => {
            let mut formatter = TextFormatter::new();
            formatter.colored = colored;
            formatter.show_stats = show_stats;
            Box::new(formatter)
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Sarif => Box::new(
            SarifFormatter::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
                .with_rules(rules, docs_host),
        ),
        OutputFormat::Msbuild => Box::new(MsBuildFormatter::new()),
    }
}
