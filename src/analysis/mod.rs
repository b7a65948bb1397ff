//! Wrapper-type analysis: classification, shape matching, reporting and rules
//!
//! ```text
//! Engine -> analyze_unit -> Rule -> matcher -> classifier
//!                                \-> reporter -> Diagnostic
//! ```
//!
//! Every expression node of a compilation unit is offered to each enabled rule.
//! Rules are stateless; a rule failure on one node is logged and the walk
//! continues with the next node.

pub mod classifier;
pub mod matcher;
pub mod reporter;
pub mod rules;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{classify, WrapperInfo};
pub use rules::builtin_rules;

use crate::diagnostic::Diagnostic;
use crate::rule::{Rule, DEFAULT_DOCS_HOST};
use crate::semantic::SemanticModel;
use crate::source::{SourceText, Span};
use crate::syntax::CompilationUnit;
use std::path::Path;
use thiserror::Error;

/// Failure while a rule inspects a single node
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("span {start}..{end} does not map to the source text")]
    UnmappedSpan { start: usize, end: usize },
}

impl RuleError {
    pub fn unmapped(span: Span) -> Self {
        RuleError::UnmappedSpan {
            start: span.start,
            end: span.end,
        }
    }
}

/// Everything a rule may consult while checking one file
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub file: &'a Path,
    pub source: &'a SourceText,
    pub model: &'a SemanticModel,
    /// Host used in documentation links
    pub docs_host: &'a str,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(file: &'a Path, source: &'a SourceText, model: &'a SemanticModel) -> Self {
        Self {
            file,
            source,
            model,
            docs_host: DEFAULT_DOCS_HOST,
        }
    }

    pub fn with_docs_host(mut self, host: &'a str) -> Self {
        self.docs_host = host;
        self
    }

    /// Verbatim source text of a node
    pub fn text(&self, span: Span) -> Result<&'a str, RuleError> {
        self.source
            .slice(span)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| RuleError::unmapped(span))
    }
}

/// Offer every expression node of `unit` to each rule, depth-first
pub fn analyze_unit(
    ctx: &AnalysisContext<'_>,
    unit: &CompilationUnit,
    rules: &[Box<dyn Rule>],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for expr in unit.expressions() {
        for rule in rules {
            match rule.check(ctx, expr) {
                Ok(Some(diagnostic)) => diagnostics.push(diagnostic),
                Ok(None) => {}
                Err(err @ RuleError::UnmappedSpan { .. }) => {
                    log::debug!("{}: {} skipped a node: {}", ctx.file.display(), rule.id(), err);
                }
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::syntax::Expr;
    use pretty_assertions::assert_eq;

    struct FailingRule(crate::rule::RuleMetadata);

    impl Rule for FailingRule {
        fn metadata(&self) -> &crate::rule::RuleMetadata {
            &self.0
        }

        fn check(
            &self,
            _: &AnalysisContext<'_>,
            expr: &Expr,
        ) -> Result<Option<Diagnostic>, RuleError> {
            Err(RuleError::unmapped(expr.span))
        }
    }

    #[test]
    fn test_empty_code_has_no_diagnostics() {
        assert_eq!(analyze_snippet(""), Vec::new());
    }

    #[test]
    fn test_analysis_is_repeatable() {
        let code = "if (intField < 42 && item.category == refField);";
        let first = analyze_snippet(code);
        assert!(!first.is_empty());
        assert_eq!(first, analyze_snippet(code));
    }

    #[test]
    fn test_failing_rule_does_not_stop_other_rules() {
        let text = SourceText::new(&sample_with("if (intField < 42);"));
        let unit = crate::syntax::parse(&text).unwrap();
        let model = crate::semantic::bind(&unit);
        let ctx = AnalysisContext::new(Path::new(SAMPLE_FILE), &text, &model);
        let mut rules: Vec<Box<dyn Rule>> = vec![Box::new(FailingRule(
            crate::rule::RuleMetadata::new("TEST", "t", "d"),
        ))];
        rules.extend(builtin_rules());
        let diagnostics = analyze_unit(&ctx, &unit, &rules);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_id, "SMAPI001");
    }

    #[test]
    fn test_context_text() {
        let text = SourceText::new("abc");
        let model = SemanticModel::default();
        let ctx = AnalysisContext::new(Path::new("a.cs"), &text, &model).with_docs_host("example.org");
        assert_eq!(ctx.text(Span::new(1, 3)), Ok("bc"));
        assert_eq!(ctx.text(Span::new(1, 1)), Err(RuleError::UnmappedSpan { start: 1, end: 1 }));
        assert_eq!(ctx.docs_host, "example.org");
    }
}
