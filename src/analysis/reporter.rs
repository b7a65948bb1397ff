//! Turns a matched node into a located diagnostic

use super::{AnalysisContext, RuleError};
use crate::diagnostic::Diagnostic;
use crate::rule::RuleMetadata;
use crate::source::Span;

/// Build a diagnostic for `span` with the rule's default severity.
/// Fails when the span does not map onto the source text.
pub fn report(
    metadata: &RuleMetadata,
    message: &str,
    span: Span,
    ctx: &AnalysisContext<'_>,
) -> Result<Diagnostic, RuleError> {
    let location = ctx
        .source
        .location(ctx.file, span)
        .ok_or_else(|| RuleError::unmapped(span))?;
    let source_line = ctx.source.line(location.line);

    let mut diagnostic = Diagnostic::new(&metadata.id, metadata.severity, message, location)
        .with_help(&metadata.title)
        .with_help_uri(&metadata.help_uri(ctx.docs_host));
    if let Some(line) = source_line {
        diagnostic = diagnostic.with_source_line(line);
    }
    Ok(diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::semantic::SemanticModel;
    use crate::source::SourceText;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    fn metadata() -> RuleMetadata {
        RuleMetadata::new("SMAPI001", "Title", "Description")
    }

    #[test]
    fn test_report_location_and_links() {
        let text = SourceText::new("class C {\n    bool b = x < 42;\n}");
        let model = SemanticModel::default();
        let ctx = AnalysisContext::new(Path::new("C.cs"), &text, &model);
        let start = text.as_str().find("x <").unwrap();
        let diag = report(&metadata(), "msg", Span::new(start, start + 1), &ctx).unwrap();

        assert_eq!(diag.rule_id, "SMAPI001");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.location.file, PathBuf::from("C.cs"));
        assert_eq!((diag.location.line, diag.location.column, diag.location.length), (2, 14, 1));
        assert_eq!(diag.source_line.as_deref(), Some("    bool b = x < 42;"));
        assert_eq!(diag.help.as_deref(), Some("Title"));
        assert_eq!(diag.help_uri.as_deref(), Some("https://smapi.io/buildmsg/SMAPI001"));
    }

    #[test]
    fn test_multibyte_text_before_span() {
        let text = SourceText::new("s = \"日本\"; x");
        let model = SemanticModel::default();
        let ctx = AnalysisContext::new(Path::new("C.cs"), &text, &model);
        let start = text.as_str().find('x').unwrap();
        let diag = report(&metadata(), "msg", Span::new(start, start + 1), &ctx).unwrap();
        assert_eq!(diag.location.column, 11);
    }

    #[test]
    fn test_unmapped_spans() {
        let text = SourceText::new("abc");
        let model = SemanticModel::default();
        let ctx = AnalysisContext::new(Path::new("C.cs"), &text, &model);
        assert_eq!(
            report(&metadata(), "msg", Span::new(2, 10), &ctx),
            Err(RuleError::UnmappedSpan { start: 2, end: 10 })
        );
        assert!(report(&metadata(), "msg", Span::new(1, 1), &ctx).is_err());
    }

    #[test]
    fn test_severity_follows_metadata() {
        let text = SourceText::new("abc");
        let model = SemanticModel::default();
        let ctx = AnalysisContext::new(Path::new("C.cs"), &text, &model).with_docs_host("docs.test");
        let meta = metadata().with_severity(Severity::Info);
        let diag = report(&meta, "msg", Span::new(0, 3), &ctx).unwrap();
        assert_eq!(diag.severity, Severity::Info);
        assert_eq!(diag.help_uri.as_deref(), Some("https://docs.test/buildmsg/SMAPI001"));
    }
}
