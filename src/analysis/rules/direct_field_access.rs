//! SMAPI002: reading a wrapper-typed member where a plain property exists

use crate::analysis::matcher::match_field_access;
use crate::analysis::reporter::report;
use crate::analysis::{AnalysisContext, RuleError};
use crate::diagnostic::Diagnostic;
use crate::rule::{Rule, RuleCategory, RuleMetadata};
use crate::syntax::Expr;

pub struct DirectFieldAccessRule {
    metadata: RuleMetadata,
}

impl DirectFieldAccessRule {
    pub fn new() -> Self {
        let metadata = RuleMetadata::new(
            "SMAPI002",
            "Avoid Netcode types when possible",
            "A wrapper-typed field is accessed directly although a property exposes the plain value.",
        )
        .with_category(RuleCategory::Style)
        .with_example_bad("int category = item.category;")
        .with_example_good("int category = item.Category;")
        .with_related("SMAPI001");
        Self { metadata }
    }
}

impl Default for DirectFieldAccessRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DirectFieldAccessRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(
        &self,
        ctx: &AnalysisContext<'_>,
        expr: &Expr,
    ) -> Result<Option<Diagnostic>, RuleError> {
        let Some(found) = match_field_access(ctx.model, expr) else {
            return Ok(None);
        };
        let text = ctx.text(found.access.span)?;
        let message = format!(
            "'{}' is a {} field; consider using the {} property instead. See {} for details.",
            text,
            found.wrapper.wrapper_name,
            found.suggested_property,
            self.metadata.help_uri(ctx.docs_host),
        );
        let receiver = ctx.text(found.receiver.span)?;
        let owner = ctx.model.table().name_of(&found.member.owner);
        let note = format!(
            "'{}' resolves to {} {}.{}",
            receiver, found.member.kind, owner, found.member.name
        );
        Ok(Some(report(&self.metadata, &message, found.access.span, ctx)?.with_note(&note)))
    }
}
