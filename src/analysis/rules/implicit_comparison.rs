//! SMAPI001: wrapper operand implicitly converted inside a comparison

use crate::analysis::matcher::match_implicit_comparison;
use crate::analysis::reporter::report;
use crate::analysis::{AnalysisContext, RuleError};
use crate::diagnostic::Diagnostic;
use crate::rule::{Rule, RuleCategory, RuleMetadata};
use crate::syntax::Expr;

pub struct ImplicitComparisonRule {
    metadata: RuleMetadata,
}

impl ImplicitComparisonRule {
    pub fn new() -> Self {
        let metadata = RuleMetadata::new(
            "SMAPI001",
            "Netcode types shouldn't be implicitly converted",
            "Comparing a wrapper type directly relies on its implicit conversion to the underlying value.",
        )
        .with_category(RuleCategory::Correctness)
        .with_rationale(
            "Comparison operators and null checks on a wrapper silently convert it, \
             so `field != null` tests the wrapped value rather than the wrapper itself.",
        )
        .with_example_bad("if (item.category != 42)")
        .with_example_good("if (item.category.Value != 42)")
        .with_related("SMAPI002");
        Self { metadata }
    }
}

impl Default for ImplicitComparisonRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ImplicitComparisonRule {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(
        &self,
        ctx: &AnalysisContext<'_>,
        expr: &Expr,
    ) -> Result<Option<Diagnostic>, RuleError> {
        let Some(found) = match_implicit_comparison(ctx.model, expr) else {
            return Ok(None);
        };
        let text = ctx.text(found.operand.span)?;
        let wrapper = &found.wrapper;
        let message = format!(
            "This implicitly converts '{}' from {} to {}, but {} has unintuitive implicit conversion rules. \
             Consider comparing against the actual value instead to avoid bugs. See {} for details.",
            text,
            wrapper.wrapper_name,
            wrapper.target_name,
            wrapper.wrapper_name,
            self.metadata.help_uri(ctx.docs_host),
        );
        let diagnostic = report(&self.metadata, &message, found.operand.span, ctx)?
            .with_note(&format!("operand of '{}' comparison", found.op.as_str()));
        Ok(Some(diagnostic))
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::test_support::*;
    use crate::diagnostic::Severity;
    use pretty_assertions::assert_eq;

    fn expected_message(expression: &str, from: &str, to: &str) -> String {
        format!(
            "This implicitly converts '{expression}' from {from} to {to}, but {from} has unintuitive implicit conversion rules. Consider comparing against the actual value instead to avoid bugs. See https://smapi.io/buildmsg/SMAPI001 for details."
        )
    }

    fn assert_single(code: &str, column: usize, expression: &str, from: &str, to: &str) {
        let diagnostics = analyze_snippet(code);
        assert_eq!(diagnostics.len(), 1, "{}: {:?}", code, diagnostics);
        let diag = &diagnostics[0];
        assert_eq!(diag.rule_id, "SMAPI001");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.message, expected_message(expression, from, to));
        assert_eq!(diag.location.line, SAMPLE_CODE_LINE);
        assert_eq!(diag.location.column, SAMPLE_CODE_COLUMN + column);
        assert_eq!(diag.location.length, expression.chars().count());
    }

    #[test]
    fn test_each_comparison_operator() {
        for op in ["<", "<=", ">", ">=", "==", "!="] {
            let code = format!("if (intField {} 42);", op);
            assert_single(&code, 4, "intField", "NetInt", "Int32");
        }
    }

    #[test]
    fn test_reference_wrapper_against_null() {
        assert_single("if (refField != null);", 4, "refField", "NetRef", "Object");
    }

    #[test]
    fn test_conditional_access_chain() {
        assert_single("if (item?.category != 42);", 4, "item?.category", "NetInt", "Int32");
    }

    #[test]
    fn test_wrapper_on_right_side() {
        assert_single("if (42 == intField);", 10, "intField", "NetInt", "Int32");
    }

    #[test]
    fn test_wrapper_against_wrapper() {
        assert_eq!(analyze_snippet("if (intField == intField);"), Vec::new());
        assert_eq!(analyze_snippet("if (intField != refField);"), Vec::new());
    }

    #[test]
    fn test_explicit_cast_is_not_reported() {
        assert_eq!(analyze_snippet("if ((int)intField != 42);"), Vec::new());
        assert_eq!(analyze_snippet("if (intField.Value != 42);"), Vec::new());
    }

    #[test]
    fn test_column_stable_with_unrelated_parentheses() {
        let diagnostics = analyze_snippet("if (((intField)) < (42));");
        assert_eq!(diagnostics.len(), 1);
        // the parenthesized operand is reported as written
        assert_eq!(diagnostics[0].location.column, SAMPLE_CODE_COLUMN + 4);
        assert!(diagnostics[0].message.contains("'((intField))'"));

        let diagnostics = analyze_snippet("if ((1 + 2) > 0 && intField < 42);");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location.column, SAMPLE_CODE_COLUMN + 19);

        // parentheses after the operand do not move it
        let columns: Vec<_> = [
            "if (intField < 42);",
            "if (intField < (42));",
            "if (intField < ((40) + (2)));",
        ]
        .iter()
        .map(|code| {
            let diagnostics = analyze_snippet(code);
            assert_eq!(diagnostics.len(), 1, "{}", code);
            (diagnostics[0].location.line, diagnostics[0].location.column)
        })
        .collect();
        assert_eq!(columns, vec![(SAMPLE_CODE_LINE, SAMPLE_CODE_COLUMN + 4); 3]);
    }

    const STRUCT_WRAPPER: &str = r#"
        using Netcode;

        namespace Netcode
        {
            public struct NetInt
            {
                public int Value;
                public static implicit operator int(NetInt field) => field.Value;
            }
        }

        namespace SampleMod
        {
            class Item { public NetInt category; }

            class ModEntry
            {
                public void Entry(Item item)
                {
                    if (item?.category != 42);
                }
            }
        }
    "#;

    #[test]
    fn test_struct_wrapper_behind_conditional_access() {
        let diagnostics = analyze_text(STRUCT_WRAPPER);
        assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
        let diag = &diagnostics[0];
        assert_eq!(diag.rule_id, "SMAPI001");
        assert_eq!(diag.message, expected_message("item?.category", "NetInt", "Int32"));
        assert_eq!((diag.location.line, diag.location.column), (21, 25));
    }

    #[test]
    fn test_note_names_operator() {
        let diagnostics = analyze_snippet("if (intField <= 42);");
        assert_eq!(diagnostics[0].notes, vec!["operand of '<=' comparison"]);
        assert_eq!(diagnostics[0].help_uri.as_deref(), Some("https://smapi.io/buildmsg/SMAPI001"));
    }
}
