//! Shared fixtures for rule tests

use super::{analyze_unit, builtin_rules, AnalysisContext};
use crate::diagnostic::Diagnostic;
use crate::semantic::bind;
use crate::source::SourceText;
use crate::syntax::parse;
use std::path::Path;

/// Simplified `Netcode` types plus mod code; `{{test-code}}` is replaced by
/// the snippet under test
pub const SAMPLE_PROGRAM: &str = r#"
            using System;
            using StardewValley;
            using Netcode;

            namespace Netcode
            {
                public class NetInt : NetFieldBase<int, NetInt> { }
                public class NetRef : NetFieldBase<object, NetRef> { }
                public class NetFieldBase<T, TSelf> where TSelf : NetFieldBase<T, TSelf>
                {
                    public T Value { get; set; }
                    public static implicit operator T(NetFieldBase<T, TSelf> field) => field.Value;
                }
            }

            namespace StardewValley
            {
                class Item
                {
                    public NetInt category { get; } = new NetInt { Value = 42 };
                }
            }

            namespace SampleMod
            {
                class ModEntry
                {
                    public void Entry()
                    {
                        NetInt intField = new NetInt { Value = 42 };
                        NetRef refField = new NetRef { Value = null };
                        Item item = null;

                        // this line should raise diagnostics
                        {{test-code}} // line 36

                        // these lines should not
                        if ((int)intField != 42);
                    }
                }
            }
        "#;

/// Line of the `{{test-code}}` placeholder
pub const SAMPLE_CODE_LINE: usize = 36;

/// Column of the `{{test-code}}` placeholder
pub const SAMPLE_CODE_COLUMN: usize = 25;

pub const SAMPLE_FILE: &str = "Test0.cs";

pub fn sample_with(code: &str) -> String {
    SAMPLE_PROGRAM.replace("{{test-code}}", code)
}

/// Run every built-in rule over `source`
pub fn analyze_text(source: &str) -> Vec<Diagnostic> {
    let text = SourceText::new(source);
    let unit = parse(&text).expect("fixture should parse");
    let model = bind(&unit);
    let ctx = AnalysisContext::new(Path::new(SAMPLE_FILE), &text, &model);
    analyze_unit(&ctx, &unit, &builtin_rules())
}

/// Run every built-in rule over the sample program with `code` injected
pub fn analyze_snippet(code: &str) -> Vec<Diagnostic> {
    analyze_text(&sample_with(code))
}
