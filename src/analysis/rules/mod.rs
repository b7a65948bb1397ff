//! Built-in analyzer rules

mod direct_field_access;
mod implicit_comparison;

pub use direct_field_access::DirectFieldAccessRule;
pub use implicit_comparison::ImplicitComparisonRule;

use crate::rule::Rule;

/// Every rule shipped with the analyzer, in rule ID order
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(ImplicitComparisonRule::new()),
        Box::new(DirectFieldAccessRule::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rule_ids() {
        let ids: Vec<_> = builtin_rules().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["SMAPI001", "SMAPI002"]);
    }
}
