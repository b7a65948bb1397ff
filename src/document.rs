//! C# source document: text, syntax tree, semantic model and suppressions

use crate::semantic::{bind, SemanticModel};
use crate::source::SourceText;
use crate::syntax::{parse, CompilationUnit, ParseError};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

/// Matches any rule ID in a suppression directive
pub const ALL_RULES: &str = "all";

struct Patterns {
    pragma: Regex,
    disable: Regex,
    disable_next: Regex,
    disable_file: Regex,
}

fn compile_patterns() -> Result<Patterns, regex::Error> {
    Ok(Patterns {
        pragma: Regex::new(r"^\s*#\s*pragma\s+warning\s+(disable|restore)\b([^/\r\n]*)")?,
        disable: Regex::new(r"//\s*netfield-lint-disable\s+(\S+)")?,
        disable_next: Regex::new(r"//\s*netfield-lint-disable-next-line\s+(\S+)")?,
        disable_file: Regex::new(r"//\s*netfield-lint-disable-file\s+(\S+)")?,
    })
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            compile_patterns()
                .map_err(|e| log::warn!("suppression directives disabled: {}", e))
                .ok()
        })
        .as_ref()
}

/// A `#pragma warning disable|restore` line; no IDs means every rule
#[derive(Debug, Clone, PartialEq, Eq)]
struct PragmaDirective {
    line: usize,
    disable: bool,
    rule_ids: Vec<String>,
}

impl PragmaDirective {
    fn applies_to(&self, rule_id: &str) -> bool {
        self.rule_ids.is_empty()
            || self.rule_ids.iter().any(|id| id == rule_id || id == ALL_RULES)
    }
}

/// Suppression directives found in a source file
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    /// Lines with disable comments (rule_id -> set of lines)
    disabled_lines: HashMap<String, HashSet<usize>>,
    /// Rules disabled for the entire file
    disabled_file_rules: HashSet<String>,
    /// Pragmas in source order
    pragmas: Vec<PragmaDirective>,
}

impl Suppressions {
    /// Scan source text for pragma and comment directives
    pub fn scan(text: &str) -> Self {
        let mut suppressions = Suppressions::default();
        let Some(patterns) = patterns() else {
            return suppressions;
        };

        for (i, line) in text.lines().enumerate() {
            let line_num = i + 1;

            if let Some(cap) = patterns.pragma.captures(line) {
                suppressions.pragmas.push(PragmaDirective {
                    line: line_num,
                    disable: &cap[1] == "disable",
                    rule_ids: cap[2]
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(String::from)
                        .collect(),
                });
            }

            for cap in patterns.disable_file.captures_iter(line) {
                suppressions.disabled_file_rules.insert(cap[1].to_string());
            }

            for cap in patterns.disable.captures_iter(line) {
                suppressions
                    .disabled_lines
                    .entry(cap[1].to_string())
                    .or_default()
                    .insert(line_num);
            }

            for cap in patterns.disable_next.captures_iter(line) {
                suppressions
                    .disabled_lines
                    .entry(cap[1].to_string())
                    .or_default()
                    .insert(line_num + 1);
            }
        }

        suppressions
    }

    /// Check if a rule is disabled at a specific line
    pub fn is_rule_disabled(&self, rule_id: &str, line: usize) -> bool {
        let on_line = [ALL_RULES, rule_id].iter().any(|id| {
            self.disabled_lines
                .get(*id)
                .is_some_and(|lines| lines.contains(&line))
        });
        // the last pragma at or above the line that names the rule decides
        on_line
            || self
                .pragmas
                .iter()
                .take_while(|p| p.line <= line)
                .filter(|p| p.applies_to(rule_id))
                .last()
                .is_some_and(|p| p.disable)
    }

    /// Check if a rule is disabled for the entire file
    pub fn is_rule_disabled_for_file(&self, rule_id: &str) -> bool {
        self.disabled_file_rules.contains(ALL_RULES) || self.disabled_file_rules.contains(rule_id)
    }
}

/// A parsed and bound C# file
pub struct CSharpDocument {
    source: SourceText,
    unit: CompilationUnit,
    model: SemanticModel,
    suppressions: Suppressions,
}

impl CSharpDocument {
    /// Parse and bind C# content
    pub fn parse(content: &str, path: &Path) -> Result<Self, ParseError> {
        let source = SourceText::new(content);
        let unit = parse(&source)?;
        let model = bind(&unit);
        let suppressions = Suppressions::scan(content);
        log::debug!(
            "{}: {} types, {} lines",
            path.display(),
            unit.all_types().len(),
            source.line_count()
        );
        Ok(Self {
            source,
            unit,
            model,
            suppressions,
        })
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    /// Get source line at line number (1-based)
    pub fn get_source_line(&self, line: usize) -> Option<&str> {
        self.source.line(line)
    }

    pub fn is_rule_disabled(&self, rule_id: &str, line: usize) -> bool {
        self.suppressions.is_rule_disabled(rule_id, line)
    }

    pub fn is_rule_disabled_for_file(&self, rule_id: &str) -> bool {
        self.suppressions.is_rule_disabled_for_file(rule_id)
    }
}
