//! Core analyzer engine

use crate::analysis::{analyze_unit, builtin_rules, AnalysisContext};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, Severity};
use crate::document::CSharpDocument;
use crate::rule::Rule;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Stack for lint workers; binding recurses once per expression nesting level
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Why a file could not be analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Read,
    Parse,
}

/// A file that produced no diagnostics because it could not be analysed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Result of an analysis run
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics, sorted by file, line, column and rule ID
    pub diagnostics: Vec<Diagnostic>,

    /// Files that could not be read or parsed
    pub failures: Vec<FileFailure>,

    pub files_processed: usize,

    pub files_with_warnings: usize,

    pub error_count: usize,

    pub warning_count: usize,

    pub info_count: usize,

    pub duration: Duration,
}

impl LintResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0 || !self.failures.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// Check if result is clean (no errors, warnings or failed files)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }

    /// Get exit code (0 = success, 1 = warnings, 2 = errors or failed files)
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            2
        } else if self.has_warnings() {
            1
        } else {
            0
        }
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: LintResult) {
        self.diagnostics.extend(other.diagnostics);
        self.failures.extend(other.failures);
        self.files_processed += other.files_processed;
        self.files_with_warnings += other.files_with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
    }

    fn count(&mut self) {
        self.error_count = 0;
        self.warning_count = 0;
        self.info_count = 0;
        for diag in &self.diagnostics {
            match diag.severity {
                Severity::Error => self.error_count += 1,
                Severity::Warning => self.warning_count += 1,
                Severity::Info => self.info_count += 1,
            }
        }
    }

    fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

/// The analyzer engine: built-in rules filtered by configuration
pub struct Engine {
    config: Config,
    rules: Vec<Box<dyn Rule>>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let rules: Vec<Box<dyn Rule>> = builtin_rules()
            .into_iter()
            .filter(|rule| config.is_rule_enabled(rule.id()))
            .collect();
        log::debug!(
            "enabled rules: {}",
            rules.iter().map(|r| r.id()).collect::<Vec<_>>().join(", ")
        );
        Self { config, rules }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rules that run on every file
    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Lint multiple files
    pub fn lint(&self, files: &[PathBuf]) -> LintResult {
        let start = Instant::now();

        let results: Vec<LintResult> = if self.config.engine.parallel && files.len() > 1 {
            let jobs = if self.config.engine.jobs > 0 {
                self.config.engine.jobs
            } else {
                num_cpus::get()
            };
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .stack_size(WORKER_STACK_SIZE)
                .build();
            match pool {
                Ok(pool) => pool.install(|| files.par_iter().map(|f| self.lint_file(f)).collect()),
                Err(err) => {
                    log::warn!("falling back to the global thread pool: {}", err);
                    files.par_iter().map(|f| self.lint_file(f)).collect()
                }
            }
        } else {
            files.iter().map(|f| self.lint_file(f)).collect()
        };

        let mut combined = LintResult::default();
        for result in results {
            combined.merge(result);
        }
        combined.sort();
        combined.duration = start.elapsed();
        combined
    }

    /// Lint a single file from disk
    pub fn lint_file(&self, path: &Path) -> LintResult {
        match std::fs::read_to_string(path) {
            Ok(content) => self.lint_source(path, &content),
            Err(e) => {
                log::warn!("{}: {}", path.display(), e);
                LintResult {
                    files_processed: 1,
                    failures: vec![FileFailure {
                        path: path.to_path_buf(),
                        kind: FailureKind::Read,
                        message: format!("Failed to read file: {}", e),
                    }],
                    ..LintResult::default()
                }
            }
        }
    }

    /// Lint in-memory C# source attributed to `path`
    pub fn lint_source(&self, path: &Path, content: &str) -> LintResult {
        let start = Instant::now();
        let mut result = LintResult {
            files_processed: 1,
            ..LintResult::default()
        };

        let document = match CSharpDocument::parse(content, path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("{}: {}", path.display(), e);
                result.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    kind: FailureKind::Parse,
                    message: e.to_string(),
                });
                return result;
            }
        };

        let ctx = AnalysisContext::new(path, document.source(), document.model())
            .with_docs_host(self.config.docs_host());
        result.diagnostics = analyze_unit(&ctx, document.unit(), &self.rules)
            .into_iter()
            .filter(|diag| !self.is_suppressed(diag, &document, path))
            .map(|diag| match self.config.get_severity_override(&diag.rule_id) {
                Some(severity) => diag.with_severity(severity),
                None => diag,
            })
            .collect();

        result.sort();
        result.count();
        if result.warning_count > 0 || result.error_count > 0 {
            result.files_with_warnings = 1;
        }
        result.duration = start.elapsed();
        log::debug!(
            "{}: {} diagnostics in {:?}",
            path.display(),
            result.diagnostics.len(),
            result.duration
        );
        result
    }

    fn is_suppressed(&self, diag: &Diagnostic, document: &CSharpDocument, path: &Path) -> bool {
        self.config.should_ignore_rule_for_file(&diag.rule_id, path)
            || document.is_rule_disabled_for_file(&diag.rule_id)
            || document.is_rule_disabled(&diag.rule_id, diag.location.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{sample_with, SAMPLE_CODE_LINE};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn engine() -> Engine {
        Engine::new(Config::default())
    }

    fn rule_ids(result: &LintResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.rule_id.as_str()).collect()
    }

    #[test]
    fn test_lint_result_exit_code() {
        let mut result = LintResult::default();
        assert_eq!(result.exit_code(), 0);

        result.warning_count = 1;
        assert_eq!(result.exit_code(), 1);

        result.error_count = 1;
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_failed_file_exits_with_error() {
        let mut result = LintResult::default();
        result.failures.push(FileFailure {
            path: PathBuf::from("a.cs"),
            kind: FailureKind::Parse,
            message: "x".to_string(),
        });
        assert!(!result.is_clean());
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_lint_result_merge() {
        let mut result1 = LintResult {
            files_processed: 1,
            error_count: 2,
            ..LintResult::default()
        };
        let result2 = LintResult {
            files_processed: 1,
            warning_count: 3,
            files_with_warnings: 1,
            ..LintResult::default()
        };

        result1.merge(result2);
        assert_eq!(result1.files_processed, 2);
        assert_eq!(result1.error_count, 2);
        assert_eq!(result1.warning_count, 3);
        assert_eq!(result1.files_with_warnings, 1);
    }

    #[test]
    fn test_lint_source_counts_warnings() {
        let source = sample_with("if (item.category == intField) { int c = item.category; }");
        let result = engine().lint_source(Path::new("Test0.cs"), &source);
        assert_eq!(rule_ids(&result), vec!["SMAPI002", "SMAPI002"]);
        assert_eq!(result.warning_count, 2);
        assert_eq!(result.files_with_warnings, 1);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_diagnostics_sorted_by_column() {
        let source = sample_with("if (intField > 0 && refField != null);");
        let result = engine().lint_source(Path::new("Test0.cs"), &source);
        let columns: Vec<_> = result.diagnostics.iter().map(|d| d.location.column).collect();
        let mut sorted = columns.clone();
        sorted.sort();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns, sorted);
    }

    #[test]
    fn test_disabled_rule_is_not_run() {
        let mut config = Config::default();
        config.rules.disabled.push("SMAPI001".to_string());
        let engine = Engine::new(config);
        assert_eq!(
            engine.rules().iter().map(|r| r.id()).collect::<Vec<_>>(),
            vec!["SMAPI002"]
        );
        let result = engine.lint_source(Path::new("Test0.cs"), &sample_with("if (intField < 1);"));
        assert!(result.is_clean());
    }

    #[test]
    fn test_severity_override() {
        let mut config = Config::default();
        config.rules.severity.insert("SMAPI001".to_string(), Severity::Error);
        let result = Engine::new(config)
            .lint_source(Path::new("Test0.cs"), &sample_with("if (intField < 1);"));
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_docs_host_from_config() {
        let mut config = Config::default();
        config.docs_host = Some("mods.example".to_string());
        let result = Engine::new(config)
            .lint_source(Path::new("Test0.cs"), &sample_with("if (intField < 1);"));
        assert!(result.diagnostics[0]
            .message
            .contains("https://mods.example/buildmsg/SMAPI001"));
    }

    #[test]
    fn test_inline_suppression() {
        let code = "// netfield-lint-disable-next-line SMAPI001\n if (intField < 1);";
        let result = engine().lint_source(Path::new("Test0.cs"), &sample_with(code));
        assert!(result.is_clean());

        let code = "if (intField < 1); // netfield-lint-disable SMAPI002";
        let result = engine().lint_source(Path::new("Test0.cs"), &sample_with(code));
        assert_eq!(rule_ids(&result), vec!["SMAPI001"]);
        assert_eq!(result.diagnostics[0].location.line, SAMPLE_CODE_LINE);
    }

    #[test]
    fn test_pragma_suppression() {
        let code = "\n#pragma warning disable SMAPI002\nint a = item.category;\n#pragma warning restore SMAPI002\nint b = item.category;";
        let result = engine().lint_source(Path::new("Test0.cs"), &sample_with(code));
        assert_eq!(rule_ids(&result), vec!["SMAPI002"]);
        assert_eq!(result.diagnostics[0].location.line, SAMPLE_CODE_LINE + 4);
    }

    #[test]
    fn test_per_file_ignore() {
        let mut config = Config::default();
        config
            .rules
            .per_file
            .insert("**/Legacy/*.cs".to_string(), vec!["all".to_string()]);
        let engine = Engine::new(config);
        let source = sample_with("if (intField < 1);");
        assert!(engine.lint_source(Path::new("src/Legacy/Old.cs"), &source).is_clean());
        assert!(!engine.lint_source(Path::new("src/New.cs"), &source).is_clean());
    }

    #[test]
    fn test_parse_failure_is_recorded() {
        let result = engine().lint_source(Path::new("Broken.cs"), "class A {");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, FailureKind::Parse);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_deeply_nested_file_fails_without_stopping_the_run() {
        let dir = tempdir().unwrap();
        let generated = dir.path().join("Generated.cs");
        let chain = vec!["\"a\""; 20_000].join(" + ");
        fs::write(&generated, sample_with(&format!("var s = {};", chain))).unwrap();
        let bad = dir.path().join("Bad.cs");
        fs::write(&bad, sample_with("int c = item.category;")).unwrap();

        let result = engine().lint(&[generated.clone(), bad.clone()]);
        assert_eq!(result.files_processed, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, generated);
        assert_eq!(result.failures[0].kind, FailureKind::Parse);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].location.file, bad);
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_lint_files_in_parallel() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("Good.cs");
        let bad = dir.path().join("Bad.cs");
        fs::write(&good, sample_with("if (intField < 1);")).unwrap();
        fs::write(&bad, sample_with("int c = item.category;")).unwrap();
        let missing = dir.path().join("Missing.cs");

        let result = engine().lint(&[good.clone(), bad.clone(), missing.clone()]);
        assert_eq!(result.files_processed, 3);
        assert_eq!(result.files_with_warnings, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, missing);
        assert_eq!(result.failures[0].kind, FailureKind::Read);
        // sorted by file path
        assert_eq!(result.diagnostics[0].location.file, bad);
        assert_eq!(result.diagnostics[1].location.file, good);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = dir.path().join(format!("F{}.cs", i));
                fs::write(&path, sample_with("if (refField != null);")).unwrap();
                path
            })
            .collect();

        let parallel = engine().lint(&files);
        let mut config = Config::default();
        config.engine.parallel = false;
        let sequential = Engine::new(config).lint(&files);
        assert_eq!(parallel.diagnostics, sequential.diagnostics);
    }
}
