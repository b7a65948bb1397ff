//! Configuration for the analyzer
//!
//! Reads configuration from:
//! - `.netfieldlintrc.yaml` / `.netfieldlintrc.json` (project-level)
//! - `~/.netfieldlintrc.yaml` (user-level)

use crate::diagnostic::Severity;
use crate::rule::DEFAULT_DOCS_HOST;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names searched by [`Config::load_default`]
pub const CONFIG_FILE_NAMES: [&str; 3] = [
    ".netfieldlintrc.yaml",
    ".netfieldlintrc.yml",
    ".netfieldlintrc.json",
];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Analyse files in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: ColorMode,
    pub verbose: bool,
    /// Print a summary after the diagnostics
    pub statistics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            verbose: false,
            statistics: true,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Sarif,
    Msbuild,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            "msbuild" | "compact" => Ok(OutputFormat::Msbuild),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// File handling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Include patterns
    pub include: Vec<String>,

    /// Exclude patterns
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.cs".to_string()],
            exclude: vec![
                "**/bin/**".to_string(),
                "**/obj/**".to_string(),
                "**/*.g.cs".to_string(),
                "**/*.Designer.cs".to_string(),
            ],
        }
    }
}

/// Rule configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,

    /// Select rules by ID prefix (e.g. "SMAPI00")
    pub select: Vec<String>,

    /// Severity overrides (rule_id -> severity)
    pub severity: HashMap<String, Severity>,

    /// Per-file rule ignores (glob pattern -> rule IDs)
    pub per_file: HashMap<String, Vec<String>>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Other configuration files to inherit from, relative to this one
    pub extends: Vec<String>,

    pub engine: EngineConfig,

    pub output: OutputConfig,

    pub files: FilesConfig,

    pub rules: RulesConfig,

    /// Host used in rule documentation links
    pub docs_host: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };
        log::debug!("loaded config {}", path.display());

        if config.extends.is_empty() {
            return Ok(config);
        }

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut base = Self::default();
        for extend in &config.extends {
            let extend_path = if Path::new(extend).is_absolute() {
                PathBuf::from(extend)
            } else {
                base_dir.join(extend)
            };
            base.merge(Self::load_with_depth(&extend_path, depth + 1)?);
        }
        base.merge(config);
        Ok(base)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;

        if other.output.format != OutputFormat::Text {
            self.output.format = other.output.format;
        }
        if other.output.color != ColorMode::Auto {
            self.output.color = other.output.color;
        }
        if other.output.verbose {
            self.output.verbose = true;
        }
        self.output.statistics = other.output.statistics;

        for pattern in other.files.include {
            if !self.files.include.contains(&pattern) {
                self.files.include.push(pattern);
            }
        }
        for pattern in other.files.exclude {
            if !self.files.exclude.contains(&pattern) {
                self.files.exclude.push(pattern);
            }
        }

        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.select.extend(other.rules.select);
        self.rules.severity.extend(other.rules.severity);
        for (pattern, rules) in other.rules.per_file {
            self.rules.per_file.entry(pattern).or_default().extend(rules);
        }

        if other.docs_host.is_some() {
            self.docs_host = other.docs_host;
        }
    }

    /// Load configuration from the current directory, then the home directory
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dirs(Some(Path::new(".")), dirs::home_dir().as_deref())
    }

    fn load_from_dirs(cwd: Option<&Path>, home: Option<&Path>) -> Result<Self, ConfigError> {
        for dir in [cwd, home].into_iter().flatten() {
            for name in &CONFIG_FILE_NAMES {
                let path = dir.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }
        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        color: Option<ColorMode>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        selected_rules: Option<Vec<String>>,
        docs_host: Option<String>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(c) = color {
            self.output.color = c;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(selected) = selected_rules {
            self.rules.select = selected;
        }
        if docs_host.is_some() {
            self.docs_host = docs_host;
        }
    }

    /// Documentation host, falling back to the default
    pub fn docs_host(&self) -> &str {
        self.docs_host.as_deref().unwrap_or(DEFAULT_DOCS_HOST)
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.rules.disabled.iter().any(|r| r.eq_ignore_ascii_case(rule_id)) {
            return false;
        }

        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|r| r.eq_ignore_ascii_case(rule_id));
        }

        if !self.rules.select.is_empty() {
            let rule_upper = rule_id.to_uppercase();
            return self
                .rules
                .select
                .iter()
                .any(|prefix| rule_upper.starts_with(&prefix.to_uppercase()));
        }

        true
    }

    /// Get severity override for a rule
    pub fn get_severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.severity.get(rule_id).copied()
    }

    /// Check if a rule should be ignored for a file
    pub fn should_ignore_rule_for_file(&self, rule_id: &str, file_path: &Path) -> bool {
        self.rules.per_file.iter().any(|(pattern, rules)| {
            let Ok(glob) = Glob::new(pattern) else {
                log::warn!("ignoring invalid per_file pattern '{}'", pattern);
                return false;
            };
            glob.compile_matcher().is_match(file_path)
                && rules.iter().any(|r| r == "all" || r == rule_id)
        })
    }

    /// Compile the include and exclude patterns
    pub fn file_filter(&self) -> Result<FileFilter, ConfigError> {
        Ok(FileFilter {
            include: build_glob_set(&self.files.include)?,
            exclude: build_glob_set(&self.files.exclude)?,
        })
    }

    /// Check a path against the include and exclude patterns
    pub fn is_file_included(&self, path: &Path) -> Result<bool, ConfigError> {
        Ok(self.file_filter()?.is_included(path))
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// Compiled file include and exclude patterns
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    pub fn is_included(&self, path: &Path) -> bool {
        (self.include.is_empty() || self.include.is_match(path)) && !self.exclude.is_match(path)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.is_match(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(config.engine.parallel);
        assert_eq!(config.engine.jobs, 0);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.files.include, vec!["**/*.cs"]);
        assert_eq!(config.docs_host(), "smapi.io");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("sarif".parse::<OutputFormat>().unwrap(), OutputFormat::Sarif);
        assert_eq!("msbuild".parse::<OutputFormat>().unwrap(), OutputFormat::Msbuild);
        assert!("junit".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_config_merge_cli() {
        let mut config = Config::new();
        config.merge_cli(
            Some(OutputFormat::Json),
            Some(ColorMode::Never),
            Some(4),
            Some(vec!["SMAPI002".to_string()]),
            None,
            Some("docs.example".to_string()),
        );

        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.color, ColorMode::Never);
        assert_eq!(config.engine.jobs, 4);
        assert!(!config.is_rule_enabled("SMAPI002"));
        assert_eq!(config.docs_host(), "docs.example");
    }

    #[test]
    fn test_rule_enabled() {
        let mut config = Config::new();
        assert!(config.is_rule_enabled("SMAPI001"));

        config.rules.disabled.push("smapi001".to_string());
        assert!(!config.is_rule_enabled("SMAPI001"));
        assert!(config.is_rule_enabled("SMAPI002"));

        config.rules.disabled.clear();
        config.rules.enabled = vec!["SMAPI002".to_string()];
        assert!(!config.is_rule_enabled("SMAPI001"));
        assert!(config.is_rule_enabled("SMAPI002"));
    }

    #[test]
    fn test_select_prefix() {
        let mut config = Config::new();
        config.rules.select = vec!["smapi00".to_string()];
        assert!(config.is_rule_enabled("SMAPI001"));
        assert!(!config.is_rule_enabled("OTHER001"));
    }

    #[test]
    fn test_severity_override() {
        let mut config = Config::new();
        config.rules.severity.insert("SMAPI001".to_string(), Severity::Error);

        assert_eq!(config.get_severity_override("SMAPI001"), Some(Severity::Error));
        assert_eq!(config.get_severity_override("SMAPI002"), None);
    }

    #[test]
    fn test_per_file_ignore() {
        let mut config = Config::new();
        config
            .rules
            .per_file
            .insert("**/Legacy/**".to_string(), vec!["SMAPI002".to_string()]);
        config
            .rules
            .per_file
            .insert("**/Generated.cs".to_string(), vec!["all".to_string()]);

        let legacy = Path::new("src/Legacy/Item.cs");
        assert!(config.should_ignore_rule_for_file("SMAPI002", legacy));
        assert!(!config.should_ignore_rule_for_file("SMAPI001", legacy));
        assert!(config.should_ignore_rule_for_file("SMAPI001", Path::new("a/Generated.cs")));
    }

    #[test]
    fn test_file_filter() {
        let config = Config::new();
        assert!(config.is_file_included(Path::new("src/ModEntry.cs")).unwrap());
        assert!(!config.is_file_included(Path::new("src/obj/Debug/AssemblyInfo.cs")).unwrap());
        assert!(!config.is_file_included(Path::new("src/View.g.cs")).unwrap());
        assert!(!config.is_file_included(Path::new("README.md")).unwrap());
    }

    #[test]
    fn test_invalid_glob() {
        let mut config = Config::new();
        config.files.exclude.push("a/[".to_string());
        assert!(matches!(config.file_filter(), Err(ConfigError::Glob { .. })));
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = r#"
engine:
  parallel: false
  jobs: 4
output:
  format: sarif
rules:
  disabled:
    - SMAPI002
  severity:
    SMAPI001: error
docs_host: mods.example
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.jobs, 4);
        assert_eq!(config.output.format, OutputFormat::Sarif);
        assert_eq!(config.rules.disabled, vec!["SMAPI002"]);
        assert_eq!(config.get_severity_override("SMAPI001"), Some(Severity::Error));
        assert_eq!(config.docs_host(), "mods.example");
    }

    #[test]
    fn test_load_json_and_unknown_extension() {
        let dir = tempdir().unwrap();
        let json = dir.path().join("cfg.json");
        fs::write(&json, r#"{"output": {"format": "msbuild"}}"#).unwrap();
        assert_eq!(Config::load(&json).unwrap().output.format, OutputFormat::Msbuild);

        let toml = dir.path().join("cfg.toml");
        fs::write(&toml, "").unwrap();
        assert!(matches!(Config::load(&toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_extends() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("base.yaml"),
            "rules:\n  disabled: [SMAPI002]\ndocs_host: base.example\n",
        )
        .unwrap();
        let child = dir.path().join("child.yaml");
        fs::write(&child, "extends: [base.yaml]\ndocs_host: child.example\n").unwrap();

        let config = Config::load(&child).unwrap();
        assert!(!config.is_rule_enabled("SMAPI002"));
        assert_eq!(config.docs_host(), "child.example");
    }

    #[test]
    fn test_self_extending_config_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loop.yaml");
        fs::write(&path, "extends: [loop.yaml]\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_dirs_prefers_first_dir() {
        let cwd = tempdir().unwrap();
        let home = tempdir().unwrap();
        fs::write(home.path().join(".netfieldlintrc.yml"), "engine:\n  jobs: 2\n").unwrap();

        let config = Config::load_from_dirs(Some(cwd.path()), Some(home.path())).unwrap();
        assert_eq!(config.engine.jobs, 2);

        fs::write(cwd.path().join(".netfieldlintrc.json"), r#"{"engine": {"jobs": 3}}"#).unwrap();
        let config = Config::load_from_dirs(Some(cwd.path()), Some(home.path())).unwrap();
        assert_eq!(config.engine.jobs, 3);

        let empty = tempdir().unwrap();
        assert_eq!(Config::load_from_dirs(Some(empty.path()), None).unwrap(), Config::default());
    }
}
