//! SARIF (Static Analysis Results Interchange Format) output formatter
//!
//! SARIF is a standard format for static analysis tools, supported by
//! GitHub code scanning, Azure DevOps, and Visual Studio.

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;
use crate::rule::RuleMetadata;
use serde::Serialize;

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

/// SARIF formatter for CI/CD integration
#[derive(Default)]
pub struct SarifFormatter {
    pub tool_name: String,
    pub tool_version: String,
    rules: Vec<SarifRule>,
}

impl SarifFormatter {
    pub fn new(tool_name: &str, tool_version: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            tool_version: tool_version.to_string(),
            rules: Vec::new(),
        }
    }

    /// Describe `rules` in the driver's rule table, linking docs on `docs_host`
    pub fn with_rules(mut self, rules: &[RuleMetadata], docs_host: &str) -> Self {
        self.rules = rules
            .iter()
            .map(|meta| SarifRule {
                id: meta.id.clone(),
                name: meta.title.clone(),
                short_description: SarifMessage {
                    text: meta.title.clone(),
                },
                full_description: SarifMessage {
                    text: meta.description.clone(),
                },
                help_uri: Some(meta.help_uri(docs_host)),
                default_configuration: SarifConfiguration {
                    level: severity_to_level(meta.severity),
                },
                properties: SarifRuleProperties {
                    category: meta.category.to_string(),
                },
            })
            .collect();
        self
    }

    /// Rule table for a run: every registered rule, plus any rule seen only in results
    fn rules_for(&self, diagnostics: &[Diagnostic]) -> Vec<SarifRule> {
        let mut rules = self.rules.clone();
        for diag in diagnostics {
            if rules.iter().any(|r| r.id == diag.rule_id) {
                continue;
            }
            let text = diag.help.clone().unwrap_or_else(|| diag.message.clone());
            rules.push(SarifRule {
                id: diag.rule_id.clone(),
                name: text.clone(),
                short_description: SarifMessage { text: text.clone() },
                full_description: SarifMessage { text },
                help_uri: diag.help_uri.clone(),
                default_configuration: SarifConfiguration {
                    level: severity_to_level(diag.severity),
                },
                properties: SarifRuleProperties::default(),
            });
        }
        rules
    }
}

#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    invocations: Vec<SarifInvocation>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Clone, Serialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "fullDescription")]
    full_description: SarifMessage,
    #[serde(rename = "helpUri", skip_serializing_if = "Option::is_none")]
    help_uri: Option<String>,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifConfiguration,
    properties: SarifRuleProperties,
}

#[derive(Debug, Clone, Default, Serialize)]
struct SarifRuleProperties {
    #[serde(skip_serializing_if = "String::is_empty")]
    category: String,
}

#[derive(Debug, Clone, Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Clone, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<SarifRegion>,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn")]
    start_column: usize,
    #[serde(rename = "endColumn", skip_serializing_if = "Option::is_none")]
    end_column: Option<usize>,
}

#[derive(Serialize)]
struct SarifInvocation {
    #[serde(rename = "executionSuccessful")]
    execution_successful: bool,
    #[serde(rename = "toolExecutionNotifications")]
    tool_execution_notifications: Vec<SarifNotification>,
}

#[derive(Serialize)]
struct SarifNotification {
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

fn severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn to_result(d: &Diagnostic) -> SarifResult {
    SarifResult {
        rule_id: d.rule_id.clone(),
        level: severity_to_level(d.severity),
        message: SarifMessage {
            text: d.message.clone(),
        },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifactLocation {
                    uri: d.location.file.display().to_string(),
                },
                region: Some(SarifRegion {
                    start_line: d.location.line,
                    start_column: d.location.column,
                    end_column: (d.location.length > 0)
                        .then(|| d.location.column + d.location.length),
                }),
            },
        }],
    }
}

impl OutputFormatter for SarifFormatter {
    fn format(&self, result: &LintResult) -> String {
        let invocations = if result.failures.is_empty() {
            Vec::new()
        } else {
            vec![SarifInvocation {
                execution_successful: false,
                tool_execution_notifications: result
                    .failures
                    .iter()
                    .map(|f| SarifNotification {
                        level: "error",
                        message: SarifMessage {
                            text: f.message.clone(),
                        },
                        locations: vec![SarifLocation {
                            physical_location: SarifPhysicalLocation {
                                artifact_location: SarifArtifactLocation {
                                    uri: f.path.display().to_string(),
                                },
                                region: None,
                            },
                        }],
                    })
                    .collect(),
            }]
        };

        let report = SarifReport {
            schema: SARIF_SCHEMA,
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: self.tool_name.clone(),
                        version: self.tool_version.clone(),
                        information_uri: "https://smapi.io",
                        rules: self.rules_for(&result.diagnostics),
                    },
                },
                results: result.diagnostics.iter().map(to_result).collect(),
                invocations,
            }],
        };

        serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
            log::warn!("failed to serialize SARIF report: {}", e);
            String::new()
        })
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        serde_json::to_string_pretty(&to_result(diagnostic)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::builtin_rules;
    use crate::diagnostic::Location;
    use crate::engine::{FailureKind, FileFailure};
    use std::path::PathBuf;

    fn metadata() -> Vec<RuleMetadata> {
        builtin_rules().iter().map(|r| r.metadata().clone()).collect()
    }

    #[test]
    fn test_sarif_format() {
        let formatter = SarifFormatter::new("netfield-lint", "0.1.0").with_rules(&metadata(), "smapi.io");
        let result = LintResult {
            diagnostics: vec![Diagnostic::new(
                "SMAPI001",
                Severity::Warning,
                "Test message",
                Location::new(PathBuf::from("ModEntry.cs"), 10, 5).with_length(8),
            )],
            files_processed: 1,
            warning_count: 1,
            ..Default::default()
        };

        let output = formatter.format(&result);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["version"], "2.1.0");
        assert_eq!(value["$schema"], SARIF_SCHEMA);

        let run = &value["runs"][0];
        let rules = run["tool"]["driver"]["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["id"], "SMAPI001");
        assert_eq!(rules[0]["helpUri"], "https://smapi.io/buildmsg/SMAPI001");
        assert_eq!(rules[1]["properties"]["category"], "style");

        let region = &run["results"][0]["locations"][0]["physicalLocation"]["region"];
        assert_eq!(region["startLine"], 10);
        assert_eq!(region["endColumn"], 13);
        assert!(run.get("invocations").is_none());
    }

    #[test]
    fn test_sarif_unregistered_rule_is_described() {
        let formatter = SarifFormatter::new("netfield-lint", "0.1.0");
        let result = LintResult {
            diagnostics: vec![Diagnostic::new(
                "CUSTOM",
                Severity::Info,
                "msg",
                Location::new(PathBuf::from("a.cs"), 1, 1),
            )],
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&formatter.format(&result)).unwrap();
        let rules = &value["runs"][0]["tool"]["driver"]["rules"];
        assert_eq!(rules[0]["id"], "CUSTOM");
        assert_eq!(rules[0]["defaultConfiguration"]["level"], "note");
    }

    #[test]
    fn test_sarif_failures_become_notifications() {
        let formatter = SarifFormatter::new("netfield-lint", "0.1.0");
        let result = LintResult {
            failures: vec![FileFailure {
                path: PathBuf::from("Broken.cs"),
                kind: FailureKind::Parse,
                message: "syntax error".to_string(),
            }],
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&formatter.format(&result)).unwrap();
        let invocation = &value["runs"][0]["invocations"][0];
        assert_eq!(invocation["executionSuccessful"], false);
        assert_eq!(invocation["toolExecutionNotifications"][0]["message"]["text"], "syntax error");
    }

    #[test]
    fn test_sarif_severity_mapping() {
        assert_eq!(severity_to_level(Severity::Error), "error");
        assert_eq!(severity_to_level(Severity::Warning), "warning");
        assert_eq!(severity_to_level(Severity::Info), "note");
    }
}
