//! netfield-lint - net field analyzer for C# mod code
//!
//! Game objects expose their state through "net field" wrapper types that
//! convert implicitly to the value they hold. Two rules guard against misuse:
//!
//! - `SMAPI001`: a wrapper is implicitly converted as an operand of a
//!   comparison (`field != null` tests the wrapped value, not the field).
//! - `SMAPI002`: a wrapper-typed field is read directly although a plain
//!   property exposes the value.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Engine -> CSharpDocument (lexer, parser, binder) -> analysis rules -> Diagnostic
//! ```
//!
//! The engine loads configuration, parses and binds each file, offers every
//! expression node to the enabled rules, then applies suppressions and
//! severity overrides before the output formatters run.
//!
//! ```
//! use netfield_lint::{Config, Engine};
//! use std::path::Path;
//!
//! let engine = Engine::new(Config::default());
//! let result = engine.lint_source(Path::new("ModEntry.cs"), "class ModEntry { int x; }");
//! assert!(result.is_clean());
//! ```

pub mod analysis;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod engine;
pub mod output;
pub mod rule;
pub mod semantic;
pub mod source;
pub mod syntax;

// Re-export main types
pub use analysis::{builtin_rules, classify, AnalysisContext, RuleError, WrapperInfo};
pub use config::Config;
pub use diagnostic::{Diagnostic, Location, Severity};
pub use document::CSharpDocument;
pub use engine::{Engine, FailureKind, FileFailure, LintResult};
pub use output::OutputFormatter;
pub use rule::{Rule, RuleCategory, RuleMetadata};
pub use semantic::{bind, SemanticModel};
pub use source::{SourceText, Span};
pub use syntax::{parse, ParseError};
