//! netfield-lint CLI
//!
//! Flags implicit conversions and direct field reads of auto-converting
//! wrapper types in C# mod code.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use glob::glob;
use netfield_lint::config::{ColorMode, Config, FileFilter, OutputFormat};
use netfield_lint::engine::Engine;
use netfield_lint::output::formatter_for;
use netfield_lint::{builtin_rules, Rule, RuleMetadata, Severity};
use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "netfield-lint",
    version,
    about = "Net field analyzer for C# mods",
    long_about = "Reports implicit conversions of Netcode wrapper types in comparisons (SMAPI001) \
                  and direct reads of wrapper fields that have a plain property (SMAPI002)."
)]
struct Cli {
    /// Files, directories or glob patterns to analyse
    files: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Print progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Option<Vec<String>>,

    /// Only run rules whose ID starts with one of these prefixes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    select: Option<Vec<String>>,

    /// Host used in rule documentation links
    #[arg(long)]
    docs_host: Option<String>,

    /// Show statistics
    #[arg(long)]
    stats: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Exit with 0 even if warnings are found
    #[arg(long)]
    exit_zero: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show detailed information about a rule
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Sarif,
    Msbuild,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::Sarif => OutputFormat::Sarif,
            Format::Msbuild => OutputFormat::Msbuild,
        }
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn print_rule(rule: &RuleMetadata, enabled: bool) {
    println!(
        "    {} [{}] ({}){}",
        rule.id.cyan(),
        severity_label(rule.severity),
        rule.category,
        if enabled { "".normal() } else { " [disabled]".dimmed() }
    );
    println!("      {}", rule.title);
}

fn explain_rule(rule: &RuleMetadata, docs_host: &str) {
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), rule.id.cyan());
    println!("  {}: {}", "Title".bold(), rule.title);
    println!("  {}: {}", "Severity".bold(), severity_label(rule.severity));
    println!("  {}: {}", "Category".bold(), rule.category);

    println!();
    println!("  {}", "Description".bold());
    println!("  {}", rule.description);

    if let Some(rationale) = &rule.rationale {
        println!();
        println!("  {}", "Rationale".bold());
        println!("  {}", rationale);
    }

    if let Some(bad) = &rule.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(incorrect)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = &rule.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(correct)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }

    println!();
    println!("  {}: {}", "Documentation".bold(), rule.help_uri(docs_host).blue());

    if !rule.related.is_empty() {
        println!();
        println!("  {}: {}", "Related Rules".bold(), rule.related.join(", "));
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_default().context("failed to load config")?,
    };
    config.merge_cli(
        cli.format.map(OutputFormat::from),
        cli.no_color.then_some(ColorMode::Never),
        cli.jobs,
        cli.disable.clone(),
        cli.select.clone(),
        cli.docs_host.clone(),
    );
    if cli.verbose {
        config.output.verbose = true;
    }
    if cli.stats {
        config.output.statistics = true;
    }
    Ok(config)
}

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {
            if !std::io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

/// Expand directories to their C# files and glob patterns to matches
fn collect_files(inputs: &[String], filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            files.insert(path.to_path_buf());
            continue;
        }

        let (pattern, from_dir) = if path.is_dir() {
            (format!("{}/**/*.cs", input.trim_end_matches(['/', '\\'])), true)
        } else {
            (input.clone(), false)
        };

        let entries = glob(&pattern).with_context(|| format!("invalid pattern '{}'", input))?;
        for entry in entries.flatten() {
            if !entry.is_file() {
                continue;
            }
            let keep = if from_dir {
                filter.is_included(&entry)
            } else {
                !filter.is_excluded(&entry)
            };
            if keep {
                files.insert(entry);
            } else {
                log::debug!("excluded {}", entry.display());
            }
        }
    }
    Ok(files.into_iter().collect())
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli)?;
    apply_color_mode(config.output.color);

    if let Some(Commands::Explain { rule_id }) = &cli.command {
        let rules = builtin_rules();
        let Some(rule) = rules.iter().find(|r| r.id().eq_ignore_ascii_case(rule_id)) else {
            eprintln!("Use {} to see all available rules", "--list-rules".cyan());
            bail!("rule '{}' not found", rule_id);
        };
        explain_rule(rule.metadata(), config.docs_host());
        return Ok(0);
    }

    if cli.list_rules {
        println!("{}", "Available rules:".bold());
        for rule in builtin_rules() {
            print_rule(rule.metadata(), config.is_rule_enabled(rule.id()));
        }
        return Ok(0);
    }

    let inputs = if cli.files.is_empty() {
        vec![".".to_string()]
    } else {
        cli.files.clone()
    };
    let filter = config.file_filter()?;
    let files = collect_files(&inputs, &filter)?;
    if files.is_empty() {
        bail!("no C# files found to analyse");
    }
    if config.output.verbose {
        eprintln!("Analysing {} files", files.len());
    }

    let engine = Engine::new(config);
    let result = engine.lint(&files);

    let metadata: Vec<RuleMetadata> = engine.rules().iter().map(|r| r.metadata().clone()).collect();
    let output = engine.config().output.clone();
    let formatter = formatter_for(
        output.format,
        output.color != ColorMode::Never,
        output.statistics,
        &metadata,
        engine.config().docs_host(),
    );
    print!("{}", formatter.format(&result));

    Ok(if cli.exit_zero { 0 } else { result.exit_code() })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {:#}", "error".red().bold(), err);
            2
        }
    };
    std::process::exit(code);
}
