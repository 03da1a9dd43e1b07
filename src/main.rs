//! macrule - expand macro rules defined with `#pragma macrule rule`
//!
//! # Usage
//!
//! ```bash
//! # Print the expanded token stream
//! macrule expand demo.c
//!
//! # Report diagnostics and the rules found
//! macrule check demo.c --format json
//!
//! # Use settings from a manifest
//! macrule expand demo.c --config macrule.toml -vv
//! ```

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use diagnostics::ErrorFormatter;
use log::info;
use preprocessor::{preprocess, Preprocessor};
use rules::{logging, parse_manifest, Manifest, RuleLocator};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "macrule")]
#[command(version = "0.1.0")]
#[command(about = "Macro-rule compiler for C-like sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a source file and print the result
    Expand {
        /// Path to the source file
        file: PathBuf,

        /// Manifest with preprocessor and output settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Increase log verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// Process a source file and report diagnostics and rules
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Manifest with preprocessor and output settings
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

/// Result of running the preprocessor over one file
struct Session {
    pp: Preprocessor,
    locator: std::rc::Rc<std::cell::RefCell<RuleLocator>>,
    output: String,
    manifest: Manifest,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Expand { file, config, verbose } => {
            if verbose > 0 {
                logging::init_with_level(logging::level_for_verbosity(verbose));
            } else {
                logging::init_from_env();
            }
            expand_file(&file, config.as_deref())
        }
        Commands::Check { file, format, config } => {
            logging::init_from_env();
            check_file(&file, format, config.as_deref())
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_manifest(path: Option<&Path>) -> Result<Manifest, String> {
    let Some(path) = path else {
        return Ok(Manifest::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_manifest(&content)
}

fn run_session(file: &Path, config: Option<&Path>) -> Result<Session, String> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()));
    }
    let source = std::fs::read_to_string(file).map_err(|e| format!("Failed to read file: {}", e))?;
    let manifest = load_manifest(config)?;

    let mut pp = Preprocessor::new(manifest.preprocessor_config());
    let locator = rules::install(&mut pp);
    info!("expanding {}", file.display());
    let output = preprocess(&mut pp, &file.display().to_string(), &source);

    Ok(Session {
        pp,
        locator,
        output,
        manifest,
    })
}

fn formatter(manifest: &Manifest) -> ErrorFormatter {
    if manifest.color() {
        ErrorFormatter::with_colors()
    } else {
        ErrorFormatter::new()
    }
}

/// Returns whether the file expanded without errors
fn expand_file(file: &Path, config: Option<&Path>) -> Result<bool, String> {
    let session = run_session(file, config)?;
    let diagnostics = session.pp.diagnostics();
    if !diagnostics.is_empty() {
        eprintln!(
            "{}",
            formatter(&session.manifest).format_diagnostics(diagnostics, session.pp.source_map())
        );
    }
    print!("{}", session.output);
    Ok(!diagnostics.has_errors())
}

/// Returns whether the file processed without errors
fn check_file(file: &Path, format: OutputFormat, config: Option<&Path>) -> Result<bool, String> {
    let session = run_session(file, config)?;
    let diagnostics = session.pp.diagnostics();
    let source_map = session.pp.source_map();
    let locator = session.locator.borrow();

    match format {
        OutputFormat::Text => {
            if !diagnostics.is_empty() {
                println!("{}", formatter(&session.manifest).format_diagnostics(diagnostics, source_map));
            }
            println!("Rules: {}", locator.len());
            for rule in locator.iter() {
                let params: Vec<String> = rule
                    .parameters
                    .iter()
                    .map(|p| format!("{}:{}{}", p.name, p.kind, if p.variadic { "*" } else { "" }))
                    .collect();
                println!(
                    "  {} ({}) -> {}{}  at {}",
                    rule.name.as_deref().unwrap_or("<anonymous>"),
                    params.join(", "),
                    rule.generated_kind,
                    if rule.has_loops { " [loop]" } else { "" },
                    source_map.describe(rule.range.begin)
                );
            }
            println!(
                "Errors: {}, warnings: {}",
                diagnostics.errors().count(),
                diagnostics.warnings().count()
            );
        }
        OutputFormat::Json => {
            let reported: Vec<_> = diagnostics
                .iter()
                .map(|d| {
                    json!({
                        "severity": d.severity.to_string(),
                        "code": d.code,
                        "message": d.message,
                        "line": d.span.start.line,
                        "column": d.span.start.column,
                    })
                })
                .collect();
            let report = json!({
                "status": if diagnostics.has_errors() { "error" } else { "ok" },
                "rules": &*locator,
                "diagnostics": reported,
            });
            let text = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode report: {}", e))?;
            println!("{}", text);
        }
    }

    Ok(!diagnostics.has_errors())
}
