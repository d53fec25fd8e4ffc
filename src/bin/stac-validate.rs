//! STAC validation CLI.
//!
//! Validates local files, directories and URLs against the STAC core and
//! extension schemas, printing a per-file report and a summary. The exit
//! code is derived from the aggregated counts.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use stac_validate::{
    tidy_issues, validate_with_cache, ConfigError, ExtensionPolicy, Input, Issue, LintMode,
    Report, SchemaCache, Summary, ValidationConfig,
};

#[derive(Parser)]
#[command(name = "stac-validate")]
#[command(about = "Validate STAC catalogs, collections and items against their JSON Schemas")]
#[command(version)]
struct Cli {
    /// Files, directories or HTTP(S) URLs to validate
    files: Vec<String>,

    /// Validate against schemas in a local STAC folder
    #[arg(long, short = 's')]
    schemas: Option<PathBuf>,

    /// Redirect a schema URI prefix to a local path, e.g.
    /// https://stac-extensions.github.io/foo/v1.0.0/schema.json=./schema.json
    #[arg(long = "schema-map", value_name = "URI=PATH")]
    schema_map: Vec<String>,

    /// Check whether local JSON files are well-formatted (2-space indentation)
    #[arg(long, short = 'l')]
    lint: bool,

    /// Rewrite malformed local JSON files in place. Implies --lint
    #[arg(long, short = 'f')]
    format: bool,

    /// Stop checking extensions for an entry once its core schema failed
    #[arg(long)]
    skip_extensions: bool,

    /// Levels to recurse into when expanding directories; -1 is unlimited
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    depth: i32,

    /// Output the full report tree as JSON
    #[arg(long)]
    json: bool,

    /// Only print failures and the summary
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Load options from a JSON config file; explicit CLI flags win
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

/// Options accepted in a `--config` file. Field names match the CLI flags.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FileConfig {
    files: Vec<String>,
    schemas: Option<PathBuf>,
    schema_map: Vec<String>,
    lint: bool,
    format: bool,
    skip_extensions: bool,
    depth: Option<i32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stac_validate=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::from(error.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, ConfigError> {
    let file_config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => FileConfig::default(),
    };

    let files = if cli.files.is_empty() {
        file_config.files
    } else {
        cli.files.clone()
    };
    if files.is_empty() {
        return Err(ConfigError::NoInput);
    }

    let schemas = cli.schemas.clone().or(file_config.schemas);
    if let Some(folder) = &schemas {
        if !folder.is_dir() {
            return Err(ConfigError::SchemaFolderNotADirectory {
                path: folder.clone(),
            });
        }
    }

    let lint = match (
        cli.format || file_config.format,
        cli.lint || file_config.lint,
    ) {
        (true, _) => LintMode::Fix,
        (false, true) => LintMode::Check,
        (false, false) => LintMode::Off,
    };

    let map_entries = if cli.schema_map.is_empty() {
        file_config.schema_map
    } else {
        cli.schema_map.clone()
    };

    let mut config = ValidationConfig::new().lint(lint);
    if let Some(folder) = schemas {
        config = config.schema_folder(folder);
    }
    for entry in &map_entries {
        match entry.split_once('=') {
            Some((uri, path)) if Path::new(path).is_file() => {
                config = config.map_schema(uri, path);
            }
            Some((uri, path)) => {
                eprintln!("Warning: schema mapping for {uri} is not a valid file: {path}");
            }
            None => {
                eprintln!("Warning: ignoring malformed schema map entry '{entry}' (expected URI=PATH)");
            }
        }
    }
    if cli.skip_extensions || file_config.skip_extensions {
        config = config.extension_policy(ExtensionPolicy::SkipOnCoreFailure);
    }

    let depth = cli.depth_or(file_config.depth);
    let inputs = expand_inputs(&files, depth);

    // One cache for the whole run: schemas compile once across all files
    let mut cache = SchemaCache::new(&config);
    let mut reports = Vec::with_capacity(inputs.len());
    let mut totals = Summary::default();
    for input in inputs {
        let report = validate_with_cache(Input::Path(input), &config, &mut cache);
        if !cli.json {
            print_report(&report, cli.quiet);
        }
        merge_summary(&mut totals, report.summary());
        reports.push(report);
    }

    if cli.json {
        let output = serde_json::json!({ "reports": reports, "summary": totals });
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    } else {
        print_summary(&totals);
    }

    let malformed = totals.malformed.unwrap_or(0);
    let failed = totals.invalid > 0 || (lint == LintMode::Check && malformed > 0);
    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

impl Cli {
    fn depth_or(&self, fallback: Option<i32>) -> i32 {
        if self.depth != -1 {
            self.depth
        } else {
            fallback.unwrap_or(-1)
        }
    }
}

fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::ConfigFileNotFound {
        path: path.to_path_buf(),
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::ConfigFileInvalid { source })
}

/// Expand directory arguments to the .json files beneath them; file and
/// URL arguments pass through in order.
fn expand_inputs(files: &[String], depth: i32) -> Vec<String> {
    let mut inputs = Vec::new();
    for file in files {
        let path = Path::new(file);
        if path.is_dir() {
            let mut found = Vec::new();
            collect_json_files(path, depth, &mut found);
            found.sort();
            inputs.extend(found.into_iter().map(|p| p.display().to_string()));
        } else {
            inputs.push(file.clone());
        }
    }
    inputs
}

fn collect_json_files(dir: &Path, depth: i32, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth != 0 {
                collect_json_files(&path, depth.saturating_sub(1).max(-1), files);
            }
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

fn merge_summary(totals: &mut Summary, summary: Summary) {
    totals.total += summary.total;
    totals.valid += summary.valid;
    totals.invalid += summary.invalid;
    totals.skipped += summary.skipped;
    if let Some(malformed) = summary.malformed {
        *totals.malformed.get_or_insert(0) += malformed;
    }
}

fn print_report(report: &Report, quiet: bool) {
    let all_ok = report.valid != Some(false)
        && report.lint.as_ref().map_or(true, |lint| lint.valid)
        && report.children.iter().all(|c| c.valid != Some(false));
    if quiet && all_ok {
        return;
    }

    let name = report.id.as_deref().unwrap_or("<unnamed>");
    println!("- {name}");

    if let Some(lint) = &report.lint {
        if let Some(error) = &lint.error {
            println!("  \x1b[31m✗\x1b[0m lint: {error}");
        } else if lint.fixed {
            println!("  \x1b[33m⚠\x1b[0m lint: file was malformed, rewrote it");
        } else if !lint.valid {
            println!("  \x1b[33m⚠\x1b[0m lint: file is malformed, use --format to fix");
            if let Some(diff) = &lint.diff {
                println!("    {diff}");
            }
        }
    }

    if report.children.is_empty() {
        print_entry(report, "  ");
    } else {
        for child in &report.children {
            let id = child.id.as_deref().unwrap_or("<unnamed>");
            if quiet && child.valid != Some(false) {
                continue;
            }
            println!("  {id}:");
            print_entry(child, "    ");
        }
    }
}

fn print_entry(report: &Report, indent: &str) {
    for message in &report.messages {
        println!("{indent}\x1b[33m⚠\x1b[0m {message}");
    }
    match report.valid {
        Some(true) => println!("{indent}\x1b[32m✓\x1b[0m valid"),
        Some(false) => {
            println!("{indent}\x1b[31m✗\x1b[0m invalid");
            print_issues("core", &report.results.core, indent);
            for (schema, errors) in &report.results.extensions {
                print_issues(schema, errors, indent);
            }
            print_issues("custom", &report.results.custom, indent);
        }
        None => {}
    }
}

fn print_issues(label: &str, issues: &[Issue], indent: &str) {
    if issues.is_empty() {
        return;
    }
    let mut issues = issues.to_vec();
    tidy_issues(&mut issues);
    println!("{indent}  {label}:");
    for issue in &issues {
        println!("{indent}    {}", issue.human_message());
    }
}

fn print_summary(totals: &Summary) {
    println!();
    println!("Total: {}", totals.total);
    println!("Valid: {}", totals.valid);
    println!("Invalid: {}", totals.invalid);
    println!("Skipped: {}", totals.skipped);
    if let Some(malformed) = totals.malformed {
        println!("Malformed: {malformed}");
    }
}
