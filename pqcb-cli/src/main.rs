use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use pqcb_core::batch::{self, BatchSummary};
use pqcb_core::checksum_list::{write_checksum_list, CHECKSUM_LIST_FILE};
use pqcb_core::csv_validator::CsvValidator;
use pqcb_core::generate::{self, write_verify_script};
use pqcb_core::json_validator::JsonValidator;
use pqcb_core::manifest::MANIFEST_FILE;
use pqcb_core::path_safety::PathPolicy;
use pqcb_core::validation::{ValidationResult, Validator, ValidatorSet};
use pqcb_core::verify::verify_manifest_file;

const DEFAULT_DATA_DIR: &str = "results";

#[derive(Parser)]
#[command(name = "pqcb", version, about = "PQC benchmark artifacts: validate results, generate and verify checksums")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Validate a JSON/CSV result file or a directory of them
    Validate {
        /// File or directory to validate
        path: PathBuf,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Only print the summary
        #[arg(short, long)]
        quiet: bool,
        /// Write checksums.txt next to the validated path
        #[arg(long)]
        checksums: bool,
        /// Required top-level JSON field (repeatable; replaces the default `algorithm`)
        #[arg(long = "require-field")]
        require_field: Vec<String>,
        /// Expected CSV column (repeatable; replaces the default set)
        #[arg(long = "expect-column")]
        expect_column: Vec<String>,
    },
    /// Hash every artifact under DATA_DIR into a manifest
    Generate {
        #[arg(default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
        #[arg(long, default_value = MANIFEST_FILE)]
        output: PathBuf,
    },
    /// Verify artifacts against a manifest
    Verify {
        #[arg(long, default_value = MANIFEST_FILE)]
        manifest: PathBuf,
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
        /// Reject every symlink instead of following those that stay inside the data directory
        #[arg(long)]
        no_follow_symlinks: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let outcome = match cli.cmd {
        Cmd::Validate { path, recursive, quiet, checksums, require_field, expect_column } => {
            let mut set = ValidatorSet::default();
            if !require_field.is_empty() {
                set.json = JsonValidator::new(require_field);
            }
            if !expect_column.is_empty() {
                set.csv = CsvValidator::new(expect_column);
            }
            validate(&path, recursive, quiet, checksums, &set)
        }
        Cmd::Generate { data_dir, output } => generate(&data_dir, &output),
        Cmd::Verify { manifest, data_dir, no_follow_symlinks } => {
            verify(&manifest, &data_dir, PathPolicy { follow_symlinks: !no_follow_symlinks })
        }
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn validate(
    path: &Path,
    recursive: bool,
    quiet: bool,
    checksums: bool,
    set: &ValidatorSet,
) -> Result<bool> {
    let results = if path.is_file() {
        let Some(v) = Validator::for_path_with(path, set) else {
            let ext = path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
            bail!("Unsupported file type: .{ext}");
        };
        vec![v.validate(path)]
    } else if path.is_dir() {
        batch::validate_directory(path, recursive, set)
            .with_context(|| format!("validate {}", path.display()))?
    } else {
        bail!("Path not found: {}", path.display());
    };

    if !quiet {
        for r in &results {
            print_details(r);
        }
    }
    let all_valid = print_summary(&results);

    if checksums && !results.is_empty() {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let out = dir.join(CHECKSUM_LIST_FILE);
        write_checksum_list(&out, &results).with_context(|| format!("write {}", out.display()))?;
        println!("Checksums written to: {}", out.display());
    }
    Ok(all_valid)
}

fn print_details(r: &ValidationResult) {
    println!("\n{}: {}", status(r), r.file_path);
    if !r.errors.is_empty() {
        println!("  Errors:");
        for e in &r.errors {
            println!("    - {e}");
        }
    }
    if !r.warnings.is_empty() {
        println!("  Warnings:");
        for w in &r.warnings {
            println!("    - {w}");
        }
    }
}

fn print_summary(results: &[ValidationResult]) -> bool {
    let summary = BatchSummary::from_results(results);
    let rule = "=".repeat(70);
    let thin = "-".repeat(70);
    println!("\n{rule}\nValidation Summary\n{rule}");
    println!("Total files validated: {}", summary.total);
    println!("Valid: {}", summary.valid);
    println!("Invalid: {}", summary.invalid);
    println!("{rule}\n");

    if summary.invalid > 0 {
        println!("Invalid Files:\n{thin}");
        for r in batch::invalid_results(results) {
            println!("\nERROR: {}", r.file_path);
            for e in &r.errors {
                println!("   ERROR: {e}");
            }
            for w in &r.warnings {
                println!("   WARNING: {w}");
            }
        }
        println!();
    }

    let mut warned = batch::warned_results(results).peekable();
    if warned.peek().is_some() {
        println!("Valid Files with Warnings:\n{thin}");
        for r in warned {
            println!("\nWARN: {}", r.file_path);
            for w in &r.warnings {
                println!("   WARNING: {w}");
            }
        }
        println!();
    }

    println!("Checksums:\n{thin}");
    for r in results {
        let name = Path::new(&r.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| r.file_path.clone());
        match &r.checksum {
            Some(sum) => println!("{} {}: {}...", status(r), name, &sum[..16]),
            None => println!("{} {}: N/A", status(r), name),
        }
    }
    println!();

    summary.all_valid()
}

fn status(r: &ValidationResult) -> &'static str {
    if r.valid {
        "VALID"
    } else {
        "INVALID"
    }
}

fn generate(data_dir: &Path, output: &Path) -> Result<bool> {
    println!("Scanning: {}", data_dir.display());
    let mani = generate::generate(data_dir)
        .with_context(|| format!("generate checksums for {}", data_dir.display()))?;
    for (rel, entry) in &mani.checksums {
        println!("  {}: {}...", rel, &entry.sha256[..16]);
    }
    mani.save(output).with_context(|| format!("write {}", output.display()))?;
    let program = std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| env!("CARGO_BIN_NAME").to_string());
    let script =
        write_verify_script(output, data_dir, &program).context("write verification script")?;
    tracing::info!(script = %script.display(), manifest = %output.display(), "verification entry point written");

    println!("\nGenerated checksums for {} files", mani.total_files);
    println!("Manifest: {}", output.display());
    println!("Verify with: {}", script.display());
    Ok(true)
}

fn verify(manifest: &Path, data_dir: &Path, policy: PathPolicy) -> Result<bool> {
    let report = verify_manifest_file(manifest, data_dir, policy)
        .with_context(|| format!("verify {}", manifest.display()))?;
    println!("Results: {}/{} verified", report.verified, report.total);
    if report.is_ok() {
        println!("OK");
        return Ok(true);
    }
    println!("\nFailed files ({}):", report.failed.len());
    for (path, reason) in &report.failed {
        println!("  - {path}: {reason}");
    }
    println!("BAD");
    Ok(false)
}
