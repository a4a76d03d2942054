//! Write a `.sha256` checksum file next to every file in a directory.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use shasums::cli::parse_or_exit;
use shasums::logging::init_logging;
use shasums::paths::display_name;
use shasums::pool::default_workers;
use shasums::sidecar::{collect_candidates, write_sidecars, SidecarOutcome};

/// CLI arguments for the sidecar tool.
#[derive(Parser, Debug)]
#[command(
    name = "sha256-sidecar",
    version,
    about = "Write a .sha256 file for every file in a directory"
)]
struct Args {
    /// Directory whose files get checksum sidecars
    #[arg(value_name = "TARGET_DIRECTORY")]
    directory: PathBuf,

    /// Also process files in all subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Worker threads used for hashing (default: logical core count)
    #[arg(short, long, value_name = "N", value_parser = parse_workers)]
    workers: Option<usize>,
}

fn main() -> Result<ExitCode> {
    init_logging();
    let args: Args = parse_or_exit();
    run(args)
}

fn run(args: Args) -> Result<ExitCode> {
    if !args.directory.is_dir() {
        eprintln!(
            "Error: '{}' is not a valid directory.",
            args.directory.display()
        );
        return Ok(ExitCode::FAILURE);
    }

    if args.recursive {
        println!("Recursively scanning directory: {}", args.directory.display());
    } else {
        println!("Scanning directory: {}", args.directory.display());
    }
    let files = collect_candidates(&args.directory, args.recursive)?;
    if files.is_empty() {
        println!("No files found to process.");
        return Ok(ExitCode::SUCCESS);
    }

    let workers = args.workers.unwrap_or_else(default_workers);
    println!(
        "Found {} files. Processing with {} workers...",
        files.len(),
        workers
    );

    let summary = write_sidecars(
        &files,
        workers,
        |path| println!("Processing: {}...", display_name(path)),
        report_outcome,
    );

    println!(
        "\nAll files processed! ({} written, {} failed)",
        summary.written, summary.failed
    );
    Ok(ExitCode::SUCCESS)
}

fn report_outcome(outcome: &SidecarOutcome) {
    match outcome {
        SidecarOutcome::Written { sidecar, .. } => {
            println!("Success: {}", display_name(sidecar));
        }
        SidecarOutcome::ReadFailed { source, error } => {
            eprintln!("Error: cannot read file '{}': {error}", source.display());
        }
        SidecarOutcome::WriteFailed { sidecar, error, .. } => {
            eprintln!(
                "Error: cannot write checksum file '{}': {error}",
                sidecar.display()
            );
        }
    }
}

fn parse_workers(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("worker count must be at least 1".to_string()),
        Ok(workers) => Ok(workers),
        Err(err) => Err(err.to_string()),
    }
}
