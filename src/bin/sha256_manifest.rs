//! Write a sorted SHA-256 manifest for the entries of a zip archive.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use shasums::cli::parse_or_exit;
use shasums::logging::init_logging;
use shasums::manifest::generate_manifest;
use shasums::paths::display_name;

/// CLI arguments for the manifest tool.
#[derive(Parser, Debug)]
#[command(
    name = "sha256-manifest",
    version,
    about = "Generate a SHA-256 manifest for a zip file"
)]
struct Args {
    /// Path to the zip file; the manifest is written beside it as <stem>.json
    #[arg(value_name = "ZIP_FILE")]
    zip_file: PathBuf,
}

fn main() -> ExitCode {
    init_logging();
    let args: Args = parse_or_exit();

    println!(
        "Generating manifest for '{}'...",
        display_name(&args.zip_file)
    );
    let result = generate_manifest(&args.zip_file, |key, _| {
        println!("  - hashed: {key}");
    });
    match result {
        Ok(report) => {
            println!(
                "\nSuccess! Manifest written to: '{}'",
                report.manifest_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err.message);
            for detail in &err.details {
                eprintln!("  {detail}");
            }
            ExitCode::FAILURE
        }
    }
}
