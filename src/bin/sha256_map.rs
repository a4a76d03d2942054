//! Print and save a JSON map of relative paths to SHA-256 digests.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use shasums::cli::parse_or_exit;
use shasums::digest_map::{build_digest_map, DIGEST_MAP_FILE};
use shasums::logging::init_logging;

/// CLI arguments for the digest map tool.
#[derive(Parser, Debug)]
#[command(
    name = "sha256-map",
    version,
    about = "Map every file under a directory to its SHA-256 digest"
)]
struct Args {
    /// Directory to walk
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,
}

fn main() -> Result<()> {
    init_logging();
    let args: Args = parse_or_exit();
    run(args)
}

/// Hash the whole tree first; any failure leaves no output behind.
fn run(args: Args) -> Result<()> {
    let map = build_digest_map(&args.directory)?;
    let json = map.to_json_pretty()?;
    println!("{json}");
    fs::write(DIGEST_MAP_FILE, &json).with_context(|| format!("write {DIGEST_MAP_FILE}"))?;
    println!("\nSaved to {DIGEST_MAP_FILE}");
    Ok(())
}
