//! Shared command-line entry handling.

use clap::Parser;
use std::process;

/// Exit status for usage errors; `--help` and `--version` still exit 0.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

/// Parse process arguments, exiting with `usage_exit_code` on failure.
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            process::exit(usage_exit_code(&err));
        }
    }
}
