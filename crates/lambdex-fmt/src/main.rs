//! CLI entrypoint for `lxfmt`.
//!
//! The binary delegates to [`lambdex_fmt::run`], which parses arguments,
//! installs logging, and formats the named files or stdin.

use std::io::{self, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin: StdinLock<'static> = io::stdin().lock();
    let mut stdout: StdoutLock<'static> = io::stdout().lock();
    // Stderr stays unlocked: parallel jobs log to it from worker threads.
    let mut stderr = io::stderr();
    lambdex_fmt::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
