//! Runtime for `lxfmt`, the extended-lambda formatter.
//!
//! A run parses the command line into an immutable [`Config`], installs
//! logging, and hands every source to a [`Pipeline`]. Each source may first be
//! piped through a style backend (`yapf` or `black`); the layout pass from
//! `lambdex_syntax` then rewrites the extended lambdas of the backend output.
//!
//! Exit codes: 0 on success, 1 when `--diff` or `--quiet` found changes, 2 on
//! usage errors or when any job failed.

pub mod backend;
mod cli;
pub mod config;
mod errors;
pub mod logging;
pub mod pipeline;
pub mod resource;
pub mod telemetry;

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

pub use backend::{Adapter, Backend, BackendResult, ProcessBackend};
pub use config::{Config, OutputMode};
pub use errors::FmtError;
pub use logging::LogFormat;
pub use pipeline::{Pipeline, Summary, format_code};
pub use resource::{Origin, Resource};

use cli::Cli;

/// Exit status for command-line misuse.
const USAGE_EXIT: u8 = 2;

/// Runs the formatter using the provided arguments and IO handles.
///
/// Help and version output go to `stdout`; diagnostics go to `stderr`.
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", FmtError::Usage(error));
            return ExitCode::from(USAGE_EXIT);
        }
    };

    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "lxfmt: {error}");
            return ExitCode::from(USAGE_EXIT);
        }
    };

    if let Err(error) = telemetry::initialise(&config).map_err(FmtError::from) {
        let _ = writeln!(stderr, "lxfmt: {error}");
        return ExitCode::from(USAGE_EXIT);
    }

    let pipeline = Pipeline::new(config, ProcessBackend);
    let summary = pipeline.run(stdin, stdout, stderr);
    summary.exit_code(pipeline.config().mode())
}
