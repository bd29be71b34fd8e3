//! CLI argument definitions for `lxfmt`.

use camino::Utf8PathBuf;
use clap::Parser;
use lambdex_syntax::DEFAULT_KEYWORD;

use crate::backend::Adapter;
use crate::logging::LogFormat;

/// Command-line interface for the extended-lambda formatter.
#[derive(Parser, Debug)]
#[command(
    name = "lxfmt",
    version,
    about = "Lays out extended lambdas in Python sources"
)]
pub(crate) struct Cli {
    /// Prints the diff for the fixed source.
    #[arg(short, long, conflicts_with_all = ["in_place", "quiet"])]
    pub(crate) diff: bool,
    /// Makes changes to files in place.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) in_place: bool,
    /// Outputs nothing and sets the return value.
    #[arg(short, long)]
    pub(crate) quiet: bool,
    /// Runs in parallel when formatting multiple files.
    #[arg(short, long)]
    pub(crate) parallel: bool,
    /// Style backend run before the layout pass.
    #[arg(long, value_enum, default_value_t = Adapter::Dummy)]
    pub(crate) adapter: Adapter,
    /// Name of the lambda keyword.
    #[arg(long, default_value = DEFAULT_KEYWORD)]
    pub(crate) keyword: String,
    /// Tracing filter directives for log output on stderr.
    #[arg(long, default_value = "warn")]
    pub(crate) log_filter: String,
    /// Log output format.
    #[arg(long, default_value_t = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
    /// Files to format; reads from stdin when none are given.
    #[arg(value_name = "FILE")]
    pub(crate) files: Vec<Utf8PathBuf>,
    /// Arguments passed through to the backend.
    #[arg(last = true, value_name = "BACKEND_ARG")]
    pub(crate) backend_args: Vec<String>,
}
