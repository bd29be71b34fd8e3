//! Immutable formatter configuration.

use camino::{Utf8Path, Utf8PathBuf};
use lambdex_syntax::DEFAULT_KEYWORD;

use crate::backend::Adapter;
use crate::cli::Cli;
use crate::errors::FmtError;
use crate::logging::LogFormat;

/// Where formatted code goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Writes the formatted code to stdout.
    #[default]
    Print,
    /// Writes a unified diff against the source to stdout.
    Diff,
    /// Rewrites changed files.
    InPlace,
    /// Writes nothing; the exit code reports changes.
    Quiet,
}

impl OutputMode {
    /// Returns whether changes make the run exit with status 1.
    #[must_use]
    pub const fn reports_changes(self) -> bool {
        matches!(self, Self::Diff | Self::Quiet)
    }
}

/// Options for one invocation, read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    adapter: Adapter,
    mode: OutputMode,
    parallel: bool,
    files: Vec<Utf8PathBuf>,
    keyword: String,
    backend_args: Vec<String>,
    log_filter: String,
    log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adapter: Adapter::Dummy,
            mode: OutputMode::Print,
            parallel: false,
            files: Vec::new(),
            keyword: DEFAULT_KEYWORD.to_owned(),
            backend_args: Vec::new(),
            log_filter: String::from("warn"),
            log_format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Sets the style backend.
    #[must_use]
    pub const fn with_adapter(mut self, adapter: Adapter) -> Self {
        self.adapter = adapter;
        self
    }

    /// Sets the output mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables parallel formatting of files.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the files to format.
    #[must_use]
    pub fn with_files(mut self, files: Vec<Utf8PathBuf>) -> Self {
        self.files = files;
        self
    }

    /// Sets the lambda keyword.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Sets the arguments passed to the backend.
    #[must_use]
    pub fn with_backend_args(mut self, args: Vec<String>) -> Self {
        self.backend_args = args;
        self
    }

    /// Sets the tracing filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Sets the log format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Builds the configuration from parsed arguments.
    pub(crate) fn from_cli(cli: Cli) -> Result<Self, FmtError> {
        if cli.files.is_empty() && (cli.in_place || cli.diff) {
            return Err(FmtError::StdinWithFileFlags);
        }
        let mode = if cli.diff {
            OutputMode::Diff
        } else if cli.in_place {
            OutputMode::InPlace
        } else if cli.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Print
        };
        Ok(Self {
            adapter: cli.adapter,
            mode,
            parallel: cli.parallel,
            files: cli.files,
            keyword: cli.keyword,
            backend_args: cli.backend_args,
            log_filter: cli.log_filter,
            log_format: cli.log_format,
        })
    }

    /// Returns the style backend.
    #[must_use]
    pub const fn adapter(&self) -> Adapter {
        self.adapter
    }

    /// Returns the output mode.
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Returns whether files are formatted in parallel.
    #[must_use]
    pub const fn parallel(&self) -> bool {
        self.parallel
    }

    /// Returns the files to format; empty means stdin.
    #[must_use]
    pub fn files(&self) -> impl ExactSizeIterator<Item = &Utf8Path> {
        self.files.iter().map(Utf8PathBuf::as_path)
    }

    /// Returns whether the source comes from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the lambda keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Returns the arguments passed to the backend.
    #[must_use]
    pub fn backend_args(&self) -> &[String] {
        &self.backend_args
    }

    /// Returns the tracing filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    fn config(args: &[&str]) -> Result<Config, FmtError> {
        let cli = Cli::try_parse_from(std::iter::once("lxfmt").chain(args.iter().copied()))
            .map_err(FmtError::Usage)?;
        Config::from_cli(cli)
    }

    #[rstest]
    #[case(&["a.py"], OutputMode::Print)]
    #[case(&["-d", "a.py"], OutputMode::Diff)]
    #[case(&["-i", "a.py"], OutputMode::InPlace)]
    #[case(&["-q", "a.py"], OutputMode::Quiet)]
    #[case(&["-q"], OutputMode::Quiet)]
    fn selects_output_mode(#[case] args: &[&str], #[case] mode: OutputMode) {
        assert_eq!(config(args).expect("valid").mode(), mode);
    }

    #[rstest]
    #[case(&["-i"])]
    #[case(&["--diff"])]
    fn file_flags_need_files(#[case] args: &[&str]) {
        let err = config(args).expect_err("stdin with file flags");
        assert!(matches!(err, FmtError::StdinWithFileFlags));
        assert!(err.is_usage());
    }

    #[test]
    fn carries_every_option() {
        let built = config(&[
            "-p",
            "--adapter",
            "yapf",
            "--keyword",
            "deflambda",
            "--log-filter",
            "debug",
            "x.py",
            "--",
            "--style",
            "pep8",
        ])
        .expect("valid");
        let expected = Config::default()
            .with_adapter(Adapter::Yapf)
            .with_parallel(true)
            .with_files(vec![Utf8PathBuf::from("x.py")])
            .with_keyword("deflambda")
            .with_backend_args(vec![String::from("--style"), String::from("pep8")])
            .with_log_filter("debug");
        assert_eq!(built, expected);
    }
}
