//! Formatting jobs.
//!
//! Each source is one job: the backend (if any) runs over the source, the
//! layout pass runs over the backend output, and the result is written
//! according to the output mode. Jobs never share mutable state, so files are
//! fanned out over a `rayon` pool when parallel mode is on. Their output is
//! buffered and written in input order.

use std::io::{BufRead, Read, Write};
use std::process::ExitCode;

use camino::Utf8Path;
use lambdex_syntax::{TransformOptions, TransformResult, Transformer};
use rayon::prelude::*;
use tracing::{debug, error};

use crate::backend::Backend;
use crate::config::{Config, OutputMode};
use crate::errors::FmtError;
use crate::resource::Resource;

const PIPELINE_TARGET: &str = "lambdex_fmt::pipeline";

/// Exit status when a job failed.
const FAILURE_EXIT: u8 = 2;

/// Lays out the extended lambdas of the code read from `stream`.
///
/// `origin` names the source in errors.
///
/// # Errors
///
/// Returns an error if the stream cannot be read, is not UTF-8, or the
/// layout pass fails.
pub fn format_code(
    origin: &str,
    mut stream: impl BufRead,
    transformer: &Transformer,
) -> Result<String, FmtError> {
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|source| FmtError::read(origin, source))?;
    let code = String::from_utf8(bytes).map_err(|source| FmtError::decode(origin, source))?;
    transformer
        .apply_to_source(&code)
        .map(TransformResult::into_output)
        .map_err(|source| FmtError::syntax(origin, source))
}

/// Counts of job outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    jobs: usize,
    changed: usize,
    failed: usize,
}

impl Summary {
    /// Returns how many jobs ran.
    #[must_use]
    pub const fn jobs(&self) -> usize {
        self.jobs
    }

    /// Returns how many sources changed.
    #[must_use]
    pub const fn changed(&self) -> usize {
        self.changed
    }

    /// Returns how many jobs failed.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Maps the outcome to the process exit status.
    ///
    /// Failures win; changes only count in modes that report them.
    #[must_use]
    pub fn exit_code(&self, mode: OutputMode) -> ExitCode {
        if self.failed > 0 {
            ExitCode::from(FAILURE_EXIT)
        } else if self.changed > 0 && mode.reports_changes() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// Output of a job, held until it can be written in order.
struct JobOutcome {
    origin: String,
    buffer: Vec<u8>,
    result: Result<bool, FmtError>,
}

/// Runs formatting jobs against a backend.
pub struct Pipeline<B> {
    config: Config,
    transformer: Transformer,
    backend: B,
}

impl<B: Backend> Pipeline<B> {
    /// Creates a pipeline for `config`.
    #[must_use]
    pub fn new(config: Config, backend: B) -> Self {
        let transformer = Transformer::new(TransformOptions::new(config.keyword()));
        Self {
            config,
            transformer,
            backend,
        }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Formats the configured files, or `stdin` when there are none.
    ///
    /// Failed jobs are logged and reported on `stderr`; the remaining jobs
    /// still run.
    pub fn run(&self, stdin: impl Read, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Summary {
        let outcomes = if self.config.reads_stdin() {
            vec![self.run_stdin(stdin)]
        } else if self.config.parallel() {
            let files: Vec<&Utf8Path> = self.config.files().collect();
            files.into_par_iter().map(|path| self.run_file(path)).collect()
        } else {
            self.config.files().map(|path| self.run_file(path)).collect()
        };
        report(outcomes, stdout, stderr)
    }

    /// Runs one job over `resource`, returning whether the code changed.
    ///
    /// A backend that exits unsuccessfully is logged and its output is used
    /// anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be driven, the layout pass
    /// fails, or the output cannot be written.
    pub fn run_job(&self, resource: &mut Resource, out: &mut dyn Write) -> Result<bool, FmtError> {
        let command = self
            .config
            .adapter()
            .backend_command(self.config.backend_args());
        let backend_output = match command {
            Some(cmd) => {
                let result = self.backend.call(&cmd, resource.source().as_bytes())?;
                if !result.success() {
                    error!(
                        target: PIPELINE_TARGET,
                        origin = resource.name(),
                        "backend exits unexpectedly"
                    );
                }
                result.into_output()
            }
            None => resource.source().as_bytes().to_vec(),
        };
        resource.set_backend_output(backend_output);

        let code = format_code(
            resource.name(),
            resource.backend_output_stream(),
            &self.transformer,
        )?;
        resource.write_formatted_code(&code, out)?;
        let changed = resource.is_changed(&code);
        debug!(
            target: PIPELINE_TARGET,
            origin = resource.name(),
            changed,
            "job finished"
        );
        Ok(changed)
    }

    fn run_file(&self, path: &Utf8Path) -> JobOutcome {
        let mut buffer = Vec::new();
        let result = Resource::from_file(path, self.config.mode())
            .and_then(|mut resource| self.run_job(&mut resource, &mut buffer));
        JobOutcome {
            origin: path.to_string(),
            buffer,
            result,
        }
    }

    fn run_stdin(&self, stdin: impl Read) -> JobOutcome {
        let mut buffer = Vec::new();
        let result = Resource::from_stdin(stdin, self.config.mode())
            .and_then(|mut resource| self.run_job(&mut resource, &mut buffer));
        JobOutcome {
            origin: String::from("<stdin>"),
            buffer,
            result,
        }
    }
}

fn report(outcomes: Vec<JobOutcome>, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Summary {
    let mut summary = Summary::default();
    for outcome in outcomes {
        summary.jobs += 1;
        let result = stdout
            .write_all(&outcome.buffer)
            .map_err(|source| FmtError::write("stdout", source))
            .and(outcome.result);
        match result {
            Ok(changed) => summary.changed += usize::from(changed),
            Err(err) => {
                summary.failed += 1;
                error!(
                    target: PIPELINE_TARGET,
                    origin = outcome.origin.as_str(),
                    error = %err,
                    "formatting failed"
                );
                let _ = writeln!(stderr, "lxfmt: {err}");
            }
        }
    }
    summary
}
