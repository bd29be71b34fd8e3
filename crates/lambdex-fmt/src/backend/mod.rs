//! External style backends.
//!
//! A backend is an opaque "bytes in, bytes out" formatter. The [`Backend`]
//! trait is the seam between the pipeline and the process that runs it, so
//! tests can substitute doubles for [`ProcessBackend`].

use std::io::{self, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use clap::ValueEnum;
use tracing::debug;

use crate::errors::FmtError;

const BACKEND_TARGET: &str = "lambdex_fmt::backend";

/// Output of one backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResult {
    success: bool,
    output: Vec<u8>,
}

impl BackendResult {
    /// Creates a result from an exit status flag and captured stdout.
    #[must_use]
    pub const fn new(success: bool, output: Vec<u8>) -> Self {
        Self { success, output }
    }

    /// Returns whether the backend exited successfully.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Returns the captured output.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consumes the result, returning the captured output.
    #[must_use]
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}

/// Runs a backend command over a source.
///
/// `success` reflects the exit status only; output is returned whatever the
/// status, so callers can decide how to treat a failing backend.
///
/// # Example
///
/// ```rust,no_run
/// use lambdex_fmt::backend::{Backend, ProcessBackend};
///
/// let cmd = vec![String::from("black"), String::from("-q"), String::from("-")];
/// let result = ProcessBackend.call(&cmd, b"x=1\n")?;
/// assert!(result.success());
/// # Ok::<(), lambdex_fmt::FmtError>(())
/// ```
pub trait Backend: Send + Sync {
    /// Feeds `stdin` to `cmd` and captures its stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started or its pipes fail.
    fn call(&self, cmd: &[String], stdin: &[u8]) -> Result<BackendResult, FmtError>;
}

/// Spawns the backend as a child process with piped stdin and stdout.
///
/// Stderr is inherited. The wait has no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessBackend;

impl Backend for ProcessBackend {
    fn call(&self, cmd: &[String], stdin: &[u8]) -> Result<BackendResult, FmtError> {
        let Some((program, args)) = cmd.split_first() else {
            return Err(FmtError::BackendSpawn {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty backend command"),
            });
        };

        debug!(
            target: BACKEND_TARGET,
            program = program.as_str(),
            args = args.len(),
            stdin_bytes = stdin.len(),
            "spawning backend process"
        );

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| FmtError::BackendSpawn {
                program: program.clone(),
                source,
            })?;
        let mut pipe = child.stdin.take().ok_or_else(|| FmtError::BackendIo {
            program: program.clone(),
            source: io::Error::other("failed to capture stdin"),
        })?;

        // Feed stdin from a second thread so a chatty backend cannot fill its
        // stdout pipe while we are still writing.
        let (written, waited) = thread::scope(|scope| {
            let writer = scope.spawn(move || feed(&mut pipe, stdin));
            let waited = child.wait_with_output();
            (writer.join(), waited)
        });

        let io_error = |source: io::Error| FmtError::BackendIo {
            program: program.clone(),
            source,
        };
        written
            .map_err(|_| io_error(io::Error::other("stdin writer panicked")))?
            .map_err(io_error)?;
        let output = waited.map_err(io_error)?;

        debug!(
            target: BACKEND_TARGET,
            program = program.as_str(),
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            "backend process finished"
        );
        Ok(BackendResult::new(output.status.success(), output.stdout))
    }
}

/// Writes `bytes` to the backend. A backend that exits without reading
/// everything is not an error here; its exit status reports it.
fn feed(pipe: &mut ChildStdin, bytes: &[u8]) -> io::Result<()> {
    match pipe.write_all(bytes).and_then(|()| pipe.flush()) {
        Err(error) if error.kind() != io::ErrorKind::BrokenPipe => Err(error),
        _ => Ok(()),
    }
}

/// Style backends the formatter can delegate to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Adapter {
    /// No backend; the source itself is laid out.
    #[default]
    Dummy,
    /// Pipes the source through `yapf`.
    Yapf,
    /// Pipes the source through `black`.
    Black,
}

impl Adapter {
    /// Builds the backend command line, or `None` when no backend runs.
    ///
    /// `args` are passed through to the backend.
    #[must_use]
    pub fn backend_command(self, args: &[String]) -> Option<Vec<String>> {
        match self {
            Self::Dummy => None,
            Self::Yapf => Some(
                std::iter::once(String::from("yapf"))
                    .chain(args.iter().cloned())
                    .collect(),
            ),
            Self::Black => Some(
                [String::from("black"), String::from("-q")]
                    .into_iter()
                    .chain(args.iter().cloned())
                    .chain(std::iter::once(String::from("-")))
                    .collect(),
            ),
        }
    }
}
