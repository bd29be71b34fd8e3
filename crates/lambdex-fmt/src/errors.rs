//! Error types for the formatter runtime.

use std::io;
use std::string::FromUtf8Error;

use lambdex_syntax::SyntaxError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Errors raised while formatting sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FmtError {
    /// The command line could not be parsed.
    #[error("{0}")]
    Usage(clap::Error),
    /// `--in-place` or `--diff` was requested without any file.
    #[error("cannot use --in-place or --diff flags when reading from stdin")]
    StdinWithFileFlags,
    /// Reading a source failed.
    #[error("failed to read {origin}: {source}")]
    Read {
        /// Where the source came from.
        origin: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Writing formatted output failed.
    #[error("failed to write {origin}: {source}")]
    Write {
        /// Where the output was going.
        origin: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The backend process could not be started.
    #[error("failed to spawn backend `{program}`: {source}")]
    BackendSpawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Talking to a running backend failed.
    #[error("backend `{program}` I/O failed: {source}")]
    BackendIo {
        /// Program being driven.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Source or backend output is not UTF-8.
    #[error("{origin} is not valid UTF-8: {source}")]
    Decode {
        /// Where the bytes came from.
        origin: String,
        /// Underlying decode error.
        source: FromUtf8Error,
    },
    /// Laying out the extended lambdas failed.
    #[error("failed to format {origin}: {source}")]
    Syntax {
        /// Source being formatted.
        origin: String,
        /// Underlying syntax error.
        source: SyntaxError,
    },
    /// Logging could not be configured.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl FmtError {
    pub(crate) fn read(origin: impl Into<String>, source: io::Error) -> Self {
        Self::Read {
            origin: origin.into(),
            source,
        }
    }

    pub(crate) fn write(origin: impl Into<String>, source: io::Error) -> Self {
        Self::Write {
            origin: origin.into(),
            source,
        }
    }

    pub(crate) fn decode(origin: impl Into<String>, source: FromUtf8Error) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }

    pub(crate) fn syntax(origin: impl Into<String>, source: SyntaxError) -> Self {
        Self::Syntax {
            origin: origin.into(),
            source,
        }
    }

    /// Returns whether the error came from the command line.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::StdinWithFileFlags)
    }
}
