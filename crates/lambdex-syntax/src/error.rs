//! Failures raised while parsing, locating, or laying out extended lambdas.

use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::DispatchError;

/// Everything that can go wrong inside `lambdex-syntax`.
///
/// Extraction reports [`SyntaxError::NotFound`] and
/// [`SyntaxError::Ambiguous`]; the layout pass reports
/// [`SyntaxError::Rewrite`] when its own output does not parse back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// The Python grammar could not be loaded into tree-sitter.
    #[error("failed to initialise Python parser: {message}")]
    ParserInit {
        /// Reason given by tree-sitter.
        message: String,
    },

    /// Tree-sitter gave up without producing a tree.
    #[error("failed to parse source: {message}")]
    Parse {
        /// What went wrong.
        message: String,
    },

    /// A call-site pattern was rejected.
    #[error("invalid pattern '{pattern}': {message}")]
    PatternCompile {
        /// Pattern text as written by the caller.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// No keyword call on the requested line.
    #[error("cannot parse lambda for unknown reason")]
    NotFound,

    /// Several keyword calls on the requested line and no name to pick one.
    #[error("ambiguous identifier '{identifier}'")]
    Ambiguous {
        /// Name that matched more than one call.
        identifier: String,
    },

    /// The keyword dispatch table was malformed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Laid-out code was rejected.
    #[error("rewrite failed: {message}")]
    Rewrite {
        /// What the verification pass found.
        message: String,
    },

    /// A source file named by a [`SourceLocation`](crate::SourceLocation)
    /// could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Error returned by the filesystem.
        #[source]
        source: std::io::Error,
    },
}

impl SyntaxError {
    /// Builds [`SyntaxError::ParserInit`].
    #[must_use]
    pub fn parser_init(message: impl Into<String>) -> Self {
        Self::ParserInit {
            message: message.into(),
        }
    }

    /// Builds [`SyntaxError::Parse`].
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Builds [`SyntaxError::PatternCompile`].
    #[must_use]
    pub fn pattern_compile(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PatternCompile {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Builds [`SyntaxError::Ambiguous`].
    #[must_use]
    pub fn ambiguous(identifier: impl Into<String>) -> Self {
        Self::Ambiguous {
            identifier: identifier.into(),
        }
    }

    /// Builds [`SyntaxError::Rewrite`].
    #[must_use]
    pub fn rewrite(message: impl Into<String>) -> Self {
        Self::Rewrite {
            message: message.into(),
        }
    }

    /// Builds [`SyntaxError::Io`] for `path`.
    #[must_use]
    pub const fn io(path: PathBuf, source: std::io::Error) -> Self {
        Self::Io { path, source }
    }
}
