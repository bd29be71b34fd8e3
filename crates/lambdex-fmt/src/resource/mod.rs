//! Sources read from files or stdin, and the sinks their output goes to.

use std::fmt;
use std::fs;
use std::io::{BufRead, Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use similar::TextDiff;
use tracing::debug;

use crate::config::OutputMode;
use crate::errors::FmtError;

const RESOURCE_TARGET: &str = "lambdex_fmt::resource";

/// Where a source was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A file on disk.
    File(Utf8PathBuf),
    /// Standard input.
    Stdin,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => fmt::Display::fmt(path, f),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// One source being formatted.
///
/// The resource owns the original text and whatever the backend produced for
/// it. How formatted code is written depends on the [`OutputMode`].
#[derive(Debug)]
pub struct Resource {
    origin: Origin,
    name: String,
    mode: OutputMode,
    source: String,
    backend_output: Vec<u8>,
}

impl Resource {
    /// Reads a source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not UTF-8.
    pub fn from_file(path: &Utf8Path, mode: OutputMode) -> Result<Self, FmtError> {
        let bytes = fs::read(path).map_err(|source| FmtError::read(path.as_str(), source))?;
        Self::from_bytes(Origin::File(path.to_owned()), mode, bytes)
    }

    /// Reads a source from stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the input is not UTF-8.
    pub fn from_stdin(mut reader: impl Read, mode: OutputMode) -> Result<Self, FmtError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| FmtError::read(Origin::Stdin.to_string(), source))?;
        Self::from_bytes(Origin::Stdin, mode, bytes)
    }

    fn from_bytes(origin: Origin, mode: OutputMode, bytes: Vec<u8>) -> Result<Self, FmtError> {
        let name = origin.to_string();
        let source = String::from_utf8(bytes).map_err(|error| FmtError::decode(&name, error))?;
        debug!(
            target: RESOURCE_TARGET,
            origin = name.as_str(),
            bytes = source.len(),
            "read source"
        );
        Ok(Self {
            origin,
            name,
            mode,
            source,
            backend_output: Vec::new(),
        })
    }

    /// Returns where the source came from.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Returns the display name of the origin.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the original text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Stores what the backend produced for this source.
    pub fn set_backend_output(&mut self, output: Vec<u8>) {
        self.backend_output = output;
    }

    /// Returns a line reader over the stored backend output.
    #[must_use]
    pub fn backend_output_stream(&self) -> impl BufRead + '_ {
        self.backend_output.as_slice()
    }

    /// Returns whether `code` differs from the original text.
    #[must_use]
    pub fn is_changed(&self, code: &str) -> bool {
        code != self.source
    }

    /// Writes formatted code according to the output mode.
    ///
    /// Prints go to `out` in full; diffs go to `out` only when the code
    /// changed; in-place mode rewrites the file only when it changed, and
    /// quiet mode writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` or the file cannot be written.
    pub fn write_formatted_code(&self, code: &str, out: &mut dyn Write) -> Result<(), FmtError> {
        match (self.mode, &self.origin) {
            (OutputMode::Quiet, _) => Ok(()),
            (OutputMode::Diff, _) => {
                if !self.is_changed(code) {
                    return Ok(());
                }
                let diff = self.unified_diff(code);
                out.write_all(diff.as_bytes())
                    .map_err(|source| FmtError::write("stdout", source))
            }
            (OutputMode::InPlace, Origin::File(path)) => {
                if !self.is_changed(code) {
                    return Ok(());
                }
                debug!(target: RESOURCE_TARGET, path = path.as_str(), "rewriting file");
                fs::write(path, code).map_err(|source| FmtError::write(path.as_str(), source))
            }
            (OutputMode::Print | OutputMode::InPlace, _) => out
                .write_all(code.as_bytes())
                .map_err(|source| FmtError::write("stdout", source)),
        }
    }

    fn unified_diff(&self, code: &str) -> String {
        let diff = TextDiff::from_lines(self.source.as_str(), code);
        diff.unified_diff()
            .context_radius(3)
            .header(
                &format!("{} (original)", self.name),
                &format!("{} (reformatted)", self.name),
            )
            .to_string()
    }
}

#[cfg(test)]
mod tests;
