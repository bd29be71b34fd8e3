//! Process-wide `tracing` setup for `lxfmt`.
//!
//! Logs always go to stderr because stdout carries formatted code or diffs.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use crate::config::Config;
use crate::logging::LogFormat;

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that a global subscriber is in place, carrying the format it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by whichever call installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Reasons the subscriber could not be installed.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `--log-filter` is not a valid `EnvFilter` directive.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Something else already owns the global default.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the stderr subscriber described by `config`, once per process.
///
/// The first successful call decides the filter and format; later calls are
/// no-ops that report what is already installed.
///
/// # Errors
///
/// See [`TelemetryError`].
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install_subscriber(config).map(|()| config.log_format()))
        .map(|format| TelemetryHandle { format: *format })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);

    let installed = match config.log_format() {
        LogFormat::Json => tracing::subscriber::set_global_default(
            base.json().flatten_event(true).finish(),
        ),
        LogFormat::Compact => tracing::subscriber::set_global_default(base.compact().finish()),
    };
    installed.map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_filter() {
        let config = Config::default().with_log_filter("lambdex=loud");
        let err = install_subscriber(&config).expect_err("filter must not parse");
        assert!(matches!(err, TelemetryError::Filter(_)));
    }
}
