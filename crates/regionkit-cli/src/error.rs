//! CLI-specific error types and mappings.
//!
//! Maps registry and download failures to exit codes and user-facing
//! messages.

use regionkit_core::OfflineError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (terminal, signal handler).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background service stopped accepting commands.
    #[error("Service error: {0}")]
    Service(String),

    /// The mapping SDK reported an error.
    #[error("Download failed ({reason}): {message}")]
    Download {
        /// SDK error code.
        reason: String,
        /// SDK error description.
        message: String,
    },

    /// The user canceled the download.
    #[error("Download canceled")]
    Canceled,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    /// - 130: Interrupted (Ctrl-C)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Download { .. } => 1,
            Self::Arguments(_) => 2,
            Self::Service(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,      // EX_IOERR
            Self::Config(_) => 78,  // EX_CONFIG
            Self::Canceled => 130,
        }
    }
}

impl From<OfflineError> for CliError {
    fn from(err: OfflineError) -> Self {
        match err {
            OfflineError::InvalidConfig { message } => Self::Config(message),
            other => Self::Service(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
