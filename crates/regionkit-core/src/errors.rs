//! Error types for the registry and its ports.

use thiserror::Error;

use crate::domain::DownloadId;

/// Error type for registry and command-channel operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OfflineError {
    /// A download with this id is already in the active list.
    #[error("Download {id} is already active")]
    AlreadyActive {
        /// The conflicting id.
        id: DownloadId,
    },

    /// No active download has this id.
    #[error("Download {id} is not active")]
    NotActive {
        /// The unknown id.
        id: DownloadId,
    },

    /// The background service is no longer receiving commands.
    #[error("Command channel closed")]
    ChannelClosed,

    /// A command could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Detailed error message.
        message: String,
    },

    /// Service configuration is out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with it.
        message: String,
    },
}

impl OfflineError {
    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if this error refers to an unknown download.
    #[must_use]
    pub const fn is_not_active(&self) -> bool {
        matches!(self, Self::NotActive { .. })
    }
}

impl From<serde_json::Error> for OfflineError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Convenience result type for registry operations.
pub type OfflineResult<T> = Result<T, OfflineError>;
