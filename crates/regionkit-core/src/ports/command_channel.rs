//! Command channel port.
//!
//! The registry never downloads anything itself. It hands start and cancel
//! requests to the background service through this port and waits for the
//! service to report back.

use serde::{Deserialize, Serialize};

use crate::domain::OfflineDownload;
use crate::errors::OfflineError;

/// A command for the background download service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServiceCommand {
    /// Create the region and start downloading it.
    StartDownload {
        /// The requested download.
        download: OfflineDownload,
    },

    /// Stop an ongoing download.
    CancelDownload {
        /// The download to cancel; matched by id.
        download: OfflineDownload,
    },
}

impl ServiceCommand {
    /// The record carried by the command.
    #[must_use]
    pub const fn download(&self) -> &OfflineDownload {
        match self {
            Self::StartDownload { download } | Self::CancelDownload { download } => download,
        }
    }

    /// Action name for logs and wire protocols.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::StartDownload { .. } => "start_download",
            Self::CancelDownload { .. } => "cancel_download",
        }
    }

    /// Encode as JSON for out-of-process transports.
    pub fn to_json(&self) -> Result<String, OfflineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, OfflineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Port for sending commands to the background service.
///
/// Implementations must not block: sending only enqueues the command.
#[cfg_attr(test, mockall::automock)]
pub trait CommandChannelPort: Send + Sync {
    /// Enqueue a command for the service.
    fn send(&self, command: ServiceCommand) -> Result<(), OfflineError>;
}

/// A command channel that drops every command.
///
/// Useful for tests and for tools that only observe downloads.
#[derive(Debug, Clone, Default)]
pub struct NoopCommandChannel;

impl NoopCommandChannel {
    /// Create a new no-op channel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandChannelPort for NoopCommandChannel {
    fn send(&self, _command: ServiceCommand) -> Result<(), OfflineError> {
        // Intentionally do nothing
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DownloadId, LatLngBounds, NotificationOptions, RegionDefinition};

    fn record() -> OfflineDownload {
        OfflineDownload::new(
            RegionDefinition::new("style", LatLngBounds::world(), 0.0, 2.0, 1.0),
            NotificationOptions::default(),
            "World",
        )
        .with_id(DownloadId::new(11))
        .with_metadata(vec![0xde, 0xad])
    }

    #[test]
    fn test_json_roundtrip_preserves_record() {
        let command = ServiceCommand::CancelDownload { download: record() };
        let json = command.to_json().unwrap();
        assert!(json.contains(r#""action":"cancel_download""#));

        let decoded = ServiceCommand::from_json(&json).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_from_json_rejects_unknown_action() {
        let err = ServiceCommand::from_json(r#"{"action":"pause_download"}"#).unwrap_err();
        assert!(matches!(err, OfflineError::Serialization { .. }));
    }

    #[test]
    fn test_noop_channel_accepts_commands() {
        let channel = NoopCommandChannel::new();
        assert!(
            channel
                .send(ServiceCommand::StartDownload { download: record() })
                .is_ok()
        );
    }
}
