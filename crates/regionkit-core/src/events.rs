//! Offline download events - discriminated union for all lifecycle changes.

use serde::{Deserialize, Serialize};

use crate::domain::{DownloadId, OfflineDownload};

/// Single discriminated union for all offline download events.
///
/// Serialized with a `type` tag so transports can forward it as-is:
///
/// ```text
/// { "type": "created",  "download": { ... } }
/// { "type": "progress", "download": { ... }, "progress": 42 }
/// { "type": "success",  "download": { ... } }
/// { "type": "canceled", "download": { ... } }
/// { "type": "error",    "download": { ... }, "error": "...", "message": "..." }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OfflineDownloadEvent {
    /// The region was created and the download is active.
    Created {
        /// Snapshot of the record.
        download: OfflineDownload,
    },

    /// The download reached a new percentage.
    Progress {
        /// Snapshot of the record.
        download: OfflineDownload,
        /// Completed percentage (0-100).
        progress: u32,
    },

    /// The download finished.
    Success {
        /// Snapshot of the record.
        download: OfflineDownload,
    },

    /// The download was canceled.
    Canceled {
        /// Snapshot of the record.
        download: OfflineDownload,
    },

    /// The download failed.
    Error {
        /// Snapshot of the record.
        download: OfflineDownload,
        /// Short error code from the SDK.
        error: String,
        /// Human-readable error message.
        message: String,
    },
}

impl OfflineDownloadEvent {
    /// Create a created event.
    #[must_use]
    pub fn created(download: &OfflineDownload) -> Self {
        Self::Created {
            download: download.clone(),
        }
    }

    /// Create a progress event.
    #[must_use]
    pub fn progress(download: &OfflineDownload, progress: u32) -> Self {
        Self::Progress {
            download: download.clone(),
            progress,
        }
    }

    /// Create a success event.
    #[must_use]
    pub fn succeeded(download: &OfflineDownload) -> Self {
        Self::Success {
            download: download.clone(),
        }
    }

    /// Create a canceled event.
    #[must_use]
    pub fn canceled(download: &OfflineDownload) -> Self {
        Self::Canceled {
            download: download.clone(),
        }
    }

    /// Create an error event.
    pub fn failed(
        download: &OfflineDownload,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Error {
            download: download.clone(),
            error: error.into(),
            message: message.into(),
        }
    }

    /// The record the event refers to.
    #[must_use]
    pub const fn download(&self) -> &OfflineDownload {
        match self {
            Self::Created { download }
            | Self::Progress { download, .. }
            | Self::Success { download }
            | Self::Canceled { download }
            | Self::Error { download, .. } => download,
        }
    }

    /// The id of the record the event refers to.
    #[must_use]
    pub const fn id(&self) -> DownloadId {
        self.download().id
    }

    /// Whether the event ends the download's lifecycle.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success { .. } | Self::Canceled { .. } | Self::Error { .. }
        )
    }

    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "offline:created",
            Self::Progress { .. } => "offline:progress",
            Self::Success { .. } => "offline:success",
            Self::Canceled { .. } => "offline:canceled",
            Self::Error { .. } => "offline:error",
        }
    }
}
