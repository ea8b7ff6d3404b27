//! Notification port.
//!
//! Abstracts the host's notification surface so the background service can
//! present downloads without knowing how the platform shows them.

use crate::config::ServiceConfig;
use crate::domain::{DownloadId, OfflineDownload};

/// Presentation context derived from the service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    /// Display name of the notification channel.
    pub channel_name: String,
    /// Group key when downloads share one summary.
    pub group_key: Option<String>,
}

impl NotificationContext {
    /// Derive the context from a service configuration.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            channel_name: config.channel_name.clone(),
            group_key: config.group_key().map(str::to_string),
        }
    }
}

/// Port for presenting downloads to the user.
pub trait NotificationPort: Send + Sync {
    /// Show the notification for a newly active download.
    fn show(&self, download: &OfflineDownload, context: &NotificationContext);

    /// Update the progress shown for a download.
    fn update_progress(&self, id: DownloadId, progress: u32);

    /// Remove the notification for a download.
    fn dismiss(&self, id: DownloadId);

    /// Tell the user a download could not be performed.
    fn report_failure(&self, download: &OfflineDownload, message: &str);
}

/// A notifier that shows nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    /// Create a new no-op notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationPort for NoopNotifier {
    fn show(&self, _download: &OfflineDownload, _context: &NotificationContext) {}

    fn update_progress(&self, _id: DownloadId, _progress: u32) {}

    fn dismiss(&self, _id: DownloadId) {}

    fn report_failure(&self, _download: &OfflineDownload, _message: &str) {}
}
