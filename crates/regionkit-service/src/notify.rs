//! Notification adapter that writes to the log.
//!
//! Hosts without a notification surface (CLI, headless services) use this
//! so download presentation still shows up somewhere.

use regionkit_core::{DownloadId, NotificationContext, NotificationPort, OfflineDownload};

/// Notifier that logs every presentation change through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Create a new tracing notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationPort for TracingNotifier {
    fn show(&self, download: &OfflineDownload, context: &NotificationContext) {
        let options = &download.notification_options;
        tracing::info!(
            target: "regionkit.notify",
            id = %download.id,
            channel = %context.channel_name,
            group = context.group_key.as_deref().unwrap_or("-"),
            title = %options.content_title,
            "{}",
            options.body_for(&download.region_name)
        );
    }

    fn update_progress(&self, id: DownloadId, progress: u32) {
        tracing::debug!(target: "regionkit.notify", id = %id, progress, "Progress");
    }

    fn dismiss(&self, id: DownloadId) {
        tracing::debug!(target: "regionkit.notify", id = %id, "Dismissed");
    }

    fn report_failure(&self, download: &OfflineDownload, message: &str) {
        tracing::warn!(
            target: "regionkit.notify",
            id = %download.id,
            region = %download.region_name,
            "Download could not start: {message}"
        );
    }
}
