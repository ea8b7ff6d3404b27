//! Observer port for download lifecycle events.
//!
//! UI layers implement [`OfflineDownloadObserver`] and register it with the
//! registry. Every callback has an empty default so observers only
//! implement the transitions they care about.

use tokio::sync::mpsc;

use crate::domain::OfflineDownload;
use crate::events::OfflineDownloadEvent;

/// Callback surface for offline download state changes.
///
/// Callbacks run synchronously on whichever thread reported the change
/// (usually a background service worker). They must not block.
pub trait OfflineDownloadObserver: Send + Sync {
    /// The service created the region and the download is now active.
    fn on_create(&self, _download: &OfflineDownload) {}

    /// The download reached a new percentage.
    fn on_progress(&self, _download: &OfflineDownload, _progress: u32) {}

    /// The download finished.
    fn on_success(&self, _download: &OfflineDownload) {}

    /// The download was canceled.
    fn on_cancel(&self, _download: &OfflineDownload) {}

    /// The download failed.
    fn on_error(&self, _download: &OfflineDownload, _error: &str, _message: &str) {}
}

/// Observer that forwards every callback as an [`OfflineDownloadEvent`]
/// into an unbounded channel.
///
/// Lets async code `await` lifecycle events instead of implementing the
/// callback trait. Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<OfflineDownloadEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OfflineDownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: OfflineDownloadEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(target: "regionkit.observer", "Event receiver dropped");
        }
    }
}

impl OfflineDownloadObserver for ChannelObserver {
    fn on_create(&self, download: &OfflineDownload) {
        self.forward(OfflineDownloadEvent::created(download));
    }

    fn on_progress(&self, download: &OfflineDownload, progress: u32) {
        self.forward(OfflineDownloadEvent::progress(download, progress));
    }

    fn on_success(&self, download: &OfflineDownload) {
        self.forward(OfflineDownloadEvent::succeeded(download));
    }

    fn on_cancel(&self, download: &OfflineDownload) {
        self.forward(OfflineDownloadEvent::canceled(download));
    }

    fn on_error(&self, download: &OfflineDownload, error: &str, message: &str) {
        self.forward(OfflineDownloadEvent::failed(download, error, message));
    }
}
