//! Registry of active offline downloads.
//!
//! [`OfflineRegistry`] is the application's entry point for offline
//! regions. Callers ask it to start or cancel downloads; the background
//! service reports back into it; observers hear about every transition.
//!
//! # Ownership
//!
//! The registry owns the only mutable copy of each active record. Service
//! reports address records by [`DownloadId`] and the registry applies them
//! to its own copy, so a report can never replace the stored record with a
//! stale one.
//!
//! # Lifecycle
//!
//! ```text
//! absent ──add_download──▶ active ──remove_download / error_download──▶ closing ──▶ removed
//!                           │  ▲
//!                           └──┘ on_progress_changed
//! ```
//!
//! A record is in the active list only after the service confirmed the
//! region exists. `start_download` and `cancel_download` merely enqueue
//! commands.
//!
//! A terminal report claims its record under the write lock before any
//! observer runs. A claimed record is still listed as active while its
//! terminal event is dispatched, but further reports for it fail with
//! [`OfflineError::NotActive`], so each record ends with exactly one
//! terminal event.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::dispatcher::OfflineDownloadChangeDispatcher;
use crate::domain::{DownloadId, OfflineDownload, RegionHandle};
use crate::errors::{OfflineError, OfflineResult};
use crate::ports::{CommandChannelPort, OfflineDownloadObserver, ServiceCommand};

/// A tracked record and whether a terminal report has claimed it.
#[derive(Debug)]
struct ActiveEntry {
    download: OfflineDownload,
    closing: bool,
}

/// Tracks active offline downloads and fans out their state changes.
///
/// Constructed once by the composition root and shared as
/// `Arc<OfflineRegistry>`.
pub struct OfflineRegistry {
    commands: Arc<dyn CommandChannelPort>,
    dispatcher: OfflineDownloadChangeDispatcher,
    /// Active downloads in insertion order.
    downloads: RwLock<Vec<ActiveEntry>>,
}

impl OfflineRegistry {
    /// Create a registry that sends commands through `commands`.
    pub fn new(commands: Arc<dyn CommandChannelPort>) -> Self {
        Self {
            commands,
            dispatcher: OfflineDownloadChangeDispatcher::new(),
            downloads: RwLock::new(Vec::new()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Public API
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the active downloads, in insertion order.
    pub fn active_downloads(&self) -> Vec<OfflineDownload> {
        self.read().iter().map(|e| e.download.clone()).collect()
    }

    /// Number of active downloads.
    pub fn active_count(&self) -> usize {
        self.read().len()
    }

    /// Whether a download with this id is active.
    pub fn is_active(&self, id: DownloadId) -> bool {
        self.read().iter().any(|e| e.download.id == id)
    }

    /// Ask the background service to start a download.
    ///
    /// The record becomes active only once the service reports the region
    /// as created.
    pub fn start_download(&self, download: OfflineDownload) -> OfflineResult<()> {
        tracing::info!(
            target: "regionkit.registry",
            id = %download.id,
            region = %download.region_name,
            "Requesting download start"
        );
        self.commands.send(ServiceCommand::StartDownload { download })
    }

    /// Ask the background service to cancel a download.
    ///
    /// The record stays active until the service reports the cancellation.
    pub fn cancel_download(&self, download: OfflineDownload) -> OfflineResult<()> {
        tracing::info!(
            target: "regionkit.registry",
            id = %download.id,
            "Requesting download cancel"
        );
        self.commands.send(ServiceCommand::CancelDownload { download })
    }

    /// The active download for an SDK region, if any.
    ///
    /// Ids are unique in the active list, so at most one record matches.
    pub fn active_download_for_region(&self, region: &RegionHandle) -> Option<OfflineDownload> {
        self.read()
            .iter()
            .find(|e| e.download.matches_region(region))
            .map(|e| e.download.clone())
    }

    /// Register an observer for download state changes.
    ///
    /// Returns `false` if the observer was already registered.
    pub fn add_offline_download_state_change_listener(
        &self,
        observer: Arc<dyn OfflineDownloadObserver>,
    ) -> bool {
        self.dispatcher.add_listener(observer)
    }

    /// Remove an observer.
    ///
    /// Returns `false` if the observer was not registered.
    pub fn remove_offline_download_state_change_listener(
        &self,
        observer: &Arc<dyn OfflineDownloadObserver>,
    ) -> bool {
        self.dispatcher.remove_listener(observer)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Service reports
    // ─────────────────────────────────────────────────────────────────────────

    /// The service created the region for `download`; start tracking it.
    ///
    /// Fails with [`OfflineError::AlreadyActive`] if the id is already
    /// tracked; nothing is dispatched in that case.
    pub fn add_download(&self, download: OfflineDownload) -> OfflineResult<()> {
        {
            let mut downloads = self.write();
            if downloads.iter().any(|e| e.download.id == download.id) {
                tracing::warn!(
                    target: "regionkit.registry",
                    id = %download.id,
                    "Rejecting duplicate active download"
                );
                return Err(OfflineError::AlreadyActive { id: download.id });
            }
            downloads.push(ActiveEntry {
                download: download.clone(),
                closing: false,
            });
        }

        tracing::debug!(target: "regionkit.registry", id = %download.id, "Download active");
        self.dispatcher.notify_create(&download);
        Ok(())
    }

    /// The service finished or canceled a download; stop tracking it.
    ///
    /// Observers hear about it before the record leaves the active list.
    /// Returns the evicted record.
    pub fn remove_download(
        &self,
        id: DownloadId,
        canceled: bool,
    ) -> OfflineResult<OfflineDownload> {
        let download = self.claim(id)?;

        if canceled {
            self.dispatcher.notify_cancel(&download);
        } else {
            self.dispatcher.notify_success(&download);
        }

        tracing::debug!(target: "regionkit.registry", id = %id, canceled, "Download removed");
        Ok(self.evict(id).unwrap_or(download))
    }

    /// The service hit an error; notify observers and stop tracking.
    ///
    /// Returns the evicted record.
    pub fn error_download(
        &self,
        id: DownloadId,
        error: &str,
        message: &str,
    ) -> OfflineResult<OfflineDownload> {
        let download = self.claim(id)?;

        tracing::warn!(
            target: "regionkit.registry",
            id = %id,
            error,
            message,
            "Download failed"
        );
        self.dispatcher.notify_error(&download, error, message);

        Ok(self.evict(id).unwrap_or(download))
    }

    /// The service made progress; update the stored record and notify.
    pub fn on_progress_changed(&self, id: DownloadId, progress: u32) -> OfflineResult<()> {
        let download = {
            let mut downloads = self.write();
            let Some(entry) = downloads.iter_mut().find(|e| e.download.id == id && !e.closing)
            else {
                return Err(Self::not_active(id));
            };
            entry.download.progress = progress;
            entry.download.clone()
        };

        tracing::trace!(target: "regionkit.registry", id = %id, progress, "Progress");
        self.dispatcher.notify_progress(&download, progress);
        Ok(())
    }

    /// A download failed before its region existed.
    ///
    /// The record never became active, so only observers are told.
    pub fn report_start_failure(&self, download: &OfflineDownload, error: &str, message: &str) {
        tracing::warn!(
            target: "regionkit.registry",
            id = %download.id,
            error,
            message,
            "Download failed before becoming active"
        );
        self.dispatcher.notify_error(download, error, message);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Mark the record as closing and return a copy of it.
    ///
    /// Only the first terminal report for an id succeeds.
    fn claim(&self, id: DownloadId) -> OfflineResult<OfflineDownload> {
        let mut downloads = self.write();
        let Some(entry) = downloads.iter_mut().find(|e| e.download.id == id && !e.closing) else {
            return Err(Self::not_active(id));
        };
        entry.closing = true;
        Ok(entry.download.clone())
    }

    fn evict(&self, id: DownloadId) -> Option<OfflineDownload> {
        let mut downloads = self.write();
        let index = downloads.iter().position(|e| e.download.id == id)?;
        Some(downloads.remove(index).download)
    }

    fn not_active(id: DownloadId) -> OfflineError {
        tracing::debug!(target: "regionkit.registry", id = %id, "Report for inactive download");
        OfflineError::NotActive { id }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ActiveEntry>> {
        self.downloads.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ActiveEntry>> {
        self.downloads.write().unwrap_or_else(PoisonError::into_inner)
    }
}
