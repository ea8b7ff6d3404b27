//! Download worker pipeline.
//!
//! One worker runs per started download. It owns the SDK conversation for
//! its region and reports every state change to the registry; the registry
//! turns those reports into observer events.
//!
//! - The SDK writes status snapshots to a `watch::Sender` only
//! - A bridge task turns snapshots into throttled percentage reports
//! - Cancellation is handled via `tokio::select!` around the SDK download

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use regionkit_core::{
    DownloadId, NotificationContext, NotificationPort, OfflineDownload, OfflineRegistry,
    RegionDownloaderPort, RegionHandle, RegionStatus, SdkError,
};

use super::jobs::JobTable;
use crate::progress::ProgressThrottle;

/// Dependencies for the download worker.
///
/// Cloned Arc references, so workers run independently of the service loop.
#[derive(Clone)]
pub struct WorkerDeps {
    pub registry: Arc<OfflineRegistry>,
    pub downloader: Arc<dyn RegionDownloaderPort>,
    pub notifier: Arc<dyn NotificationPort>,
    pub context: NotificationContext,
    pub progress_interval: Duration,
    pub jobs: Arc<JobTable>,
}

/// A download job: the requested record plus its cancellation token.
pub struct DownloadJob {
    pub download: OfflineDownload,
    pub cancel: CancellationToken,
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every resource was downloaded.
    Completed,
    /// Canceled; the region was deleted.
    Canceled,
    /// The SDK failed mid-download.
    Failed(SdkError),
    /// The record never became active.
    NotStarted(SdkError),
}

/// Reason reported when a worker stops without finishing its download.
pub const WORKER_FAILED_REASON: &str = "Internal";

/// Run a download job to completion.
///
/// Returns the id the download ended under (the region id once the region
/// exists) and how it ended.
pub async fn run_job(job: DownloadJob, deps: WorkerDeps) -> (DownloadId, JobOutcome) {
    let DownloadJob { download, cancel } = job;
    let requested = download.id;
    let mut guard = WorkerGuard::new(&deps, &download);

    let region = match deps
        .downloader
        .create_region(&download.definition, &download.metadata)
        .await
    {
        Ok(region) => region,
        Err(e) => {
            deps.registry
                .report_start_failure(&download, &e.reason, &e.message);
            deps.notifier.report_failure(&download, &e.message);
            guard.finish();
            return (requested, JobOutcome::NotStarted(e));
        }
    };

    let id = region.id();
    let download = download.with_id(id);
    let key = if deps.jobs.rekey(requested, id) {
        id
    } else {
        tracing::warn!(
            target: "regionkit.service",
            requested = %requested,
            region = %id,
            "Could not re-key job to region id"
        );
        requested
    };
    guard.rekey(&download, key);

    if let Err(e) = deps.registry.add_download(download.clone()) {
        let failure = SdkError::new("AlreadyActive", e.to_string());
        delete_region(&deps, &region).await;
        deps.registry
            .report_start_failure(&download, &failure.reason, &failure.message);
        deps.notifier.report_failure(&download, &failure.message);
        guard.finish();
        return (id, JobOutcome::NotStarted(failure));
    }
    guard.activate();

    deps.notifier.show(&download, &deps.context);
    tracing::info!(
        target: "regionkit.service",
        id = %id,
        region = %download.region_name,
        "Download started"
    );

    let (status_tx, status_rx) = watch::channel(RegionStatus::default());
    let bridge = spawn_progress_bridge(id, status_rx, cancel.clone(), &deps);

    let result = tokio::select! {
        biased;

        () = cancel.cancelled() => Err(SdkError::cancelled()),

        result = deps.downloader.download(&region, status_tx, cancel.clone()) => result,
    };

    // Sender is gone now; the bridge flushes the final percentage and exits.
    if let Err(e) = bridge.await {
        tracing::error!(target: "regionkit.service", id = %id, error = %e, "Progress bridge failed");
    }

    let outcome = match result {
        Ok(()) => {
            report(deps.registry.remove_download(id, false).map(drop), id);
            JobOutcome::Completed
        }
        Err(e) if e.is_cancelled() => {
            delete_region(&deps, &region).await;
            report(deps.registry.remove_download(id, true).map(drop), id);
            JobOutcome::Canceled
        }
        Err(e) => {
            report(
                deps.registry
                    .error_download(id, &e.reason, &e.message)
                    .map(drop),
                id,
            );
            JobOutcome::Failed(e)
        }
    };

    deps.notifier.dismiss(id);
    guard.finish();
    (id, outcome)
}

/// Cleans up after a worker that stops before reaching a terminal report.
///
/// Dropped without [`finish`](Self::finish) (an SDK panic or an aborted
/// task), it reports the record as failed. The job entry is released either
/// way.
struct WorkerGuard {
    registry: Arc<OfflineRegistry>,
    notifier: Arc<dyn NotificationPort>,
    jobs: Arc<JobTable>,
    download: OfflineDownload,
    key: DownloadId,
    active: bool,
    finished: bool,
}

impl WorkerGuard {
    fn new(deps: &WorkerDeps, download: &OfflineDownload) -> Self {
        Self {
            registry: Arc::clone(&deps.registry),
            notifier: Arc::clone(&deps.notifier),
            jobs: Arc::clone(&deps.jobs),
            download: download.clone(),
            key: download.id,
            active: false,
            finished: false,
        }
    }

    fn rekey(&mut self, download: &OfflineDownload, key: DownloadId) {
        self.download = download.clone();
        self.key = key;
    }

    const fn activate(&mut self) {
        self.active = true;
    }

    const fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if !self.finished {
            let id = self.download.id;
            let message = "Download worker stopped unexpectedly";
            tracing::error!(
                target: "regionkit.service",
                id = %id,
                active = self.active,
                "{message}"
            );

            if self.active {
                report(
                    self.registry
                        .error_download(id, WORKER_FAILED_REASON, message)
                        .map(drop),
                    id,
                );
                self.notifier.dismiss(id);
            } else {
                self.registry
                    .report_start_failure(&self.download, WORKER_FAILED_REASON, message);
                self.notifier.report_failure(&self.download, message);
            }
        }
        self.jobs.remove(self.key);
    }
}

async fn delete_region(deps: &WorkerDeps, region: &RegionHandle) {
    if let Err(e) = deps.downloader.delete_region(region).await {
        tracing::warn!(
            target: "regionkit.service",
            id = %region.id(),
            error = %e,
            "Failed to delete region"
        );
    }
}

fn report(result: regionkit_core::OfflineResult<()>, id: DownloadId) {
    if let Err(e) = result {
        tracing::debug!(target: "regionkit.service", id = %id, error = %e, "Report ignored");
    }
}

/// Spawn the task that turns SDK status snapshots into progress reports.
///
/// Exits on cancellation without a final report, so the cancel event is the
/// last thing observers hear.
fn spawn_progress_bridge(
    id: DownloadId,
    mut rx: watch::Receiver<RegionStatus>,
    cancel: CancellationToken,
    deps: &WorkerDeps,
) -> JoinHandle<()> {
    let registry = Arc::clone(&deps.registry);
    let notifier = Arc::clone(&deps.notifier);
    let interval = deps.progress_interval;

    tokio::spawn(async move {
        let mut throttle = ProgressThrottle::new(interval);
        let emit = |percent: u32| {
            report(registry.on_progress_changed(id, percent), id);
            notifier.update_progress(id, percent);
        };

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                changed = rx.changed() => {
                    let percent = rx.borrow_and_update().percentage();
                    if changed.is_err() {
                        // Sender dropped (download finished): flush the last value
                        if throttle.force(percent) {
                            emit(percent);
                        }
                        break;
                    }
                    if throttle.should_report(percent) {
                        emit(percent);
                    }
                }
            }
        }
    })
}
