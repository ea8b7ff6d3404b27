//! Background download service.
//!
//! A single long-lived task consumes [`ServiceCommand`]s and runs one worker
//! per started download.
//!
//! # Architecture
//!
//! - **Loop**: Receives commands, owns the `JoinSet` of workers
//! - **Worker**: Drives the SDK for one region, reports to the registry
//! - **Bridge tasks**: Throttle SDK status into percentage reports
//!
//! Configuration is captured when the service is spawned.

mod jobs;
mod worker;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use regionkit_core::{
    DownloadId, NotificationContext, NotificationPort, OfflineDownload, OfflineRegistry,
    OfflineResult, RegionDownloaderPort, ServiceCommand, ServiceConfig,
};

use crate::channel::{ChannelCommandSender, CommandInbox};

use jobs::JobTable;
pub use worker::{JobOutcome, WORKER_FAILED_REASON};
use worker::{DownloadJob, WorkerDeps};

/// Everything the service needs, supplied by the composition root.
pub struct ServiceDeps {
    /// Registry the workers report to.
    pub registry: Arc<OfflineRegistry>,
    /// Mapping SDK.
    pub downloader: Arc<dyn RegionDownloaderPort>,
    /// Notification surface.
    pub notifier: Arc<dyn NotificationPort>,
    /// Channel, grouping and throttle settings.
    pub config: ServiceConfig,
}

/// The background service loop.
pub struct OfflineDownloadService {
    deps: WorkerDeps,
    jobs: Arc<JobTable>,
    tasks: JoinSet<(DownloadId, JobOutcome)>,
}

impl OfflineDownloadService {
    /// Validate the configuration and start the service loop on the current
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`regionkit_core::OfflineError::InvalidConfig`] if the
    /// configuration is rejected.
    pub fn spawn(deps: ServiceDeps, inbox: CommandInbox) -> OfflineResult<ServiceHandle> {
        deps.config.validate()?;

        let jobs = Arc::new(JobTable::new());
        let registry = Arc::clone(&deps.registry);
        let service = Self {
            deps: WorkerDeps {
                registry: deps.registry,
                downloader: deps.downloader,
                notifier: deps.notifier,
                context: NotificationContext::from_config(&deps.config),
                progress_interval: deps.config.progress_interval(),
                jobs: Arc::clone(&jobs),
            },
            jobs,
            tasks: JoinSet::new(),
        };

        let shutdown = CancellationToken::new();
        let sender = inbox.downgrade();

        tracing::info!(
            target: "regionkit.service",
            channel = %deps.config.channel_name,
            grouping = deps.config.use_grouping,
            "Offline download service started"
        );
        let task = tokio::spawn(service.run(inbox, shutdown.clone()));

        Ok(ServiceHandle {
            sender,
            registry,
            shutdown,
            task,
        })
    }

    async fn run(mut self, mut inbox: CommandInbox, shutdown: CancellationToken) {
        let mut inbox_open = true;

        loop {
            if !inbox_open && self.tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::info!(
                        target: "regionkit.service",
                        in_flight = self.jobs.len(),
                        "Shutting down"
                    );
                    self.jobs.cancel_all();
                    break;
                }

                command = inbox.recv(), if inbox_open => match command {
                    Some(command) => self.handle(command),
                    None => {
                        tracing::debug!(target: "regionkit.service", "Command channel closed");
                        inbox_open = false;
                    }
                },

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    Self::finished(joined);
                }
            }
        }

        while let Some(joined) = self.tasks.join_next().await {
            Self::finished(joined);
        }
        tracing::info!(target: "regionkit.service", "Offline download service stopped");
    }

    fn handle(&mut self, command: ServiceCommand) {
        match command {
            ServiceCommand::StartDownload { download } => self.start(download),
            ServiceCommand::CancelDownload { download } => self.cancel(download.id),
        }
    }

    fn start(&mut self, download: OfflineDownload) {
        let id = download.id;
        let cancel = CancellationToken::new();

        if !self.jobs.register(id, cancel.clone()) {
            tracing::warn!(target: "regionkit.service", id = %id, "Download already running");
            return;
        }

        tracing::debug!(target: "regionkit.service", id = %id, "Starting worker");
        self.tasks
            .spawn(worker::run_job(DownloadJob { download, cancel }, self.deps.clone()));
    }

    fn cancel(&self, id: DownloadId) {
        if self.jobs.cancel(id) {
            tracing::debug!(target: "regionkit.service", id = %id, "Cancel requested");
        } else {
            tracing::warn!(target: "regionkit.service", id = %id, "Cancel for unknown download");
        }
    }

    fn finished(joined: Result<(DownloadId, JobOutcome), JoinError>) {
        match joined {
            Ok((id, JobOutcome::Completed)) => {
                tracing::info!(target: "regionkit.service", id = %id, "Download completed");
            }
            Ok((id, JobOutcome::Canceled)) => {
                tracing::info!(target: "regionkit.service", id = %id, "Download canceled");
            }
            Ok((id, JobOutcome::Failed(e) | JobOutcome::NotStarted(e))) => {
                tracing::warn!(target: "regionkit.service", id = %id, error = %e, "Download failed");
            }
            Err(e) => {
                tracing::error!(target: "regionkit.service", error = %e, "Download worker panicked");
            }
        }
    }
}

/// Handle to a running service.
pub struct ServiceHandle {
    sender: mpsc::WeakUnboundedSender<ServiceCommand>,
    registry: Arc<OfflineRegistry>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// A command sender, while the registry (or another holder) keeps the
    /// channel open.
    pub fn commands(&self) -> Option<ChannelCommandSender> {
        ChannelCommandSender::upgrade(&self.sender)
    }

    /// The registry the service reports to.
    pub fn registry(&self) -> &Arc<OfflineRegistry> {
        &self.registry
    }

    /// Cancel in-flight downloads and stop the loop.
    ///
    /// Canceled downloads still report their cancellation before the loop
    /// finishes.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit.
    ///
    /// The loop runs until [`shutdown`](Self::shutdown) is called, or until
    /// every command sender is dropped and the last worker finished.
    ///
    /// # Errors
    ///
    /// Returns the join error if the loop panicked.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}
