//! End-to-end flow: registry → command channel → service → simulated SDK →
//! registry → observers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use regionkit_core::{
    ChannelObserver, LatLngBounds, NoopCommandChannel, NoopNotifier, NotificationOptions,
    OfflineDownload, OfflineDownloadEvent, OfflineError, OfflineRegistry, RegionDefinition,
    RegionDownloaderPort, RegionHandle, RegionStatus, SdkError, ServiceConfig,
};
use regionkit_service::{
    OfflineDownloadService, ServiceDeps, ServiceHandle, SimulatedRegionDownloader,
    SimulationConfig, WORKER_FAILED_REASON, command_channel,
};

const WAIT: Duration = Duration::from_secs(10);

struct Harness {
    registry: Arc<OfflineRegistry>,
    sdk: Arc<SimulatedRegionDownloader>,
    events: UnboundedReceiver<OfflineDownloadEvent>,
    handle: ServiceHandle,
}

fn harness(simulation: SimulationConfig) -> Harness {
    let sdk = Arc::new(SimulatedRegionDownloader::new(simulation));
    harness_with(Arc::clone(&sdk) as Arc<dyn RegionDownloaderPort>, sdk)
}

fn harness_with(
    downloader: Arc<dyn RegionDownloaderPort>,
    sdk: Arc<SimulatedRegionDownloader>,
) -> Harness {
    let (sender, inbox) = command_channel();
    let registry = Arc::new(OfflineRegistry::new(Arc::new(sender)));

    let (observer, events) = ChannelObserver::new();
    registry.add_offline_download_state_change_listener(Arc::new(observer));

    let handle = OfflineDownloadService::spawn(
        ServiceDeps {
            registry: Arc::clone(&registry),
            downloader,
            notifier: Arc::new(NoopNotifier::new()),
            config: ServiceConfig::default().with_progress_interval_ms(0),
        },
        inbox,
    )
    .unwrap();

    Harness {
        registry,
        sdk,
        events,
        handle,
    }
}

fn fast() -> SimulationConfig {
    SimulationConfig::default()
        .with_tick(Duration::from_millis(1))
        .with_steps(5)
}

fn slow() -> SimulationConfig {
    SimulationConfig::default()
        .with_tick(Duration::from_millis(200))
        .with_steps(1_000)
}

fn porto(style_url: &str) -> OfflineDownload {
    OfflineDownload::new(
        RegionDefinition::new(
            style_url,
            LatLngBounds::new(41.13, -8.68, 41.19, -8.55),
            0.0,
            6.0,
            1.0,
        ),
        NotificationOptions::default(),
        "Porto",
    )
    .with_metadata(b"porto".to_vec())
}

/// Where the crashing SDK panics.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Crash {
    Create,
    Download,
}

/// Simulated SDK that panics once at the given stage, then behaves.
struct CrashingSdk {
    inner: Arc<SimulatedRegionDownloader>,
    stage: Crash,
    armed: AtomicBool,
}

impl CrashingSdk {
    fn new(inner: Arc<SimulatedRegionDownloader>, stage: Crash) -> Self {
        Self {
            inner,
            stage,
            armed: AtomicBool::new(true),
        }
    }

    fn crashes_at(&self, stage: Crash) -> bool {
        self.stage == stage && self.armed.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl RegionDownloaderPort for CrashingSdk {
    async fn create_region(
        &self,
        definition: &RegionDefinition,
        metadata: &[u8],
    ) -> Result<RegionHandle, SdkError> {
        if self.crashes_at(Crash::Create) {
            panic!("SDK crashed creating region");
        }
        self.inner.create_region(definition, metadata).await
    }

    async fn download(
        &self,
        region: &RegionHandle,
        status: watch::Sender<RegionStatus>,
        cancel: CancellationToken,
    ) -> Result<(), SdkError> {
        if self.crashes_at(Crash::Download) {
            status.send_replace(RegionStatus::new(1, 10, 1024));
            panic!("SDK crashed downloading region {}", region.id());
        }
        self.inner.download(region, status, cancel).await
    }

    async fn delete_region(&self, region: &RegionHandle) -> Result<(), SdkError> {
        self.inner.delete_region(region).await
    }
}

async fn next_event(events: &mut UnboundedReceiver<OfflineDownloadEvent>) -> OfflineDownloadEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("observer channel closed")
}

/// Collect events up to and including the first terminal one.
async fn until_terminal(
    events: &mut UnboundedReceiver<OfflineDownloadEvent>,
) -> Vec<OfflineDownloadEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let terminal = event.is_terminal();
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_reports_created_progress_success() {
    let mut h = harness(fast());

    assert_ok!(h.registry.start_download(porto("mapbox://styles/mapbox/streets-v11")));
    let events = until_terminal(&mut h.events).await;

    let first = &events[0];
    assert_eq!(first.event_name(), "offline:created");
    let id = first.id();
    assert_eq!(first.download().region_name, "Porto");
    assert_eq!(first.download().metadata, b"porto");

    let progress: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            OfflineDownloadEvent::Progress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last(), Some(&100));

    let last = events.last().unwrap();
    assert_eq!(last.event_name(), "offline:success");
    assert_eq!(last.id(), id);
    assert_eq!(last.download().progress, 100);
    assert!(events.iter().all(|e| e.id() == id));

    assert!(h.registry.active_downloads().is_empty());
    assert!(h.sdk.deleted_regions().is_empty());

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_deletes_region_and_reports_canceled() {
    let mut h = harness(slow());

    assert_ok!(h.registry.start_download(porto("mapbox://styles/mapbox/streets-v11")));
    let created = next_event(&mut h.events).await;
    assert_eq!(created.event_name(), "offline:created");

    let active = h.registry.active_downloads();
    assert_eq!(active.len(), 1);
    assert_ok!(h.registry.cancel_download(active[0].clone()));

    let events = until_terminal(&mut h.events).await;
    let last = events.last().unwrap();
    assert_eq!(last.event_name(), "offline:canceled");
    assert_eq!(last.id(), created.id());

    assert_eq!(h.sdk.deleted_regions(), vec![created.id()]);
    assert!(h.registry.active_downloads().is_empty());

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sdk_failure_reports_error_verbatim() {
    let mut h = harness(fast().failing_after(1));

    assert_ok!(h.registry.start_download(porto("mapbox://styles/mapbox/streets-v11")));
    let events = until_terminal(&mut h.events).await;

    assert_eq!(events[0].event_name(), "offline:created");
    match events.last().unwrap() {
        OfflineDownloadEvent::Error { error, message, .. } => {
            assert_eq!(error, "Connection");
            assert!(message.starts_with("Connection lost"));
        }
        other => panic!("Expected Error, got {other:?}"),
    }
    assert!(h.registry.active_downloads().is_empty());

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_failure_never_becomes_active() {
    let mut h = harness(fast());
    let record = porto("");

    assert_ok!(h.registry.start_download(record.clone()));
    let event = next_event(&mut h.events).await;

    match event {
        OfflineDownloadEvent::Error {
            download, error, ..
        } => {
            assert_eq!(download, record);
            assert_eq!(error, "InvalidStyle");
        }
        other => panic!("Expected Error, got {other:?}"),
    }
    assert!(h.registry.active_downloads().is_empty());

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_for_unknown_download_is_ignored() {
    let mut h = harness(fast());

    assert_ok!(h.registry.cancel_download(porto("style")));
    assert_ok!(h.registry.start_download(porto("style")));

    let events = until_terminal(&mut h.events).await;
    assert_eq!(events.last().unwrap().event_name(), "offline:success");

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_cancels_in_flight_downloads() {
    let mut h = harness(slow());

    assert_ok!(h.registry.start_download(porto("style")));
    let created = next_event(&mut h.events).await;
    assert_eq!(created.event_name(), "offline:created");

    h.handle.shutdown();
    let events = until_terminal(&mut h.events).await;
    assert_eq!(events.last().unwrap().event_name(), "offline:canceled");

    assert_ok!(timeout(WAIT, h.handle.join()).await.unwrap());
    assert!(h.registry.active_downloads().is_empty());
}

#[tokio::test]
async fn test_loop_exits_when_senders_drop() {
    let (sender, inbox) = command_channel();
    let registry = Arc::new(OfflineRegistry::new(Arc::new(NoopCommandChannel::new())));

    let handle = OfflineDownloadService::spawn(
        ServiceDeps {
            registry,
            downloader: Arc::new(SimulatedRegionDownloader::new(fast())),
            notifier: Arc::new(NoopNotifier::new()),
            config: ServiceConfig::default(),
        },
        inbox,
    )
    .unwrap();
    assert!(handle.commands().is_some());

    drop(sender);
    assert!(handle.commands().is_none());
    assert_ok!(timeout(WAIT, handle.join()).await.unwrap());
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let (sender, inbox) = command_channel();
    let registry = Arc::new(OfflineRegistry::new(Arc::new(sender)));

    let result = OfflineDownloadService::spawn(
        ServiceDeps {
            registry,
            downloader: Arc::new(SimulatedRegionDownloader::default()),
            notifier: Arc::new(NoopNotifier::new()),
            config: ServiceConfig::new("  "),
        },
        inbox,
    );

    let err = assert_err!(result.map(|_| ()));
    assert!(matches!(err, OfflineError::InvalidConfig { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_panic_reports_error_and_service_continues() {
    let sdk = Arc::new(SimulatedRegionDownloader::new(fast()));
    let crashing = Arc::new(CrashingSdk::new(Arc::clone(&sdk), Crash::Download));
    let mut h = harness_with(crashing, sdk);

    assert_ok!(h.registry.start_download(porto("style")));
    let events = until_terminal(&mut h.events).await;

    assert_eq!(events[0].event_name(), "offline:created");
    let id = events[0].id();
    match events.last().unwrap() {
        OfflineDownloadEvent::Error { download, error, .. } => {
            assert_eq!(download.id, id);
            assert_eq!(error, WORKER_FAILED_REASON);
        }
        other => panic!("Expected Error, got {other:?}"),
    }
    assert!(h.registry.active_downloads().is_empty());
    assert!(!h.handle.is_finished());

    // The loop survived the panic and still runs new downloads.
    assert_ok!(h.registry.start_download(porto("style")));
    let events = until_terminal(&mut h.events).await;
    assert!(events.iter().any(|e| e.event_name() == "offline:created" && e.id() != id));
    assert_eq!(events.last().unwrap().event_name(), "offline:success");
    assert!(h.registry.active_downloads().is_empty());

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_panic_before_activation_reports_start_failure() {
    let sdk = Arc::new(SimulatedRegionDownloader::new(fast()));
    let crashing = Arc::new(CrashingSdk::new(Arc::clone(&sdk), Crash::Create));
    let mut h = harness_with(crashing, sdk);
    let record = porto("style");

    assert_ok!(h.registry.start_download(record.clone()));
    match next_event(&mut h.events).await {
        OfflineDownloadEvent::Error {
            download, error, ..
        } => {
            assert_eq!(download, record);
            assert_eq!(error, WORKER_FAILED_REASON);
        }
        other => panic!("Expected Error, got {other:?}"),
    }
    assert!(h.registry.active_downloads().is_empty());

    // The requested id is free again.
    assert_ok!(h.registry.start_download(record));
    let events = until_terminal(&mut h.events).await;
    assert_eq!(events.last().unwrap().event_name(), "offline:success");

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_tick_download_completes() {
    let mut h = harness(fast().with_tick(Duration::ZERO));

    assert_ok!(h.registry.start_download(porto("style")));
    let events = until_terminal(&mut h.events).await;

    assert_eq!(events.last().unwrap().event_name(), "offline:success");
    assert!(!h.handle.is_finished());

    h.handle.shutdown();
    assert_ok!(h.handle.join().await);
}
