//! Integration tests for the registry lifecycle as seen by observers.

use std::sync::{Arc, Mutex};

use regionkit_core::{
    ChannelObserver, DownloadId, LatLngBounds, NoopCommandChannel, NotificationOptions,
    OfflineDownload, OfflineDownloadEvent, OfflineDownloadObserver, OfflineRegistry,
    RegionDefinition, RegionHandle,
};
use tokio_test::{assert_err, assert_ok};

fn lisbon(name: &str) -> OfflineDownload {
    OfflineDownload::new(
        RegionDefinition::new(
            "mapbox://styles/mapbox/outdoors-v12",
            LatLngBounds::new(38.69, -9.23, 38.80, -9.09),
            10.0,
            16.0,
            2.0,
        ),
        NotificationOptions::default(),
        name,
    )
}

fn registry() -> Arc<OfflineRegistry> {
    Arc::new(OfflineRegistry::new(Arc::new(NoopCommandChannel::new())))
}

#[tokio::test]
async fn test_created_progress_success_scenario() {
    let registry = registry();
    let (observer, mut events) = ChannelObserver::new();
    registry.add_offline_download_state_change_listener(Arc::new(observer));

    let r1 = lisbon("Region A");
    assert_eq!(r1.progress, 0);

    assert_ok!(registry.add_download(r1.clone()));
    assert_eq!(registry.active_downloads(), vec![r1.clone()]);
    assert_eq!(
        events.recv().await.unwrap(),
        OfflineDownloadEvent::created(&r1)
    );

    assert_ok!(registry.on_progress_changed(r1.id, 42));
    match events.recv().await.unwrap() {
        OfflineDownloadEvent::Progress { download, progress } => {
            assert_eq!(progress, 42);
            assert_eq!(download.id, r1.id);
            assert_eq!(download.progress, 42);
        }
        other => panic!("Expected Progress, got {other:?}"),
    }

    assert_ok!(registry.remove_download(r1.id, false));
    let event = events.recv().await.unwrap();
    assert_eq!(event.event_name(), "offline:success");
    assert!(event.is_terminal());
    assert!(registry.active_downloads().is_empty());
}

#[tokio::test]
async fn test_error_event_carries_code_and_message() {
    let registry = registry();
    let (observer, mut events) = ChannelObserver::new();
    registry.add_offline_download_state_change_listener(Arc::new(observer));

    let download = lisbon("Region B");
    assert_ok!(registry.add_download(download.clone()));
    let _created = events.recv().await;

    assert_ok!(registry.error_download(download.id, "Server", "HTTP 503"));

    match events.recv().await.unwrap() {
        OfflineDownloadEvent::Error { error, message, .. } => {
            assert_eq!(error, "Server");
            assert_eq!(message, "HTTP 503");
        }
        other => panic!("Expected Error, got {other:?}"),
    }
    assert!(registry.active_downloads().is_empty());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_every_observer_gets_one_cancel_in_registration_order() {
    struct Named {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl OfflineDownloadObserver for Named {
        fn on_cancel(&self, _download: &OfflineDownload) {
            self.log.lock().unwrap().push(self.name);
        }

        fn on_success(&self, _download: &OfflineDownload) {
            panic!("success must not fire for a canceled download");
        }
    }

    let registry = registry();
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ["first", "second", "third"] {
        registry.add_offline_download_state_change_listener(Arc::new(Named {
            name,
            log: Arc::clone(&log),
        }));
    }

    let download = lisbon("Region C");
    assert_ok!(registry.add_download(download.clone()));
    assert_ok!(registry.remove_download(download.id, true));

    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    assert!(!registry.is_active(download.id));
}

#[test]
fn test_lookup_distinguishes_regions() {
    let registry = registry();
    let r1 = lisbon("Region 1").with_id(DownloadId::new(100));
    let r2 = lisbon("Region 2").with_id(DownloadId::new(200));
    assert_ok!(registry.add_download(r1.clone()));
    assert_ok!(registry.add_download(r2.clone()));

    let handle = RegionHandle::new(r2.id, r2.definition.clone(), r2.metadata.clone());
    let found = registry.active_download_for_region(&handle);

    assert_eq!(found, Some(r2));
    assert_ne!(found, Some(r1));
}

#[test]
fn test_terminal_state_is_final() {
    let registry = registry();
    let download = lisbon("Region D");
    assert_ok!(registry.add_download(download.clone()));
    assert_ok!(registry.remove_download(download.id, false));

    assert_err!(registry.on_progress_changed(download.id, 50));
    assert_err!(registry.remove_download(download.id, true));
}
