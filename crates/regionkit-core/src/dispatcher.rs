//! Multicast dispatch of download lifecycle events.
//!
//! # Delivery rules
//!
//! - Membership is a set keyed by observer identity (`Arc` pointer);
//!   registering the same observer twice has no effect.
//! - Delivery is synchronous, in registration order, on the caller's thread.
//! - Observers are snapshotted before delivery and no lock is held while
//!   callbacks run, so a callback may register or remove observers.
//! - A panicking observer is logged and skipped; the rest still receive
//!   the event.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::OfflineDownload;
use crate::ports::OfflineDownloadObserver;

type ObserverRef = Arc<dyn OfflineDownloadObserver>;

/// Dispatches download state changes to registered observers.
#[derive(Default)]
pub struct OfflineDownloadChangeDispatcher {
    observers: RwLock<Vec<ObserverRef>>,
}

impl OfflineDownloadChangeDispatcher {
    /// Create a dispatcher with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    ///
    /// Returns `false` if the observer was already registered.
    pub fn add_listener(&self, observer: ObserverRef) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if observers.iter().any(|o| same_observer(o, &observer)) {
            tracing::debug!(target: "regionkit.dispatcher", "Observer already registered");
            return false;
        }

        observers.push(observer);
        true
    }

    /// Deregister an observer.
    ///
    /// Returns `false` if the observer was not registered.
    pub fn remove_listener(&self, observer: &ObserverRef) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let before = observers.len();
        observers.retain(|o| !same_observer(o, observer));
        observers.len() != before
    }

    /// Number of registered observers.
    pub fn listener_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Notify observers that a download became active.
    pub fn notify_create(&self, download: &OfflineDownload) {
        self.dispatch("create", |o| o.on_create(download));
    }

    /// Notify observers of a new progress percentage.
    pub fn notify_progress(&self, download: &OfflineDownload, progress: u32) {
        self.dispatch("progress", |o| o.on_progress(download, progress));
    }

    /// Notify observers that a download finished.
    pub fn notify_success(&self, download: &OfflineDownload) {
        self.dispatch("success", |o| o.on_success(download));
    }

    /// Notify observers that a download was canceled.
    pub fn notify_cancel(&self, download: &OfflineDownload) {
        self.dispatch("cancel", |o| o.on_cancel(download));
    }

    /// Notify observers that a download failed.
    pub fn notify_error(&self, download: &OfflineDownload, error: &str, message: &str) {
        self.dispatch("error", |o| o.on_error(download, error, message));
    }

    fn snapshot(&self) -> Vec<ObserverRef> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn dispatch<F>(&self, event: &'static str, deliver: F)
    where
        F: Fn(&dyn OfflineDownloadObserver),
    {
        for (index, observer) in self.snapshot().iter().enumerate() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| deliver(observer.as_ref()))) {
                tracing::error!(
                    target: "regionkit.dispatcher",
                    event,
                    observer = index,
                    panic = %panic_message(payload.as_ref()),
                    "Observer panicked during notification"
                );
            }
        }
    }
}

/// Compare observers by the address of the shared value, ignoring vtables.
fn same_observer(a: &ObserverRef, b: &ObserverRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
