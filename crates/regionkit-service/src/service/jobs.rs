//! Cancellation handles of in-flight downloads, keyed by download id.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use regionkit_core::DownloadId;

/// Table of running jobs.
///
/// A job is registered under the id it was requested with and re-keyed to
/// the region id once the SDK has created the region.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Mutex<HashMap<DownloadId, CancellationToken>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. Returns `false` if one is already running under `id`.
    pub fn register(&self, id: DownloadId, cancel: CancellationToken) -> bool {
        let mut jobs = self.lock();
        if jobs.contains_key(&id) {
            return false;
        }
        jobs.insert(id, cancel);
        true
    }

    /// Move a job from `from` to `to`. Returns `false` if `from` is unknown
    /// or `to` is taken.
    pub fn rekey(&self, from: DownloadId, to: DownloadId) -> bool {
        if from == to {
            return self.lock().contains_key(&from);
        }

        let mut jobs = self.lock();
        if jobs.contains_key(&to) {
            return false;
        }
        match jobs.remove(&from) {
            Some(cancel) => {
                jobs.insert(to, cancel);
                true
            }
            None => false,
        }
    }

    /// Cancel the job running under `id`. Returns `false` if there is none.
    pub fn cancel(&self, id: DownloadId) -> bool {
        self.lock().get(&id).map(CancellationToken::cancel).is_some()
    }

    pub fn remove(&self, id: DownloadId) {
        self.lock().remove(&id);
    }

    /// Cancel every running job.
    pub fn cancel_all(&self) {
        for cancel in self.lock().values() {
            cancel.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DownloadId, CancellationToken>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_duplicate() {
        let table = JobTable::new();
        assert!(table.register(DownloadId::new(1), CancellationToken::new()));
        assert!(!table.register(DownloadId::new(1), CancellationToken::new()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rekey_moves_token() {
        let table = JobTable::new();
        let token = CancellationToken::new();
        table.register(DownloadId::new(1), token.clone());

        assert!(table.rekey(DownloadId::new(1), DownloadId::new(7)));
        assert!(!table.cancel(DownloadId::new(1)));
        assert!(table.cancel(DownloadId::new(7)));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_rekey_refuses_taken_target() {
        let table = JobTable::new();
        table.register(DownloadId::new(1), CancellationToken::new());
        table.register(DownloadId::new(2), CancellationToken::new());

        assert!(!table.rekey(DownloadId::new(1), DownloadId::new(2)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cancel_all() {
        let table = JobTable::new();
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        table.register(DownloadId::new(1), a.clone());
        table.register(DownloadId::new(2), b.clone());

        table.cancel_all();
        assert!(a.is_cancelled() && b.is_cancelled());

        table.remove(DownloadId::new(1));
        assert_eq!(table.len(), 1);
    }
}
