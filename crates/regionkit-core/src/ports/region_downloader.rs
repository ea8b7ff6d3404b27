//! Mapping SDK port.
//!
//! Everything that actually touches tiles lives behind this trait: creating
//! the region in the SDK's offline database, downloading its resources and
//! deleting it again. The background service drives it; the registry never
//! sees it.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::{RegionDefinition, RegionHandle};

/// Reason code the service uses when a download was canceled.
pub const CANCELED_REASON: &str = "Canceled";

/// Error reported by the mapping SDK.
///
/// Both fields are opaque: they are surfaced to observers verbatim.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{reason}: {message}")]
pub struct SdkError {
    /// Short error code (e.g. `Connection`, `NotFound`).
    pub reason: String,
    /// Full description of the error.
    pub message: String,
}

impl SdkError {
    /// Create an SDK error.
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Error used when a download stops because it was canceled.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(CANCELED_REASON, "Download canceled")
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.reason == CANCELED_REASON
    }
}

/// Download status reported by the SDK while a region downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStatus {
    /// Resources downloaded so far.
    pub completed_resource_count: u64,
    /// Resources the region needs in total (may grow while planning).
    pub required_resource_count: u64,
    /// Bytes downloaded so far.
    pub completed_resource_size: u64,
}

impl RegionStatus {
    /// Create a status snapshot.
    #[must_use]
    pub const fn new(completed: u64, required: u64, completed_size: u64) -> Self {
        Self {
            completed_resource_count: completed,
            required_resource_count: required,
            completed_resource_size: completed_size,
        }
    }

    /// Completed percentage, rounded down, in 0..=100.
    ///
    /// Zero while the required count is still unknown.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.required_resource_count == 0 {
            return 0;
        }
        let completed = self
            .completed_resource_count
            .min(self.required_resource_count);
        let pct = completed.saturating_mul(100) / self.required_resource_count;
        u32::try_from(pct).unwrap_or(100)
    }

    /// Whether every required resource is present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.required_resource_count > 0
            && self.completed_resource_count >= self.required_resource_count
    }
}

/// Port for the mapping SDK's offline facilities.
#[async_trait]
pub trait RegionDownloaderPort: Send + Sync {
    /// Create a region in the SDK's offline database.
    ///
    /// The returned handle carries the SDK-assigned id.
    async fn create_region(
        &self,
        definition: &RegionDefinition,
        metadata: &[u8],
    ) -> Result<RegionHandle, SdkError>;

    /// Download every resource of a region.
    ///
    /// Publishes status updates on `status` and returns once the region is
    /// complete. Returns [`SdkError::cancelled`] when `cancel` fires first.
    async fn download(
        &self,
        region: &RegionHandle,
        status: watch::Sender<RegionStatus>,
        cancel: CancellationToken,
    ) -> Result<(), SdkError>;

    /// Delete a region and its resources.
    async fn delete_region(&self, region: &RegionHandle) -> Result<(), SdkError>;
}
