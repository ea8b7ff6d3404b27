//! Simulated mapping SDK.
//!
//! Implements [`RegionDownloaderPort`] without touching the network so the
//! whole start → progress → finish flow can run in demos and tests. Region
//! ids are sequential; the resource count is estimated from the tile pyramid
//! the definition covers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use regionkit_core::{
    DownloadId, RegionDefinition, RegionDownloaderPort, RegionHandle, RegionStatus, SdkError,
};

/// Resources every region needs besides tiles (style, sprite JSON, sprite
/// image, glyphs).
const STYLE_RESOURCES: u64 = 4;

/// Bytes accounted per simulated resource.
const AVERAGE_RESOURCE_BYTES: u64 = 24 * 1024;

/// Zoom levels above this are treated as this one.
const MAX_ZOOM: i32 = 22;

/// Shortest delay between status updates; `tokio::time::interval` rejects zero.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Behaviour of the simulated SDK.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Delay between status updates.
    pub tick: Duration,
    /// Number of updates a download takes.
    pub steps: u64,
    /// Upper bound on the resource estimate.
    pub max_resources: u64,
    /// Fail with a `Connection` error once this many resources completed.
    pub fail_after: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            steps: 20,
            max_resources: 50_000,
            fail_after: None,
        }
    }
}

impl SimulationConfig {
    /// Set the delay between updates.
    ///
    /// Delays shorter than a millisecond run at one update per millisecond.
    #[must_use]
    pub const fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set the number of updates.
    #[must_use]
    pub const fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// Make downloads fail once `resources` have completed.
    #[must_use]
    pub const fn failing_after(mut self, resources: u64) -> Self {
        self.fail_after = Some(resources);
        self
    }
}

/// In-memory stand-in for the mapping SDK's offline manager.
pub struct SimulatedRegionDownloader {
    config: SimulationConfig,
    next_id: AtomicI64,
    regions: Mutex<HashMap<DownloadId, RegionStatus>>,
    deleted: Mutex<Vec<DownloadId>>,
}

impl SimulatedRegionDownloader {
    /// Create a simulated SDK.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            next_id: AtomicI64::new(1),
            regions: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Ids of regions deleted so far, in deletion order.
    pub fn deleted_regions(&self) -> Vec<DownloadId> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last status recorded for a region that still exists.
    pub fn region_status(&self, id: DownloadId) -> Option<RegionStatus> {
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }

    fn record_status(&self, id: DownloadId, status: RegionStatus) {
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, status);
    }
}

impl Default for SimulatedRegionDownloader {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

/// Estimate how many resources a tile pyramid needs, capped at `cap`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn estimate_resources(definition: &RegionDefinition, cap: u64) -> u64 {
    let bounds = definition.bounds;
    let width = ((bounds.east - bounds.west).abs() / 360.0).min(1.0);
    let height = ((bounds.north - bounds.south).abs() / 180.0).min(1.0);

    let min_zoom = (definition.min_zoom.max(0.0).floor() as i32).min(MAX_ZOOM);
    let max_zoom = (definition.max_zoom.max(0.0).ceil() as i32).min(MAX_ZOOM);

    let mut tiles = 0u64;
    for zoom in min_zoom..=max_zoom {
        let per_axis = 2f64.powi(zoom);
        let columns = (width * per_axis).ceil().max(1.0) as u64;
        let rows = (height * per_axis).ceil().max(1.0) as u64;
        tiles = tiles.saturating_add(columns.saturating_mul(rows));
        if tiles >= cap {
            break;
        }
    }

    tiles.saturating_add(STYLE_RESOURCES).min(cap.max(1))
}

#[async_trait]
impl RegionDownloaderPort for SimulatedRegionDownloader {
    async fn create_region(
        &self,
        definition: &RegionDefinition,
        metadata: &[u8],
    ) -> Result<RegionHandle, SdkError> {
        if definition.style_url.trim().is_empty() {
            return Err(SdkError::new("InvalidStyle", "Style URL is empty"));
        }

        let id = DownloadId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.record_status(id, RegionStatus::default());

        tracing::debug!(target: "regionkit.simulated", id = %id, "Region created");
        Ok(RegionHandle::new(id, definition.clone(), metadata.to_vec()))
    }

    async fn download(
        &self,
        region: &RegionHandle,
        status: watch::Sender<RegionStatus>,
        cancel: CancellationToken,
    ) -> Result<(), SdkError> {
        let required = estimate_resources(region.definition(), self.config.max_resources);
        let per_step = required.div_ceil(self.config.steps.max(1)).max(1);

        let mut ticker = tokio::time::interval(self.config.tick.max(MIN_TICK));
        let mut completed = 0u64;
        status.send_replace(RegionStatus::new(0, required, 0));

        while completed < required {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    return Err(SdkError::cancelled());
                }

                _ = ticker.tick() => {}
            }

            completed = completed.saturating_add(per_step).min(required);
            let current = RegionStatus::new(
                completed,
                required,
                completed.saturating_mul(AVERAGE_RESOURCE_BYTES),
            );

            if let Some(limit) = self.config.fail_after
                && completed >= limit
            {
                return Err(SdkError::new(
                    "Connection",
                    format!("Connection lost after {completed} of {required} resources"),
                ));
            }

            self.record_status(region.id(), current);
            status.send_replace(current);
        }

        Ok(())
    }

    async fn delete_region(&self, region: &RegionHandle) -> Result<(), SdkError> {
        let removed = self
            .regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&region.id());

        if removed.is_none() {
            return Err(SdkError::new(
                "NotFound",
                format!("Region {} does not exist", region.id()),
            ));
        }

        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(region.id());
        Ok(())
    }
}
