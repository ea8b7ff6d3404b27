//! Background service for regionkit.
//!
//! Receives start/cancel commands sent by the
//! [`OfflineRegistry`](regionkit_core::OfflineRegistry), drives the mapping
//! SDK through [`RegionDownloaderPort`](regionkit_core::RegionDownloaderPort)
//! and reports every state change back to the registry.
//!
//! - `channel` - in-process command channel
//! - `service` - service loop, workers and progress bridges
//! - `progress` - percentage throttling
//! - `notify` - tracing-backed notifier
//! - `simulated` - simulated SDK for demos and tests
//!
//! # Wiring
//!
//! ```ignore
//! let (sender, inbox) = command_channel();
//! let registry = Arc::new(OfflineRegistry::new(Arc::new(sender)));
//! let handle = OfflineDownloadService::spawn(
//!     ServiceDeps { registry, downloader, notifier, config },
//!     inbox,
//! )?;
//! ```

#![deny(unused_crate_dependencies)]

mod channel;
mod notify;
pub(crate) mod progress;
mod service;
mod simulated;

pub use channel::{ChannelCommandSender, CommandInbox, command_channel};
pub use notify::TracingNotifier;
pub use progress::ProgressThrottle;
pub use service::{
    JobOutcome, OfflineDownloadService, ServiceDeps, ServiceHandle, WORKER_FAILED_REASON,
};
pub use simulated::{SimulatedRegionDownloader, SimulationConfig, estimate_resources};

#[cfg(test)]
use tokio_test as _;
