//! Core of regionkit: offline region download records, the event
//! dispatcher, the download registry and the ports to the outside world.
//!
//! # Crate layout
//!
//! - [`domain`] - `OfflineDownload`, `DownloadId`, region definitions
//! - [`events`] - `OfflineDownloadEvent` discriminated union
//! - [`ports`] - command channel, mapping SDK, notifier and observer traits
//! - [`dispatcher`] - multicast delivery to observers
//! - [`registry`] - the active-download registry
//! - [`config`] - background service configuration
//! - [`errors`] - `OfflineError`
//!
//! No I/O happens here. The background service lives in `regionkit-service`.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod registry;

// Re-export commonly used types for convenience
pub use config::{DEFAULT_CHANNEL_NAME, NOTIFICATION_GROUP_KEY, ServiceConfig};
pub use dispatcher::OfflineDownloadChangeDispatcher;
pub use domain::{
    DownloadId, LatLngBounds, NotificationOptions, OfflineDownload, RegionDefinition, RegionHandle,
};
pub use errors::{OfflineError, OfflineResult};
pub use events::OfflineDownloadEvent;
pub use ports::{
    CANCELED_REASON, ChannelObserver, CommandChannelPort, NoopCommandChannel, NoopNotifier,
    NotificationContext, NotificationPort, OfflineDownloadObserver, RegionDownloaderPort,
    RegionStatus, SdkError, ServiceCommand,
};
pub use registry::OfflineRegistry;

#[cfg(test)]
use tokio_test as _;
