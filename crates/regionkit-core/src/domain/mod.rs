//! Domain types for offline region downloads.
//!
//! Pure data types with no I/O dependencies.

pub mod download;
pub mod notification;
pub mod region;

pub use download::{DownloadId, OfflineDownload};
pub use notification::NotificationOptions;
pub use region::{LatLngBounds, RegionDefinition, RegionHandle};
