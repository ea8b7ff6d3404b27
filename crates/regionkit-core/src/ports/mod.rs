//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from its collaborators:
//! the background service, the mapping SDK, the notification surface and
//! the observers that want to hear about downloads.
//!
//! # Design Rules
//!
//! - Only domain types in signatures
//! - No platform or SDK implementation details
//! - Every port has a no-op or channel-backed implementation for tests

pub mod command_channel;
pub mod notifier;
pub mod observer;
pub mod region_downloader;

pub use command_channel::{CommandChannelPort, NoopCommandChannel, ServiceCommand};
pub use notifier::{NoopNotifier, NotificationContext, NotificationPort};
pub use observer::{ChannelObserver, OfflineDownloadObserver};
pub use region_downloader::{CANCELED_REASON, RegionDownloaderPort, RegionStatus, SdkError};

#[cfg(test)]
pub use command_channel::MockCommandChannelPort;
