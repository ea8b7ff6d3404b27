//! Background service configuration.
//!
//! The configuration is handed to the service when it is spawned and is
//! never re-applied afterwards. It only affects presentation and progress
//! pacing; the registry and dispatcher do not read it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::OfflineError;

/// Default notification channel name.
pub const DEFAULT_CHANNEL_NAME: &str = "Offline";

/// Default minimum interval between progress reports, in milliseconds.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 100;

/// Group key used when concurrent downloads share one notification summary.
pub const NOTIFICATION_GROUP_KEY: &str = "regionkit.offline.downloads";

/// Configuration for the background download service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Display name of the notification channel.
    pub channel_name: String,
    /// Group concurrent downloads under one notification summary.
    pub use_grouping: bool,
    /// Minimum interval between progress reports for one download.
    pub progress_interval_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            use_grouping: true,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
        }
    }
}

impl ServiceConfig {
    /// Create a config with the given channel name.
    #[must_use]
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            ..Default::default()
        }
    }

    /// Set whether downloads are grouped.
    #[must_use]
    pub const fn with_grouping(mut self, use_grouping: bool) -> Self {
        self.use_grouping = use_grouping;
        self
    }

    /// Set the progress report interval.
    #[must_use]
    pub const fn with_progress_interval_ms(mut self, interval_ms: u64) -> Self {
        self.progress_interval_ms = interval_ms;
        self
    }

    /// Progress report interval as a `Duration`.
    #[must_use]
    pub const fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Notification group key, if grouping is enabled.
    #[must_use]
    pub fn group_key(&self) -> Option<&'static str> {
        self.use_grouping.then_some(NOTIFICATION_GROUP_KEY)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), OfflineError> {
        if self.channel_name.trim().is_empty() {
            return Err(OfflineError::invalid_config(
                "Notification channel name cannot be empty",
            ));
        }

        if self.progress_interval_ms > 60_000 {
            return Err(OfflineError::invalid_config(format!(
                "Progress interval must be at most 60000 ms, got {}",
                self.progress_interval_ms
            )));
        }

        Ok(())
    }
}
