//! Per-download notification presentation.

use serde::{Deserialize, Serialize};

/// Default notification title.
pub const DEFAULT_CONTENT_TITLE: &str = "Offline download";

/// Default notification body prefix; the region name is appended.
pub const DEFAULT_CONTENT_TEXT: &str = "Downloading: ";

/// Default label of the cancel action.
pub const DEFAULT_CANCEL_TEXT: &str = "Cancel";

/// How the background service presents one download to the user.
///
/// Only the notification adapter reads these values; the registry and
/// dispatcher carry them around untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationOptions {
    /// Title line of the notification.
    pub content_title: String,
    /// Body text; the region name is appended when shown.
    pub content_text: String,
    /// Label of the cancel action.
    pub cancel_text: String,
    /// Whether a map snapshot of the region is requested for the large icon.
    pub request_map_snapshot: bool,
    /// Screen to return to when the notification is tapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_activity: Option<String>,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            content_title: DEFAULT_CONTENT_TITLE.to_string(),
            content_text: DEFAULT_CONTENT_TEXT.to_string(),
            cancel_text: DEFAULT_CANCEL_TEXT.to_string(),
            request_map_snapshot: true,
            return_activity: None,
        }
    }
}

impl NotificationOptions {
    /// Set the title line.
    #[must_use]
    pub fn with_content_title(mut self, title: impl Into<String>) -> Self {
        self.content_title = title.into();
        self
    }

    /// Set the body text.
    #[must_use]
    pub fn with_content_text(mut self, text: impl Into<String>) -> Self {
        self.content_text = text.into();
        self
    }

    /// Set the cancel action label.
    #[must_use]
    pub fn with_cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = text.into();
        self
    }

    /// Set whether a map snapshot is requested.
    #[must_use]
    pub const fn with_map_snapshot(mut self, request: bool) -> Self {
        self.request_map_snapshot = request;
        self
    }

    /// Set the screen to return to.
    #[must_use]
    pub fn with_return_activity(mut self, activity: impl Into<String>) -> Self {
        self.return_activity = Some(activity.into());
        self
    }

    /// Body text for a given region name.
    #[must_use]
    pub fn body_for(&self, region_name: &str) -> String {
        format!("{}{region_name}", self.content_text)
    }
}
