//! The offline download record.
//!
//! An [`OfflineDownload`] describes one requested region download. It is a
//! plain value: the caller builds it, the background service re-keys it with
//! the SDK's region id, and the registry owns the copy whose progress
//! changes while the download runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::notification::NotificationOptions;
use super::region::{RegionDefinition, RegionHandle};

/// Identifier of an offline download.
///
/// Random at creation, then replaced by the SDK's region id once the region
/// exists. Stable for the lifetime of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(i64);

impl DownloadId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Generate a fresh identifier from the most significant bits of a v4 UUID.
    #[must_use]
    pub fn random() -> Self {
        let (most_significant, _) = uuid::Uuid::new_v4().as_u64_pair();
        Self(most_significant.cast_signed())
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DownloadId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// One requested offline region download.
///
/// Equality compares every field, metadata byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineDownload {
    /// What to download.
    pub definition: RegionDefinition,
    /// How the background service presents the download.
    pub notification_options: NotificationOptions,
    /// Human-readable region name.
    pub region_name: String,
    /// Opaque caller metadata, stored with the region.
    #[serde(default, with = "metadata_base64")]
    pub metadata: Vec<u8>,
    /// Completed percentage (0-100).
    #[serde(default)]
    pub progress: u32,
    /// Correlation key with the SDK region.
    pub id: DownloadId,
}

impl OfflineDownload {
    /// Create a record with empty metadata, zero progress and a random id.
    pub fn new(
        definition: RegionDefinition,
        notification_options: NotificationOptions,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            definition,
            notification_options,
            region_name: region_name.into(),
            metadata: Vec::new(),
            progress: 0,
            id: DownloadId::random(),
        }
    }

    /// Set the opaque metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<Vec<u8>>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Set the progress percentage.
    #[must_use]
    pub const fn with_progress(mut self, progress: u32) -> Self {
        self.progress = progress;
        self
    }

    /// Set the identifier.
    #[must_use]
    pub const fn with_id(mut self, id: DownloadId) -> Self {
        self.id = id;
        self
    }

    /// Whether this record belongs to the given SDK region.
    #[must_use]
    pub fn matches_region(&self, region: &RegionHandle) -> bool {
        self.id == region.id()
    }
}

/// Metadata travels as base64 so serialized commands stay text-safe.
mod metadata_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LatLngBounds;

    fn definition() -> RegionDefinition {
        RegionDefinition::new(
            "mapbox://styles/mapbox/streets-v11",
            LatLngBounds::new(38.69, -9.23, 38.80, -9.09),
            10.0,
            14.0,
            2.0,
        )
    }

    fn record(name: &str) -> OfflineDownload {
        OfflineDownload::new(definition(), NotificationOptions::default(), name)
    }

    #[test]
    fn test_defaults() {
        let download = record("Region A");
        assert_eq!(download.region_name, "Region A");
        assert!(download.metadata.is_empty());
        assert_eq!(download.progress, 0);
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(record("a").id, record("b").id);
    }

    #[test]
    fn test_equality_compares_metadata_bytes() {
        let id = DownloadId::new(7);
        let a = record("Region A").with_id(id).with_metadata(vec![1, 2, 3]);
        let b = record("Region A").with_id(id).with_metadata(vec![1, 2, 3]);
        let c = record("Region A").with_id(id).with_metadata(vec![1, 2, 4]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_equality_compares_progress_and_id() {
        let a = record("Region A").with_id(DownloadId::new(1));
        assert_ne!(a, a.clone().with_progress(5));
        assert_ne!(a, a.clone().with_id(DownloadId::new(2)));
    }

    #[test]
    fn test_metadata_serializes_as_base64() {
        let download = record("Region A")
            .with_id(DownloadId::new(-42))
            .with_metadata(b"hello".to_vec());

        let json = serde_json::to_value(&download).unwrap();
        assert_eq!(json["metadata"], "aGVsbG8=");
        assert_eq!(json["id"], -42);

        let back: OfflineDownload = serde_json::from_value(json).unwrap();
        assert_eq!(back, download);
    }

    #[test]
    fn test_matches_region() {
        let download = record("Region A").with_id(DownloadId::new(99));
        let handle = RegionHandle::new(DownloadId::new(99), definition(), Vec::new());
        let other = RegionHandle::new(DownloadId::new(100), definition(), Vec::new());

        assert!(download.matches_region(&handle));
        assert!(!download.matches_region(&other));
    }
}
