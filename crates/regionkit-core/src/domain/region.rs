//! Region definitions and handles.
//!
//! These types describe *what* the mapping SDK should download. The core
//! never interprets them: bounds are not checked, zoom ranges are not
//! clamped, style URLs are not resolved. Invalid values surface as SDK
//! errors later in the download.

use serde::{Deserialize, Serialize};

use super::download::DownloadId;

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    /// Southern latitude.
    pub south: f64,
    /// Western longitude.
    pub west: f64,
    /// Northern latitude.
    pub north: f64,
    /// Eastern longitude.
    pub east: f64,
}

impl LatLngBounds {
    /// Create bounds from south-west and north-east corners.
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Bounds covering the whole world.
    #[must_use]
    pub const fn world() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }
}

/// Tile-pyramid definition of an offline region.
///
/// Mirrors the information the mapping SDK needs to plan a download:
/// which style to render, which area, and which zoom levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Style URL used to resolve sources and sprites.
    pub style_url: String,
    /// Area to download.
    pub bounds: LatLngBounds,
    /// Lowest zoom level to include.
    pub min_zoom: f64,
    /// Highest zoom level to include.
    pub max_zoom: f64,
    /// Device pixel ratio the tiles are rendered for.
    pub pixel_ratio: f32,
    /// Whether CJK glyph ranges are downloaded as well.
    #[serde(default)]
    pub include_ideographs: bool,
}

impl RegionDefinition {
    /// Create a tile-pyramid definition.
    pub fn new(
        style_url: impl Into<String>,
        bounds: LatLngBounds,
        min_zoom: f64,
        max_zoom: f64,
        pixel_ratio: f32,
    ) -> Self {
        Self {
            style_url: style_url.into(),
            bounds,
            min_zoom,
            max_zoom,
            pixel_ratio,
            include_ideographs: false,
        }
    }

    /// Set whether ideographic glyphs are included.
    #[must_use]
    pub const fn with_ideographs(mut self, include: bool) -> Self {
        self.include_ideographs = include;
        self
    }
}

/// Handle to a region that exists inside the mapping SDK.
///
/// The `id` is assigned by the SDK and is the key used to correlate an
/// [`OfflineDownload`](super::OfflineDownload) with its region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHandle {
    id: DownloadId,
    definition: RegionDefinition,
    metadata: Vec<u8>,
}

impl RegionHandle {
    /// Create a handle for a region the SDK has created.
    pub const fn new(id: DownloadId, definition: RegionDefinition, metadata: Vec<u8>) -> Self {
        Self {
            id,
            definition,
            metadata,
        }
    }

    /// SDK-assigned region identifier.
    #[must_use]
    pub const fn id(&self) -> DownloadId {
        self.id
    }

    /// Definition the region was created with.
    #[must_use]
    pub const fn definition(&self) -> &RegionDefinition {
        &self.definition
    }

    /// Opaque metadata stored alongside the region.
    #[must_use]
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }
}
