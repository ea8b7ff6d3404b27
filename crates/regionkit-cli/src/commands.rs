//! Subcommands and their argument types.

use clap::{Args, Subcommand};

use regionkit_core::LatLngBounds;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download a map region for offline use
    Download(DownloadArgs),
}

/// Arguments of `regionkit download`.
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Display name of the region
    #[arg(long)]
    pub name: String,

    /// Map style URL
    #[arg(long = "style-url")]
    pub style_url: String,

    /// Bounding box as SOUTH,WEST,NORTH,EAST in degrees
    #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
    pub bounds: LatLngBounds,

    /// Lowest zoom level to download
    #[arg(long = "min-zoom", default_value_t = 0.0)]
    pub min_zoom: f64,

    /// Highest zoom level to download
    #[arg(long = "max-zoom", default_value_t = 14.0)]
    pub max_zoom: f64,

    /// Device pixel ratio of the tiles
    #[arg(long = "pixel-ratio", default_value_t = 1.0)]
    pub pixel_ratio: f32,

    /// Opaque metadata stored with the region
    #[arg(long)]
    pub metadata: Option<String>,

    /// Make the simulated SDK fail after this many resources
    #[arg(long = "fail-after", hide = true)]
    pub fail_after: Option<u64>,
}

impl DownloadArgs {
    /// Check the zoom range and pixel ratio.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=22.0).contains(&self.min_zoom) || !(0.0..=22.0).contains(&self.max_zoom) {
            return Err("zoom levels must be between 0 and 22".to_string());
        }
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min zoom {} is greater than max zoom {}",
                self.min_zoom, self.max_zoom
            ));
        }
        if self.pixel_ratio <= 0.0 {
            return Err("pixel ratio must be positive".to_string());
        }
        Ok(())
    }
}

/// Parse `SOUTH,WEST,NORTH,EAST` into bounds.
pub fn parse_bounds(value: &str) -> Result<LatLngBounds, String> {
    let parts = value
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let [south, west, north, east] = parts[..] else {
        return Err(format!(
            "expected SOUTH,WEST,NORTH,EAST, got {} values",
            parts.len()
        ));
    };

    if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
        return Err("latitudes must be between -90 and 90".to_string());
    }
    if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
        return Err("longitudes must be between -180 and 180".to_string());
    }
    if south > north {
        return Err("south must not be north of north".to_string());
    }

    Ok(LatLngBounds::new(south, west, north, east))
}
