//! Map overlay frame derivation.
//!
//! Translates a raster's bounding box into the corner pair and centroid a
//! mapping layer needs to place a rectangle and marker. When a raster
//! carries no geolocation the translator returns `None` and the consumer
//! renders a geolocation-unavailable placeholder -- coordinates are never
//! fabricated.

use std::sync::OnceLock;

use crate::geometry::{GeoBounds, Point};

/// Display-frame placement for a raster's footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFrame {
    pub southwest: Point,
    pub northeast: Point,
    pub center: Point,
}

/// Derive the overlay frame from an optional bounding box.
///
/// Corners pass through unchanged; the center is the arithmetic midpoint.
/// `None` in, `None` out -- absence of geolocation is not an error and not
/// an origin-placed frame.
#[must_use]
pub fn frame(bounds: Option<&GeoBounds>) -> Option<OverlayFrame> {
    let b = bounds?;
    Some(OverlayFrame {
        southwest: Point::lonlat(b.west, b.south),
        northeast: Point::lonlat(b.east, b.north),
        center: Point::lonlat((b.west + b.east) / 2.0, (b.south + b.north) / 2.0),
    })
}

/// Marker appearance handed to the mapping layer alongside an overlay
/// frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub icon_url: &'static str,
    pub icon_retina_url: &'static str,
    pub shadow_url: &'static str,
    /// Footprint rectangle stroke color.
    pub stroke_color: &'static str,
    pub stroke_weight: u32,
    pub fill_opacity: f32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            icon_url: "markers/marker-icon.png",
            icon_retina_url: "markers/marker-icon-2x.png",
            shadow_url: "markers/marker-shadow.png",
            stroke_color: "#3b82f6",
            stroke_weight: 2,
            fill_opacity: 0.05,
        }
    }
}

static MARKER_STYLE: OnceLock<MarkerStyle> = OnceLock::new();

/// One-time marker-style initialization, idempotent and scoped to this
/// module's own state. Call before the first map render; repeat calls
/// return the already-installed style.
pub fn init_marker_style(style: MarkerStyle) -> &'static MarkerStyle {
    MARKER_STYLE.get_or_init(|| style)
}

/// The installed marker style, installing the default on first use.
#[must_use]
pub fn marker_style() -> &'static MarkerStyle {
    MARKER_STYLE.get_or_init(MarkerStyle::default)
}
