//! Geographic primitives shared by the decoder and the overlay layer.

use serde::{Deserialize, Serialize};

/// A 2D geographic point. `x` is longitude, `y` is latitude.
///
/// # Example
///
/// ```rust
/// use geopreview::Point;
///
/// let p = Point::lonlat(-122.4, 37.8);
/// assert_eq!(p.lon(), -122.4);
/// assert_eq!(p.lat(), 37.8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (longitude)
    pub x: f64,
    /// Y coordinate (latitude)
    pub y: f64,
}

impl Point {
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Semantic alias for [`Point::new`] making the lon/lat order explicit.
    #[inline]
    #[must_use]
    pub fn lonlat(lon: f64, lat: f64) -> Self {
        Self { x: lon, y: lat }
    }

    #[inline]
    #[must_use]
    pub fn lon(&self) -> f64 {
        self.x
    }

    #[inline]
    #[must_use]
    pub fn lat(&self) -> f64 {
        self.y
    }

    /// `(lat, lon)` pair in the order mapping layers expect corners.
    #[inline]
    #[must_use]
    pub fn latlon_tuple(&self) -> (f64, f64) {
        (self.y, self.x)
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Geographic extent of a raster in its native coordinate units.
///
/// The serde aliases accept the backend's legacy `bottom/left/top/right`
/// key set alongside the canonical compass names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    #[serde(alias = "bottom")]
    pub south: f64,
    #[serde(alias = "left")]
    pub west: f64,
    #[serde(alias = "top")]
    pub north: f64,
    #[serde(alias = "right")]
    pub east: f64,
}

impl GeoBounds {
    #[must_use]
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Build from two world-space corners in any order.
    #[must_use]
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            south: y0.min(y1),
            west: x0.min(x1),
            north: y0.max(y1),
            east: x0.max(x1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_lonlat_accessors() {
        let p = Point::lonlat(30.0, 10.0);
        assert_eq!(p.lon(), 30.0);
        assert_eq!(p.lat(), 10.0);
        assert_eq!(p.latlon_tuple(), (10.0, 30.0));
    }

    #[test]
    fn bounds_from_corners_orders_axes() {
        let b = GeoBounds::from_corners(40.0, 30.0, 20.0, 10.0);
        assert_eq!(b, GeoBounds::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn bounds_deserialize_compass_keys() {
        let b: GeoBounds =
            serde_json::from_str(r#"{"south":10,"west":20,"north":30,"east":40}"#).unwrap();
        assert_eq!(b, GeoBounds::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn bounds_deserialize_legacy_keys() {
        let b: GeoBounds =
            serde_json::from_str(r#"{"bottom":10,"left":20,"top":30,"right":40}"#).unwrap();
        assert_eq!(b, GeoBounds::new(10.0, 20.0, 30.0, 40.0));
    }
}
