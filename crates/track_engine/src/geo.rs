//! Great-circle geometry on a spherical Earth.

use ::geo::{Bearing, Distance, HaversineMeasure, Point};
use contracts::GeoCoord;

/// Mean Earth radius (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn sphere() -> HaversineMeasure {
    HaversineMeasure::new(EARTH_RADIUS_M)
}

fn point(c: GeoCoord) -> Point<f64> {
    Point::new(c.longitude, c.latitude)
}

/// Haversine distance between two coordinates (m)
#[inline]
pub fn distance_meters(a: GeoCoord, b: GeoCoord) -> f64 {
    sphere().distance(point(a), point(b))
}

/// Initial bearing from `a` towards `b`, degrees in [0, 360)
pub fn bearing_degrees(a: GeoCoord, b: GeoCoord) -> f64 {
    sphere().bearing(point(a), point(b))
}
