//! Great-circle geometry on WGS84 coordinates.
//!
//! Pure functions, no allocation. Called once per incoming fix, so keep
//! them cheap.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Anything with a latitude/longitude in degrees.
pub trait Position {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

impl Position for (f64, f64) {
    /// Tuples are (latitude, longitude).
    fn latitude(&self) -> f64 {
        self.0
    }

    fn longitude(&self) -> f64 {
        self.1
    }
}

/// A named or anonymous geographic point supplied by the user or a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub label: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Position for Location {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Haversine distance between two points in meters.
pub fn distance_meters<A, B>(a: &A, b: &B) -> f64
where
    A: Position + ?Sized,
    B: Position + ?Sized,
{
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial compass bearing from `a` to `b` in degrees, within [0, 360).
///
/// The bearing from a point to itself is 0.
pub fn bearing_degrees<A, B>(a: &A, b: &B) -> f64
where
    A: Position + ?Sized,
    B: Position + ?Sized,
{
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    if y == 0.0 && x == 0.0 {
        return 0.0;
    }

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative angles.
    if bearing >= 360.0 { 0.0 } else { bearing }
}
