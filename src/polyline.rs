//! Encoded polyline codec for route geometries.
//!
//! The routing provider ships each leg's shape as a compact string of
//! zig-zag signed, base-32 variable-length coordinate deltas. Shapes are
//! decoded once when a route is parsed and kept as a [`Polyline`].

use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::geo::Position;

/// Coordinate precision used by the routing provider.
pub const DEFAULT_PRECISION: u32 = 6;

/// Highest precision that still fits comfortably in an i64 accumulator.
pub const MAX_PRECISION: u32 = 10;

const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION_BIT: i64 = 0x20;
const ASCII_OFFSET: u8 = 63;
/// Shift of the last chunk that still starts inside a u64.
const MAX_SHIFT: u32 = 60;

/// A decoded shape point, stored longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lon: f64,
    pub lat: f64,
}

impl RoutePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl Position for RoutePoint {
    fn latitude(&self) -> f64 {
        self.lat
    }

    fn longitude(&self) -> f64 {
        self.lon
    }
}

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<RoutePoint>,
}

impl Polyline {
    pub fn new(points: Vec<RoutePoint>) -> Self {
        Self { points }
    }

    /// Decodes an encoded shape at the given precision.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, NavError> {
        decode(encoded, precision).map(Self::new)
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<RoutePoint> {
        self.points
    }

    pub fn encode(&self, precision: u32) -> String {
        encode(&self.points, precision)
    }
}

/// Decodes an encoded polyline into `(lon, lat)` points.
///
/// An empty string yields no points. A string that ends inside a value,
/// carries a byte outside the encoding alphabet, or encodes a value or
/// running total that does not fit in an i64, fails with
/// [`NavError::MalformedPolyline`] at the offending offset.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<RoutePoint>, NavError> {
    let factor = scale(precision);
    let bytes = encoded.as_bytes();
    // Every point needs at least two bytes.
    let mut points = Vec::with_capacity(bytes.len() / 2);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat = accumulate(lat, bytes, &mut index)?;
        lon = accumulate(lon, bytes, &mut index)?;
        points.push(RoutePoint::new(lon as f64 / factor, lat as f64 / factor));
    }

    Ok(points)
}

/// Encodes points at the given precision; the inverse of [`decode`].
pub fn encode(points: &[RoutePoint], precision: u32) -> String {
    let factor = scale(precision);
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in points {
        let lat = (point.lat * factor).round() as i64;
        let lon = (point.lon * factor).round() as i64;
        push_value(lat.saturating_sub(prev_lat), &mut out);
        push_value(lon.saturating_sub(prev_lon), &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

fn scale(precision: u32) -> f64 {
    10f64.powi(precision.min(MAX_PRECISION) as i32)
}

fn accumulate(total: i64, bytes: &[u8], index: &mut usize) -> Result<i64, NavError> {
    let offset = *index;
    let delta = next_value(bytes, index)?;
    total
        .checked_add(delta)
        .ok_or(NavError::MalformedPolyline { offset })
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, NavError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let offset = *index;
        let byte = *bytes
            .get(offset)
            .ok_or(NavError::MalformedPolyline { offset })?;
        if !(ASCII_OFFSET..=ASCII_OFFSET + 63).contains(&byte) {
            return Err(NavError::MalformedPolyline { offset });
        }
        let chunk = i64::from(byte - ASCII_OFFSET);
        let bits = (chunk & CHUNK_MASK) as u64;
        // The last chunk may only fill the bits left below 64 and must end the value.
        if shift == MAX_SHIFT
            && (bits >> (u64::BITS - MAX_SHIFT) != 0 || chunk & CONTINUATION_BIT != 0)
        {
            return Err(NavError::MalformedPolyline { offset });
        }
        *index += 1;

        result |= bits << shift;
        shift += CHUNK_BITS;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 != 0 { !magnitude } else { magnitude })
}

fn push_value(value: i64, out: &mut String) {
    let mut v = ((value << 1) ^ (value >> 63)) as u64;
    let mask = CHUNK_MASK as u64;
    let continuation = CONTINUATION_BIT as u64;
    while v >= continuation {
        out.push(char::from(((continuation | (v & mask)) as u8) + ASCII_OFFSET));
        v >>= CHUNK_BITS;
    }
    out.push(char::from(v as u8 + ASCII_OFFSET));
}
