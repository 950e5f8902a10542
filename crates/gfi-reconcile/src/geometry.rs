//! Geometry aggregation: bounding box, centroid and serialized point path.
//!
//! All arithmetic is exact decimal (`rust_decimal`); no floats touch stored
//! coordinates.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum number of fractional digits carried by a computed centroid.
pub const CENTROID_MIN_SCALE: u32 = 7;

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl Point {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn check_range(&self) -> Result<(), CoordinateOutOfRange> {
        let lat_ok = self.latitude.abs() <= Decimal::from(90);
        let lon_ok = self.longitude.abs() <= Decimal::from(180);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(CoordinateOutOfRange { point: *self })
        }
    }
}

/// A point outside the valid latitude/longitude ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("coordinate {point} is outside latitude [-90, 90] or longitude [-180, 180]")]
pub struct CoordinateOutOfRange {
    pub point: Point,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.latitude, self.longitude)
    }
}

/// Corners and centre of the box enclosing a location's points.
///
/// `top_left` is (max latitude, min longitude); `bottom_right` is
/// (min latitude, max longitude).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
    pub centroid: Point,
}

/// Running extremes over a non-empty point sequence.
///
/// Seeded from the first point, so there is no empty state to guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    max_lat: Decimal,
    min_lat: Decimal,
    min_lon: Decimal,
    max_lon: Decimal,
}

impl Extent {
    pub fn from_point(p: &Point) -> Self {
        Self {
            max_lat: p.latitude,
            min_lat: p.latitude,
            min_lon: p.longitude,
            max_lon: p.longitude,
        }
    }

    pub fn include(&mut self, p: &Point) {
        if p.latitude > self.max_lat {
            self.max_lat = p.latitude;
        }
        if p.latitude < self.min_lat {
            self.min_lat = p.latitude;
        }
        if p.longitude < self.min_lon {
            self.min_lon = p.longitude;
        }
        if p.longitude > self.max_lon {
            self.max_lon = p.longitude;
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let top_left = Point::new(self.max_lat, self.min_lon);
        let bottom_right = Point::new(self.min_lat, self.max_lon);
        let centroid = Point::new(
            midpoint(top_left.latitude, bottom_right.latitude),
            midpoint(top_left.longitude, bottom_right.longitude),
        );
        BoundingBox {
            top_left,
            bottom_right,
            centroid,
        }
    }
}

/// Bounding box over `points`, or `None` when the slice is empty.
pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let (first, rest) = points.split_first()?;
    let mut extent = Extent::from_point(first);
    for p in rest {
        extent.include(p);
    }
    Some(extent.bounding_box())
}

/// Exact midpoint, widened to at least [`CENTROID_MIN_SCALE`] fractional digits.
///
/// Callers pass range-checked coordinates, so the sum cannot overflow.
fn midpoint(a: Decimal, b: Decimal) -> Decimal {
    let mut mid = (a + b) / Decimal::TWO;
    if mid.scale() < CENTROID_MIN_SCALE {
        mid.rescale(CENTROID_MIN_SCALE);
    }
    mid
}

/// Serialize a point path as `lat,lon;lat,lon;...` in sequence order.
pub fn complex_points(points: &[Point]) -> String {
    let mut out = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(&p.latitude.to_string());
        out.push(',');
        out.push_str(&p.longitude.to_string());
    }
    out
}
