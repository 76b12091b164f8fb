use std::{
    cmp,
    fmt::Display,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, shared by every haversine computation
/// in the crate so distances compare consistently.
pub(crate) const EARTH_RADIUS_KM: f64 = 6371.0;

// Approximate meters spanned by one degree at the equator, used only to
// widen a bounding box around a search center.
pub(crate) const METERS_PER_DEGREE_LON: f64 = 111_320.0;
pub(crate) const METERS_PER_DEGREE_LAT: f64 = 110_540.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f64);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Distance {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Distance {
    pub const fn from_meters(distance: f64) -> Self {
        Self(distance)
    }

    pub const fn from_kilometers(distance: f64) -> Self {
        Self(distance * 1000.0)
    }

    pub const fn as_meters(&self) -> f64 {
        self.0
    }

    pub const fn as_kilometers(&self) -> f64 {
        self.0 / 1000.0
    }

    pub fn is_valid_radius(&self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(value: Coordinate) -> Self {
        (value.latitude, value.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance between two WGS84 coordinates.
    pub fn distance(&self, coord: &Self) -> Distance {
        let dist_lat = f64::to_radians(coord.latitude - self.latitude);
        let dist_lon = f64::to_radians(coord.longitude - self.longitude);
        let a = f64::powi(f64::sin(dist_lat / 2.0), 2)
            + f64::cos(f64::to_radians(self.latitude))
                * f64::cos(f64::to_radians(coord.latitude))
                * f64::sin(dist_lon / 2.0)
                * f64::sin(dist_lon / 2.0);
        let c = 2.0 * f64::atan2(f64::sqrt(a), f64::sqrt(1.0 - a));
        Distance::from_kilometers(EARTH_RADIUS_KM * c)
    }

    pub fn latitude_is_valid(&self) -> bool {
        self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude)
    }

    pub fn longitude_is_valid(&self) -> bool {
        self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude_is_valid() && self.longitude_is_valid()
    }

    /// A latitude/longitude box guaranteed to contain every point within
    /// `radius` of this coordinate. Intentionally loose near the poles;
    /// the exact haversine filter runs afterwards.
    pub fn bounding_box(&self, radius: Distance) -> BoundingBox {
        // Padded so the box never undercuts the exact haversine radius.
        let padded = radius.as_meters() * 1.05;
        let lat_delta = padded / METERS_PER_DEGREE_LAT;
        let lon_scale = f64::cos(self.latitude.to_radians()).abs().max(0.01);
        let lon_delta = padded / (METERS_PER_DEGREE_LON * lon_scale);
        let (min_lon, max_lon) = if lon_delta >= 180.0 {
            (-180.0, 180.0)
        } else {
            // Wrap across the antimeridian; a wrapped box carries
            // min_lon > max_lon and spans the complement interval.
            let mut min = self.longitude - lon_delta;
            let mut max = self.longitude + lon_delta;
            if min < -180.0 {
                min += 360.0;
            }
            if max > 180.0 {
                max -= 360.0;
            }
            (min, max)
        };
        BoundingBox {
            min_lat: self.latitude - lat_delta,
            max_lat: self.latitude + lat_delta,
            min_lon,
            max_lon,
        }
    }

    /// GeoJSON `Point` geometry, `[lon, lat]` order per RFC 7946.
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "Point",
            "coordinates": [self.longitude, self.latitude],
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// True when the box crosses the ±180° meridian. Its longitude span is
    /// then `lon >= min_lon OR lon <= max_lon`, not a single interval.
    pub fn wraps_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }
}

/// GeoJSON `LineString` geometry for an ordered point sequence.
pub fn linestring_geojson(points: &[Coordinate]) -> serde_json::Value {
    let coordinates: Vec<[f64; 2]> = points
        .iter()
        .map(|point| [point.longitude, point.latitude])
        .collect();
    serde_json::json!({
        "type": "LineString",
        "coordinates": coordinates,
    })
}

#[test]
fn distance_test() {
    let coord_a = Coordinate {
        latitude: 48.85800943005911,
        longitude: 2.3514350059357927,
    };

    let coord_b = Coordinate {
        latitude: 51.5052389927712,
        longitude: -0.12495407345099824,
    };
    let d = coord_a.distance(&coord_b);
    assert!((d.as_kilometers() - 343.0).abs() < 2.0);
}

#[test]
fn distance_eq_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(1.0);
    assert_eq!(dist_a, dist_b)
}

#[test]
fn distance_cmp_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b)
}

#[test]
fn bounding_box_contains_radius_test() {
    let center = Coordinate::new(59.33, 18.06);
    let bounds = center.bounding_box(Distance::from_meters(500.0));
    let edge = Coordinate::new(59.334, 18.06);
    assert!(center.distance(&edge).as_meters() < 500.0);
    assert!(edge.latitude < bounds.max_lat && edge.latitude > bounds.min_lat);
}

#[test]
fn bounding_box_wraps_antimeridian_test() {
    let center = Coordinate::new(-16.8, 179.99);
    let bounds = center.bounding_box(Distance::from_meters(5000.0));
    assert!(bounds.wraps_antimeridian());
    assert!(bounds.min_lon < 180.0);
    assert!(bounds.max_lon > -180.0);

    // Boxes away from ±180° stay a single interval.
    let plain = Coordinate::new(59.33, 18.06).bounding_box(Distance::from_meters(5000.0));
    assert!(!plain.wraps_antimeridian());
}

#[test]
fn invalid_coordinate_test() {
    assert!(!Coordinate::new(91.0, 0.0).is_valid());
    assert!(!Coordinate::new(0.0, -181.0).is_valid());
    assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    assert!(Coordinate::new(-90.0, 180.0).is_valid());
}
