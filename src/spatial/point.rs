//! Unit-sphere points and great-circle distance.
//!
//! Distances are computed on 3D unit vectors rather than on raw latitude and
//! longitude, which keeps the poles and the antimeridian free of special cases.

use s2::point::Point;
use s2::r3::vector::Vector;

/// Mean Earth radius used to turn central angles into meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_010.0;

/// Project (latitude, longitude) in degrees onto the unit sphere.
pub fn unit_point(lat: f64, lon: f64) -> Point {
    let (phi, lambda) = (lat.to_radians(), lon.to_radians());
    let cos_phi = phi.cos();
    Point(Vector {
        x: cos_phi * lambda.cos(),
        y: cos_phi * lambda.sin(),
        z: phi.sin(),
    })
}

/// Project a `geo::Point` (x = longitude, y = latitude) onto the unit sphere.
pub fn from_geo(point: &geo::Point) -> Point {
    unit_point(point.y(), point.x())
}

/// Central angle between two unit points, in radians.
///
/// Uses `atan2(|a x b|, a . b)`, which stays accurate for both tiny and
/// near-antipodal separations.
pub fn central_angle(a: &Point, b: &Point) -> f64 {
    let (a, b) = (&a.0, &b.0);
    let cx = a.y * b.z - a.z * b.y;
    let cy = a.z * b.x - a.x * b.z;
    let cz = a.x * b.y - a.y * b.x;
    let cross = (cx * cx + cy * cy + cz * cz).sqrt();
    let dot = a.x * b.x + a.y * b.y + a.z * b.z;
    cross.atan2(dot)
}

/// Great-circle distance between two unit points, in meters.
pub fn distance_meters(a: &Point, b: &Point) -> f64 {
    central_angle(a, b) * EARTH_RADIUS_METERS
}

/// Great-circle distance between two (latitude, longitude) pairs in degrees, in meters.
pub fn distance_between_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    distance_meters(&unit_point(lat1, lon1), &unit_point(lat2, lon2))
}

/// Central angle, in radians, subtended by an arc of `meters` along the surface.
///
/// Negative and NaN inputs map to zero; the result never exceeds pi.
pub fn meters_to_radians(meters: f64) -> f64 {
    if meters.is_nan() || meters <= 0.0 {
        return 0.0;
    }
    (meters / EARTH_RADIUS_METERS).min(std::f64::consts::PI)
}
