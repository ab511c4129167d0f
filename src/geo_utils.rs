//! # Geographic Utilities
//!
//! Core geographic computation utilities for spatial thinning.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points |
//! | [`degree_padding`] | Conservative meter-to-degree conversion at a latitude |
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! The haversine formula calculates the great-circle distance between two
//! points on a sphere. It's the standard method for map-scale distance
//! calculation, accurate to within 0.3% for most practical applications.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees),
//! which is the standard used by GPS receivers and mapping services.

use crate::GeoPoint;

/// Earth radius in meters used by [`haversine_distance`].
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Calculate the great-circle distance between two points using the
/// Haversine formula.
///
/// Returns the distance in meters along the Earth's surface (assuming a
/// spherical Earth with radius 6,371 km). Symmetric up to floating-point
/// rounding, zero for identical points. Coordinates are taken as given; no
/// range clamping is performed.
///
/// # Example
///
/// ```rust
/// use node_thinner::GeoPoint;
/// use node_thinner::geo_utils::haversine_distance;
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
///
/// let distance = haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + p1.latitude.to_radians().cos() * p2.latitude.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Convert meters to a degree padding that is never smaller than the true
/// angular distance, at a given latitude.
///
/// Used to build envelope queries over degree-indexed points: a point within
/// `meters` of the query center is always inside a box padded by this value.
/// The constant underestimates meters-per-degree (the true value is
/// ~111,195 m at this Earth radius), so the resulting padding overestimates,
/// on both axes.
///
/// Longitude degrees shrink with `cos(latitude)`; the cosine is floored so
/// the padding stays finite near the poles, where longitude degrees become
/// meaningless anyway.
#[inline]
pub fn degree_padding(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 110_000.0 * lat_rad.cos().max(0.01);
    meters / meters_per_degree
}

// =============================================================================
// Unit Tests
// =============================================================================
