//! # Node Thinner
//!
//! Greedy minimum-distance thinning for geographic point sets.
//!
//! This library provides:
//! - Spatial thinning using first-come-first-kept greedy selection
//! - Overpass API response parsing and street-node extraction
//! - Layer partitioning (original/filtered/difference) for map rendering
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch thinning with rayon
//! - **`http`** - Enable HTTP client for Overpass API fetching
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use node_thinner::{GeoPoint, thin_points};
//!
//! // Street nodes in input order
//! let nodes = vec![
//!     GeoPoint::new(51.5074, -0.1278),
//!     GeoPoint::new(51.5075, -0.1279),  // ~13m from the first
//!     GeoPoint::new(51.5090, -0.1300),
//! ];
//!
//! // No two kept nodes closer than 50 meters
//! let result = thin_points(&nodes, 50.0).unwrap();
//! assert_eq!(result.kept.len(), 2);
//! assert_eq!(result.rejected.len(), 1);
//! ```

use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod geo_utils;

// Overpass API wire model, query builder and export artifact
pub mod overpass;
pub use overpass::{FilteredExport, OverpassElement, OverpassResponse, ThinnedNodes};

// Layer cycling and dataset statistics for rendering glue
pub mod layers;
pub use layers::{LayerKind, LayerView, ThinningStats};

use geo_utils::{degree_padding, haversine_distance};

// ============================================================================
// Core Types
// ============================================================================

/// A geographic point with latitude and longitude, optionally tagged with the
/// OSM node id it came from.
///
/// # Example
/// ```
/// use node_thinner::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// let node = GeoPoint::with_id(240949599, 51.5074, -0.1278);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// OSM node id, when the point came from an Overpass response
    pub id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point without an id.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { id: None, latitude, longitude }
    }

    /// Create a new point carrying an OSM node id.
    pub fn with_id(id: i64, latitude: f64, longitude: f64) -> Self {
        Self { id: Some(id), latitude, longitude }
    }

    /// Check if the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Bounding box for a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from points. Returns `None` for empty input.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self { min_lat, max_lat, min_lng, max_lng })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Result of thinning a point sequence.
///
/// `kept` and `rejected` partition the input: every input point appears in
/// exactly one of the two, and both preserve input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinResult {
    /// Points retained by the filter
    pub kept: Vec<GeoPoint>,
    /// Points dropped for being too close to an earlier kept point
    pub rejected: Vec<GeoPoint>,
}

impl ThinResult {
    /// Total number of input points this result was produced from.
    pub fn total(&self) -> usize {
        self.kept.len() + self.rejected.len()
    }

    /// Build the partition from an input slice and its keep mask.
    pub fn from_mask(points: &[GeoPoint], mask: &[bool]) -> Self {
        let kept_count = mask.iter().filter(|&&k| k).count();
        let mut kept = Vec::with_capacity(kept_count);
        let mut rejected = Vec::with_capacity(points.len() - kept_count);

        for (point, &keep) in points.iter().zip(mask) {
            if keep {
                kept.push(*point);
            } else {
                rejected.push(*point);
            }
        }

        Self { kept, rejected }
    }
}

/// Errors reported before any thinning work begins.
#[derive(Debug, Clone, PartialEq)]
pub enum ThinningError {
    /// The minimum distance is negative or non-finite
    InvalidMinDistance { min_distance: f64 },
    /// An input point has a non-finite latitude or longitude
    NonFiniteCoordinate {
        index: usize,
        latitude: f64,
        longitude: f64,
    },
    /// Transport or decoding failure from the Overpass client
    #[cfg(feature = "http")]
    Http { message: String },
}

impl fmt::Display for ThinningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThinningError::InvalidMinDistance { min_distance } => {
                write!(f, "minimum distance must be a non-negative number, got {}", min_distance)
            }
            ThinningError::NonFiniteCoordinate { index, latitude, longitude } => {
                write!(
                    f,
                    "point {} has non-finite coordinates ({}, {})",
                    index, latitude, longitude
                )
            }
            #[cfg(feature = "http")]
            ThinningError::Http { message } => {
                write!(f, "Overpass request failed: {}", message)
            }
        }
    }
}

impl std::error::Error for ThinningError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ThinningError>;

// ============================================================================
// Core Functions
// ============================================================================

/// Thin a point sequence so that no two kept points are closer than
/// `min_distance` meters.
///
/// Selection is greedy and first-come-first-kept: the first point is always
/// retained, and each subsequent point is kept only if its Haversine distance
/// to every already kept point is at least `min_distance`. A point exactly at
/// the threshold is kept; only strictly closer points are rejected. Both
/// output sequences preserve input order.
///
/// Returns an error, producing no partial result, if `min_distance` is
/// negative or non-finite, or if any input point has non-finite coordinates.
///
/// # Example
/// ```
/// use node_thinner::{GeoPoint, thin_points};
///
/// let points = vec![
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 0.0001), // ~11m east of the first
///     GeoPoint::new(10.0, 10.0),
/// ];
///
/// let result = thin_points(&points, 50.0).unwrap();
/// assert_eq!(result.kept, vec![points[0], points[2]]);
/// assert_eq!(result.rejected, vec![points[1]]);
/// ```
pub fn thin_points(points: &[GeoPoint], min_distance: f64) -> Result<ThinResult> {
    let mask = thin_mask(points, min_distance)?;
    Ok(ThinResult::from_mask(points, &mask))
}

/// Compute the keep mask for a point sequence without materializing the
/// partition.
///
/// `mask[i]` is `true` when `points[i]` survives thinning. This is the
/// single-pass core behind [`thin_points`]; callers that need to partition a
/// richer record type (e.g. full Overpass elements) can apply the mask to
/// their own sequence.
pub fn thin_mask(points: &[GeoPoint], min_distance: f64) -> Result<Vec<bool>> {
    thin_mask_with(points, min_distance, haversine_distance)
}

/// Same as [`thin_mask`], with a caller-supplied distance function.
///
/// The distance function must return meters and be symmetric; the filter
/// imposes no other requirements on it.
pub fn thin_mask_with<D>(points: &[GeoPoint], min_distance: f64, distance: D) -> Result<Vec<bool>>
where
    D: Fn(&GeoPoint, &GeoPoint) -> f64,
{
    validate(points, min_distance)?;

    let mut mask = vec![false; points.len()];
    let mut kept: Vec<&GeoPoint> = Vec::new();

    for (i, point) in points.iter().enumerate() {
        let too_close = kept.iter().any(|k| distance(point, k) < min_distance);
        if !too_close {
            mask[i] = true;
            kept.push(point);
        }
    }

    Ok(mask)
}

/// Same as [`thin_points`], with a caller-supplied distance function.
pub fn thin_points_with<D>(points: &[GeoPoint], min_distance: f64, distance: D) -> Result<ThinResult>
where
    D: Fn(&GeoPoint, &GeoPoint) -> f64,
{
    let mask = thin_mask_with(points, min_distance, distance)?;
    Ok(ThinResult::from_mask(points, &mask))
}

/// Thin a point sequence using an R-tree over the kept set.
///
/// Produces the same partition as [`thin_points`]. Instead of scanning every
/// kept point per candidate, kept points are indexed and only those inside a
/// conservatively padded envelope are verified with the exact Haversine
/// distance. Worthwhile for dense datasets where the kept set grows large.
///
/// The envelope padding assumes data away from the poles (|lat| below ~89°),
/// like the rest of the crate.
pub fn thin_points_indexed(points: &[GeoPoint], min_distance: f64) -> Result<ThinResult> {
    validate(points, min_distance)?;

    let mut mask = vec![false; points.len()];
    let mut tree: RTree<IndexedPoint> = RTree::new();

    for (i, point) in points.iter().enumerate() {
        let padding = degree_padding(min_distance, point.latitude);
        let envelope = AABB::from_corners(
            [point.latitude - padding, point.longitude - padding],
            [point.latitude + padding, point.longitude + padding],
        );

        let too_close = tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|k| haversine_distance(point, &points[k.idx]) < min_distance);

        if !too_close {
            mask[i] = true;
            tree.insert(IndexedPoint {
                idx: i,
                lat: point.latitude,
                lng: point.longitude,
            });
        }
    }

    Ok(ThinResult::from_mask(points, &mask))
}

/// Thin several independent datasets with the same threshold.
///
/// Each dataset is filtered on its own; results are returned in input order.
/// The first dataset that fails validation fails the whole call.
pub fn thin_batch(datasets: &[Vec<GeoPoint>], min_distance: f64) -> Result<Vec<ThinResult>> {
    log::debug!("thinning {} datasets at {}m", datasets.len(), min_distance);
    datasets
        .iter()
        .map(|points| thin_points(points, min_distance))
        .collect()
}

/// Thin several independent datasets in parallel.
///
/// This is the same as [`thin_batch`] but uses rayon to spread datasets
/// across threads. Per-dataset results are identical to the sequential
/// version since each invocation only touches its own input.
#[cfg(feature = "parallel")]
pub fn thin_batch_parallel(datasets: &[Vec<GeoPoint>], min_distance: f64) -> Result<Vec<ThinResult>> {
    use rayon::prelude::*;

    log::debug!("thinning {} datasets in parallel at {}m", datasets.len(), min_distance);
    datasets
        .par_iter()
        .map(|points| thin_points(points, min_distance))
        .collect()
}

// ============================================================================
// Helper Functions
// ============================================================================

fn validate(points: &[GeoPoint], min_distance: f64) -> Result<()> {
    // NaN fails the comparison, so non-finite thresholds land here too
    if !(min_distance >= 0.0) || min_distance == f64::INFINITY {
        return Err(ThinningError::InvalidMinDistance { min_distance });
    }

    for (index, point) in points.iter().enumerate() {
        if !point.is_finite() {
            return Err(ThinningError::NonFiniteCoordinate {
                index,
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
    }

    Ok(())
}

/// A kept point with its input index, for R-tree queries.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_and_outlier() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.0001), // ~11m from the first
            GeoPoint::new(10.0, 10.0),
        ]
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(51.5074, -0.1278).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_thin_close_pair_with_outlier() {
        let points = cluster_and_outlier();
        let result = thin_points(&points, 50.0).unwrap();

        assert_eq!(result.kept, vec![points[0], points[2]]);
        assert_eq!(result.rejected, vec![points[1]]);
    }

    #[test]
    fn test_thin_empty_input() {
        let result = thin_points(&[], 100.0).unwrap();
        assert!(result.kept.is_empty());
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_thin_single_point() {
        let points = vec![GeoPoint::new(44.4949, 11.3426)];
        let result = thin_points(&points, 1000.0).unwrap();
        assert_eq!(result.kept, points);
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_first_point_always_kept() {
        // All points piled within a few meters of each other
        let points: Vec<GeoPoint> = (0..5)
            .map(|i| GeoPoint::new(44.4949, 11.3426 + i as f64 * 0.00001))
            .collect();
        let result = thin_points(&points, 500.0).unwrap();

        assert_eq!(result.kept, vec![points[0]]);
        assert_eq!(result.rejected.len(), 4);
    }

    #[test]
    fn test_zero_threshold_keeps_distinct_points() {
        let points: Vec<GeoPoint> = (0..10)
            .map(|i| GeoPoint::new(44.4949 + i as f64 * 0.001, 11.3426))
            .collect();
        let result = thin_points(&points, 0.0).unwrap();

        assert_eq!(result.kept, points);
        assert!(result.rejected.is_empty());
    }

    #[test]
    fn test_coincident_duplicates_rejected() {
        let p = GeoPoint::new(44.4949, 11.3426);
        let result = thin_points(&[p, p, p], 10.0).unwrap();

        assert_eq!(result.kept, vec![p]);
        assert_eq!(result.rejected, vec![p, p]);
    }

    #[test]
    fn test_exact_threshold_distance_is_kept() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 0.001);
        let gap = geo_utils::haversine_distance(&a, &b);

        // Rejection is strict: a pair exactly at the threshold survives
        let result = thin_points(&[a, b], gap).unwrap();
        assert_eq!(result.kept.len(), 2);

        let result = thin_points(&[a, b], gap + 0.001).unwrap();
        assert_eq!(result.kept.len(), 1);
    }

    #[test]
    fn test_partition_covers_input() {
        let points: Vec<GeoPoint> = (0..40)
            .map(|i| {
                GeoPoint::with_id(
                    i as i64,
                    44.49 + (i % 7) as f64 * 0.0002,
                    11.34 + (i % 5) as f64 * 0.0003,
                )
            })
            .collect();
        let result = thin_points(&points, 60.0).unwrap();

        assert_eq!(result.total(), points.len());

        // Every input point lands on exactly one side, ids intact
        let mut seen: Vec<&GeoPoint> = result.kept.iter().chain(&result.rejected).collect();
        seen.sort_by_key(|p| p.id);
        for (i, p) in seen.iter().enumerate() {
            assert_eq!(p.id, Some(i as i64));
        }
    }

    #[test]
    fn test_minimum_separation_invariant() {
        let points: Vec<GeoPoint> = (0..60)
            .map(|i| {
                GeoPoint::new(
                    44.49 + (i * 37 % 100) as f64 * 0.0001,
                    11.34 + (i * 53 % 100) as f64 * 0.0001,
                )
            })
            .collect();
        let min_distance = 100.0;
        let result = thin_points(&points, min_distance).unwrap();

        assert!(!result.kept.is_empty());
        for (i, p) in result.kept.iter().enumerate() {
            for q in result.kept.iter().skip(i + 1) {
                assert!(geo_utils::haversine_distance(p, q) >= min_distance);
            }
        }
    }

    #[test]
    fn test_idempotent_on_thinned_input() {
        let points: Vec<GeoPoint> = (0..30)
            .map(|i| GeoPoint::new(44.49 + (i % 6) as f64 * 0.0005, 11.34 + (i / 6) as f64 * 0.0005))
            .collect();
        let first = thin_points(&points, 80.0).unwrap();
        let second = thin_points(&first.kept, 80.0).unwrap();

        assert_eq!(second.kept, first.kept);
        assert!(second.rejected.is_empty());
    }

    #[test]
    fn test_threshold_monotonicity() {
        let points: Vec<GeoPoint> = (0..50)
            .map(|i| {
                GeoPoint::new(
                    44.49 + (i * 13 % 40) as f64 * 0.0002,
                    11.34 + (i * 29 % 40) as f64 * 0.0002,
                )
            })
            .collect();

        let mut previous = usize::MAX;
        for threshold in [0.0, 20.0, 50.0, 120.0, 400.0, 2000.0] {
            let kept = thin_points(&points, threshold).unwrap().kept.len();
            assert!(kept <= previous);
            previous = kept;
        }
    }

    #[test]
    fn test_negative_min_distance_rejected() {
        let points = cluster_and_outlier();
        let err = thin_points(&points, -1.0).unwrap_err();
        assert!(matches!(err, ThinningError::InvalidMinDistance { .. }));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_nan_min_distance_rejected() {
        let err = thin_points(&cluster_and_outlier(), f64::NAN).unwrap_err();
        assert!(matches!(err, ThinningError::InvalidMinDistance { .. }));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let points = vec![
            GeoPoint::new(44.4949, 11.3426),
            GeoPoint::new(f64::INFINITY, 11.3426),
        ];
        let err = thin_points(&points, 10.0).unwrap_err();
        assert_eq!(
            err,
            ThinningError::NonFiniteCoordinate {
                index: 1,
                latitude: f64::INFINITY,
                longitude: 11.3426,
            }
        );
    }

    #[test]
    fn test_mask_matches_partition() {
        let points: Vec<GeoPoint> = (0..25)
            .map(|i| GeoPoint::new(44.49 + (i % 5) as f64 * 0.0004, 11.34 + (i / 5) as f64 * 0.0004))
            .collect();
        let mask = thin_mask(&points, 70.0).unwrap();
        let result = thin_points(&points, 70.0).unwrap();

        assert_eq!(mask.len(), points.len());
        assert_eq!(mask.iter().filter(|&&k| k).count(), result.kept.len());
        assert_eq!(ThinResult::from_mask(&points, &mask), result);
    }

    #[test]
    fn test_custom_distance_function() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(0.0, 7.0),
        ];

        // Degrees-of-longitude as a stand-in metric
        let result =
            thin_points_with(&points, 5.0, |a, b| (a.longitude - b.longitude).abs()).unwrap();
        assert_eq!(result.kept, vec![points[0], points[2]]);
        assert_eq!(result.rejected, vec![points[1]]);
    }

    #[test]
    fn test_indexed_matches_naive() {
        let points: Vec<GeoPoint> = (0..120)
            .map(|i| {
                GeoPoint::new(
                    44.49 + (i * 17 % 64) as f64 * 0.00015,
                    11.34 + (i * 31 % 64) as f64 * 0.00015,
                )
            })
            .collect();

        for threshold in [0.0, 10.0, 35.0, 90.0, 500.0] {
            let naive = thin_points(&points, threshold).unwrap();
            let indexed = thin_points_indexed(&points, threshold).unwrap();
            assert_eq!(indexed, naive, "divergence at {}m", threshold);
        }
    }

    #[test]
    fn test_indexed_validates_input() {
        let err = thin_points_indexed(&cluster_and_outlier(), -3.0).unwrap_err();
        assert!(matches!(err, ThinningError::InvalidMinDistance { .. }));
    }

    #[test]
    fn test_batch_matches_individual() {
        let datasets: Vec<Vec<GeoPoint>> = (0..4)
            .map(|d| {
                (0..20)
                    .map(|i| GeoPoint::new(44.0 + d as f64, 11.0 + (i % 6) as f64 * 0.0003))
                    .collect()
            })
            .collect();

        let batch = thin_batch(&datasets, 45.0).unwrap();
        assert_eq!(batch.len(), datasets.len());
        for (dataset, result) in datasets.iter().zip(&batch) {
            assert_eq!(*result, thin_points(dataset, 45.0).unwrap());
        }
    }

    #[test]
    fn test_batch_fails_on_invalid_dataset() {
        let datasets = vec![
            vec![GeoPoint::new(44.0, 11.0)],
            vec![GeoPoint::new(f64::NAN, 11.0)],
        ];
        assert!(thin_batch(&datasets, 10.0).is_err());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_batch_matches_sequential() {
        let datasets: Vec<Vec<GeoPoint>> = (0..8)
            .map(|d| {
                (0..30)
                    .map(|i| GeoPoint::new(40.0 + d as f64 * 0.5, 10.0 + (i % 9) as f64 * 0.0004))
                    .collect()
            })
            .collect();

        let sequential = thin_batch(&datasets, 55.0).unwrap();
        let parallel = thin_batch_parallel(&datasets, 55.0).unwrap();
        assert_eq!(parallel, sequential);
    }
}
