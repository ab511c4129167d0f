//! Layer partitioning and dataset statistics for rendering glue.
//!
//! A thinning run yields three togglable map layers: the original dataset,
//! the kept points, and the rejected difference. The map front end owns the
//! actual markers; this module owns which layer is active, what it contains,
//! and the summary numbers shown next to the map.

use crate::{Bounds, GeoPoint, ThinResult};
use std::fmt;

/// Marker colors, one per layer.
const COLOR_ORIGINAL: &str = "#e74c3c";
const COLOR_FILTERED: &str = "#3498db";
const COLOR_DIFFERENCE: &str = "#27ae60";

/// The three layers a thinning run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Every input point
    Original,
    /// Points retained by the filter
    Filtered,
    /// Points rejected by the filter
    Difference,
}

impl LayerKind {
    /// Display name for toggle controls.
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Original => "Original",
            LayerKind::Filtered => "Filtered",
            LayerKind::Difference => "Difference",
        }
    }

    /// Marker color for this layer.
    pub fn color(&self) -> &'static str {
        match self {
            LayerKind::Original => COLOR_ORIGINAL,
            LayerKind::Filtered => COLOR_FILTERED,
            LayerKind::Difference => COLOR_DIFFERENCE,
        }
    }

    /// The layer shown after this one when cycling.
    pub fn next(&self) -> LayerKind {
        match self {
            LayerKind::Original => LayerKind::Filtered,
            LayerKind::Filtered => LayerKind::Difference,
            LayerKind::Difference => LayerKind::Original,
        }
    }
}

/// View over a thinning run with one active layer at a time.
///
/// Starts on [`LayerKind::Filtered`]: the kept points are what the user asked
/// for, so they are shown first.
#[derive(Debug)]
pub struct LayerView<'a> {
    original: &'a [GeoPoint],
    result: &'a ThinResult,
    active: LayerKind,
}

impl<'a> LayerView<'a> {
    pub fn new(original: &'a [GeoPoint], result: &'a ThinResult) -> Self {
        Self {
            original,
            result,
            active: LayerKind::Filtered,
        }
    }

    /// The currently active layer.
    pub fn active(&self) -> LayerKind {
        self.active
    }

    /// Advance to the next layer and return it.
    pub fn cycle(&mut self) -> LayerKind {
        self.active = self.active.next();
        self.active
    }

    /// Points belonging to a given layer.
    pub fn points_for(&self, kind: LayerKind) -> &'a [GeoPoint] {
        match kind {
            LayerKind::Original => self.original,
            LayerKind::Filtered => &self.result.kept,
            LayerKind::Difference => &self.result.rejected,
        }
    }

    /// Points belonging to the active layer.
    pub fn active_points(&self) -> &'a [GeoPoint] {
        self.points_for(self.active)
    }

    /// Bounding box of the full dataset, for framing the map view.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.original)
    }

    /// Center of the dataset bounds.
    pub fn center(&self) -> Option<GeoPoint> {
        self.bounds().map(|b| b.center())
    }
}

/// Summary counts for a thinning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinningStats {
    pub original: usize,
    pub kept: usize,
    pub rejected: usize,
}

impl ThinningStats {
    pub fn from_result(result: &ThinResult) -> Self {
        Self {
            original: result.total(),
            kept: result.kept.len(),
            rejected: result.rejected.len(),
        }
    }

    /// Percentage of points removed, in `[0, 100]`.
    ///
    /// An empty dataset reduces by 0%, not NaN.
    pub fn reduction_percent(&self) -> f64 {
        if self.original == 0 {
            return 0.0;
        }
        (1.0 - self.kept as f64 / self.original as f64) * 100.0
    }
}

impl fmt::Display for ThinningStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} kept, {} rejected ({:.0}% reduction)",
            self.original,
            self.kept,
            self.rejected,
            self.reduction_percent()
        )
    }
}
