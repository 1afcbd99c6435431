//! Track boundary reconstruction from a single reference lap.

use model::{bbox_of, BBox, Point2};
use tracing::debug;

use crate::error::{ReplayError, Result};

/// Tangents shorter than this are treated as zero-length.
const MIN_NORM: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq)]
pub struct TrackGeometry {
    centerline: Vec<Point2>,
    inner: Vec<Point2>,
    outer: Vec<Point2>,
    bounds: BBox,
}

impl TrackGeometry {
    /// Offsets the reference lap by `half_width` metres along its left-hand
    /// normal to get the outer boundary, and by `-half_width` for the inner one.
    pub fn build(reference: &[Point2], half_width: f64) -> Result<Self> {
        if reference.len() < 2 {
            return Err(ReplayError::TooFewPoints { needed: 2, got: reference.len() });
        }

        let tangents = gradient(reference);
        let mut inner = Vec::with_capacity(reference.len());
        let mut outer = Vec::with_capacity(reference.len());

        for (c, t) in reference.iter().zip(&tangents) {
            let norm = (t.x * t.x + t.y * t.y).sqrt();
            let (ux, uy) = if norm > MIN_NORM { (t.x / norm, t.y / norm) } else { (1.0, 0.0) };
            // left-hand normal
            let (nx, ny) = (-uy, ux);
            outer.push(Point2 { x: c.x + nx * half_width, y: c.y + ny * half_width });
            inner.push(Point2 { x: c.x - nx * half_width, y: c.y - ny * half_width });
        }

        let bounds = bbox_of(reference).union(&bbox_of(&inner)).union(&bbox_of(&outer));
        debug!(points = reference.len(), half_width, ?bounds, "built track geometry");

        Ok(Self { centerline: reference.to_vec(), inner, outer, bounds })
    }

    pub fn from_xy(xs: &[f64], ys: &[f64], half_width: f64) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(ReplayError::MismatchedAxes { x: xs.len(), y: ys.len() });
        }
        let pts: Vec<Point2> = xs.iter().zip(ys).map(|(&x, &y)| Point2 { x, y }).collect();
        Self::build(&pts, half_width)
    }

    pub fn centerline(&self) -> &[Point2] {
        &self.centerline
    }

    pub fn inner(&self) -> &[Point2] {
        &self.inner
    }

    pub fn outer(&self) -> &[Point2] {
        &self.outer
    }

    pub fn bounds(&self) -> &BBox {
        &self.bounds
    }
}

/// Discrete derivative of a sampled curve: one-sided differences at the
/// endpoints, central differences inside.
fn gradient(pts: &[Point2]) -> Vec<Point2> {
    let n = pts.len();
    let mut d = Vec::with_capacity(n);
    for i in 0..n {
        let (a, b, h) = if i == 0 {
            (&pts[0], &pts[1.min(n - 1)], 1.0)
        } else if i == n - 1 {
            (&pts[n - 2], &pts[n - 1], 1.0)
        } else {
            (&pts[i - 1], &pts[i + 1], 2.0)
        };
        d.push(Point2 { x: (b.x - a.x) / h, y: (b.y - a.y) / h });
    }
    d
}

/// Resamples `points` to `count` samples evenly spaced in sample-index
/// parameter (not arc length), interpolating linearly between neighbours.
pub fn resample(points: &[Point2], count: usize) -> Vec<Point2> {
    let n = points.len();
    match (n, count) {
        (0, _) | (_, 0) => return Vec::new(),
        (1, _) => return vec![points[0]; count],
        (_, 1) => return vec![points[0]],
        _ => {}
    }

    let span = (n - 1) as f64;
    let steps = (count - 1) as f64;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let pos = (i as f64 / steps) * span;
        let j = (pos.floor() as usize).min(n - 2);
        out.push(points[j].lerp(&points[j + 1], pos - j as f64));
    }
    out
}

/// Boundaries resampled to a fixed density, used for fitting and drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackOutline {
    pub inner: Vec<Point2>,
    pub outer: Vec<Point2>,
}

impl TrackOutline {
    pub fn new(geometry: &TrackGeometry, count: usize) -> Self {
        Self {
            inner: resample(geometry.inner(), count),
            outer: resample(geometry.outer(), count),
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &Point2> {
        self.inner.iter().chain(self.outer.iter())
    }
}
