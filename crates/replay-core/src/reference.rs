//! Arc-length indexed reference curve.
//!
//! Car positions are projected onto a densely resampled copy of the
//! centerline, turning a noisy 2D position into a single "distance around the
//! lap" value that can be compared across cars.
//!
//! The nearest-sample search is an exhaustive O(K) scan. It runs once per car
//! per frame, so a spatial index would only be a performance substitution.

use model::Point2;

use crate::error::{ReplayError, Result};
use crate::geometry::resample;

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceCurve {
    points: Vec<Point2>,
    cumulative: Vec<f64>,
    total_length: f64,
}

impl ReferenceCurve {
    pub fn build(polyline: &[Point2], count: usize) -> Result<Self> {
        if polyline.len() < 2 {
            return Err(ReplayError::TooFewPoints { needed: 2, got: polyline.len() });
        }

        let points = resample(polyline, count);
        let mut cumulative = Vec::with_capacity(points.len());
        let mut acc = 0.0_f64;
        if !points.is_empty() {
            cumulative.push(0.0);
        }
        for w in points.windows(2) {
            acc += w[0].distance(&w[1]);
            cumulative.push(acc);
        }
        let total_length = if points.len() < 2 { 0.0 } else { acc };

        Ok(Self { points, cumulative, total_length })
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Arc length from the first sample to each sample; starts at 0.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the sample closest to `p`; the first one wins on ties.
    pub fn nearest_index(&self, p: &Point2) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, q) in self.points.iter().enumerate() {
            let d2 = q.distance_sq(p);
            if best.map_or(true, |(_, bd)| d2 < bd) {
                best = Some((i, d2));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Distance along the curve, in metres, of the point on it closest to `p`.
    ///
    /// Returns 0 for a zero-length curve.
    pub fn project(&self, p: &Point2) -> f64 {
        if self.total_length == 0.0 {
            return 0.0;
        }
        let idx = match self.nearest_index(p) {
            Some(i) => i,
            None => return 0.0,
        };
        let base = self.cumulative[idx];

        let (start, end) = match (self.points.get(idx), self.points.get(idx + 1)) {
            (Some(a), Some(b)) => (a, b),
            _ => return base,
        };
        let (vx, vy) = (end.x - start.x, end.y - start.y);
        let seg_len2 = vx * vx + vy * vy;
        if seg_len2 <= 0.0 {
            return base;
        }

        let t = (((p.x - start.x) * vx + (p.y - start.y) * vy) / seg_len2).clamp(0.0, 1.0);
        let proj = Point2 { x: start.x + t * vx, y: start.y + t * vy };
        base + start.distance(&proj)
    }

    pub fn project_xy(&self, x: f64, y: f64) -> f64 {
        self.project(&Point2 { x, y })
    }
}
