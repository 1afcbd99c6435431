//! World to screen mapping for the track view.

use model::{BBox, Point2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Screen area available to the host, with side regions reserved for overlays.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub left_margin: f64,
    pub right_margin: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, left_margin: f64, right_margin: f64) -> Self {
        Self { width, height, left_margin, right_margin }
    }

    /// Width between the two margins, never below 1.
    pub fn inner_width(&self) -> f64 {
        (self.width - self.left_margin - self.right_margin).max(1.0)
    }

    /// Height never below 1, so a minimised window still fits with scale > 0.
    pub fn inner_height(&self) -> f64 {
        self.height.max(1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Rotation {
    angle: f64,
    sin: f64,
    cos: f64,
}

impl Rotation {
    fn new(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { angle, sin, cos }
    }

    fn about(&self, p: &Point2, c: &Point2) -> Point2 {
        let (dx, dy) = (p.x - c.x, p.y - c.y);
        Point2 {
            x: dx * self.cos - dy * self.sin + c.x,
            y: dx * self.sin + dy * self.cos + c.y,
        }
    }
}

/// Uniform scale + translate fitting the rotated track into a viewport.
///
/// Only constructed through [`ViewportTransform::fit`], so every instance has
/// been fitted at least once. Call [`update`](Self::update) on every resize;
/// [`world_to_screen`](Self::world_to_screen) never refits on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportTransform {
    center: Point2,
    bounds: BBox,
    rotation: Rotation,
    padding: f64,
    viewport: Viewport,
    scale: f64,
    tx: f64,
    ty: f64,
}

impl ViewportTransform {
    pub fn fit<'a>(
        bounds: &BBox,
        outline: impl IntoIterator<Item = &'a Point2>,
        rotation_rad: f64,
        padding: f64,
        viewport: Viewport,
    ) -> Self {
        let mut vt = Self {
            center: bounds.center(),
            bounds: *bounds,
            rotation: Rotation::new(rotation_rad),
            padding,
            viewport,
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        };
        vt.update(outline, viewport);
        vt
    }

    /// Recomputes scale and translation for a new viewport.
    pub fn update<'a>(&mut self, outline: impl IntoIterator<Item = &'a Point2>, viewport: Viewport) {
        let mut ext = BBox::EMPTY;
        for p in outline {
            ext.include(&self.rotation.about(p, &self.center));
        }
        if ext.is_empty() {
            ext = self.bounds;
        }

        let world_w = ext.width().max(1.0);
        let world_h = ext.height().max(1.0);

        let inner_w = viewport.inner_width();
        let inner_h = viewport.inner_height();
        let usable_w = inner_w * (1.0 - 2.0 * self.padding);
        let usable_h = inner_h * (1.0 - 2.0 * self.padding);
        self.scale = (usable_w / world_w).min(usable_h / world_h);

        // rotation is about the centre, so the centre itself does not move
        let screen_cx = viewport.left_margin + inner_w / 2.0;
        let screen_cy = inner_h / 2.0;
        self.tx = screen_cx - self.scale * self.center.x;
        self.ty = screen_cy - self.scale * self.center.y;
        self.viewport = viewport;

        debug!(
            width = viewport.width,
            height = viewport.height,
            scale = self.scale,
            tx = self.tx,
            ty = self.ty,
            "viewport refit"
        );
    }

    /// Changes the rotation and refits against the last viewport.
    pub fn set_rotation<'a>(&mut self, outline: impl IntoIterator<Item = &'a Point2>, rotation_rad: f64) {
        self.rotation = Rotation::new(rotation_rad);
        let vp = self.viewport;
        self.update(outline, vp);
    }

    pub fn world_to_screen(&self, p: &Point2) -> Point2 {
        let r = if self.rotation.angle == 0.0 {
            *p
        } else {
            self.rotation.about(p, &self.center)
        };
        Point2 {
            x: self.scale * r.x + self.tx,
            y: self.scale * r.y + self.ty,
        }
    }

    pub fn screen_polyline(&self, points: &[Point2]) -> Vec<Point2> {
        points.iter().map(|p| self.world_to_screen(p)).collect()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    pub fn rotation_rad(&self) -> f64 {
        self.rotation.angle
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use model::bbox_of;
    use std::f64::consts::FRAC_PI_2;

    fn rect(w: f64, h: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    #[test]
    fn test_unrotated_is_plain_affine() {
        let pts = rect(1000.0, 500.0);
        let b = bbox_of(&pts);
        let vp = Viewport::new(1600.0, 900.0, 340.0, 260.0);
        let vt = ViewportTransform::fit(&b, &pts, 0.0, 0.05, vp);

        // inner 1000 * 0.9 = 900 wide, 900 * 0.9 = 810 high -> width limits
        assert_abs_diff_eq!(vt.scale(), 0.9, epsilon = 1e-12);
        let (tx, ty) = vt.translation();
        assert_abs_diff_eq!(tx, 840.0 - 0.9 * 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ty, 450.0 - 0.9 * 250.0, epsilon = 1e-9);

        for p in [Point2::new(0.0, 0.0), Point2::new(123.0, -45.5), Point2::new(1000.0, 500.0)] {
            let s = vt.world_to_screen(&p);
            assert_eq!(s.x, vt.scale() * p.x + tx);
            assert_eq!(s.y, vt.scale() * p.y + ty);
        }
    }

    #[test]
    fn test_center_maps_to_usable_center() {
        let pts = rect(400.0, 400.0);
        let b = bbox_of(&pts);
        let vp = Viewport::new(1920.0, 1080.0, 340.0, 260.0);
        let vt = ViewportTransform::fit(&b, &pts, 0.7, 0.05, vp);
        let c = vt.world_to_screen(&b.center());
        assert_abs_diff_eq!(c.x, 340.0 + (1920.0 - 600.0) / 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.y, 540.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quarter_turn_swaps_limiting_dimension() {
        let pts = rect(1000.0, 100.0);
        let b = bbox_of(&pts);
        let vp = Viewport::new(1000.0, 1000.0, 0.0, 0.0);
        let flat = ViewportTransform::fit(&b, &pts, 0.0, 0.0, vp);
        assert_abs_diff_eq!(flat.scale(), 1.0, epsilon = 1e-12);

        let mut vt = flat.clone();
        vt.set_rotation(&pts, FRAC_PI_2);
        assert_abs_diff_eq!(vt.scale(), 1.0, epsilon = 1e-9);
        // the long side now runs vertically
        let a = vt.world_to_screen(&Point2::new(0.0, 50.0));
        let z = vt.world_to_screen(&Point2::new(1000.0, 50.0));
        assert_abs_diff_eq!(a.x, z.x, epsilon = 1e-9);
        assert_abs_diff_eq!((z.y - a.y).abs(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_resize_changes_scale() {
        let pts = rect(100.0, 100.0);
        let b = bbox_of(&pts);
        let mut vt = ViewportTransform::fit(&b, &pts, 0.0, 0.0, Viewport::new(200.0, 200.0, 0.0, 0.0));
        assert_abs_diff_eq!(vt.scale(), 2.0);
        vt.update(&pts, Viewport::new(400.0, 1000.0, 0.0, 0.0));
        assert_abs_diff_eq!(vt.scale(), 4.0);
        assert_eq!(vt.viewport().width, 400.0);
    }

    #[test]
    fn test_degenerate_world_is_floored() {
        let pts = vec![Point2::new(5.0, 5.0); 3];
        let b = bbox_of(&pts);
        let vt = ViewportTransform::fit(&b, &pts, 0.0, 0.0, Viewport::new(100.0, 50.0, 0.0, 0.0));
        assert_abs_diff_eq!(vt.scale(), 50.0);
        assert!(vt.world_to_screen(&Point2::new(5.0, 5.0)).x.is_finite());
    }

    #[test]
    fn test_oversized_margins_keep_positive_scale() {
        let pts = rect(10.0, 10.0);
        let b = bbox_of(&pts);
        let vt = ViewportTransform::fit(&b, &pts, 0.0, 0.05, Viewport::new(300.0, 300.0, 340.0, 260.0));
        assert!(vt.scale() > 0.0);
    }

    #[test]
    fn test_zero_or_negative_height_keeps_positive_scale() {
        let pts = rect(100.0, 100.0);
        let b = bbox_of(&pts);
        for h in [0.0, -10.0] {
            let vt = ViewportTransform::fit(&b, &pts, 0.0, 0.05, Viewport::new(1920.0, h, 340.0, 260.0));
            // floored to 1 px high: 0.9 / 100
            assert_abs_diff_eq!(vt.scale(), 0.009, epsilon = 1e-12);
            let a = vt.world_to_screen(&Point2::new(0.0, 0.0));
            let z = vt.world_to_screen(&Point2::new(100.0, 100.0));
            assert!(z.x > a.x && z.y > a.y);
        }
    }
}
