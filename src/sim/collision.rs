//! Collision detection and response primitives
//!
//! Circles against circles and axis-aligned rectangles, plus restitution
//! reflection. Every function here is total: zero-distance pairs, negative
//! radii and non-finite inputs produce a miss (or an unchanged velocity)
//! instead of a NaN normal.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Distances below this are treated as coincident centers
pub const DEGENERATE_DISTANCE: f32 = 0.001;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the other shape
    pub point: Vec2,
    /// Unit normal pointing from the other shape toward the tested circle
    /// (the push-out direction)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// True if the vector has no NaN or infinite components
#[inline]
pub fn is_sane(v: Vec2) -> bool {
    v.is_finite()
}

#[inline]
fn sane_radius(r: f32) -> bool {
    r.is_finite() && r >= 0.0
}

/// Circle `a` against circle `b`
///
/// The normal points from `b` to `a`. Coincident centers are skipped.
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    if !is_sane(a_pos) || !is_sane(b_pos) || !sane_radius(a_radius) || !sane_radius(b_radius) {
        return CollisionResult::miss();
    }

    let delta = a_pos - b_pos;
    let dist = delta.length();
    let reach = a_radius + b_radius;

    if dist >= reach || dist <= DEGENERATE_DISTANCE {
        return CollisionResult::miss();
    }

    let normal = delta / dist;
    CollisionResult {
        hit: true,
        point: b_pos + normal * b_radius,
        normal,
        penetration: reach - dist,
    }
}

/// Circle against an axis-aligned rectangle
///
/// Uses the clamped closest point. When the center is inside the rectangle
/// the closest point coincides with it, so the normal falls back to the
/// nearest face.
pub fn circle_rect(center: Vec2, radius: f32, rect: &Rect) -> CollisionResult {
    if !is_sane(center) || !sane_radius(radius) || !is_sane(rect.min) || !is_sane(rect.max) {
        return CollisionResult::miss();
    }

    let closest = rect.closest_point(center);
    let delta = center - closest;
    let dist = delta.length();

    if dist > DEGENERATE_DISTANCE {
        if dist >= radius {
            return CollisionResult::miss();
        }
        return CollisionResult {
            hit: true,
            point: closest,
            normal: delta / dist,
            penetration: radius - dist,
        };
    }

    // Center inside: exit through the nearest face
    let faces = [
        (center.x - rect.min.x, Vec2::NEG_X, Vec2::new(rect.min.x, center.y)),
        (rect.max.x - center.x, Vec2::X, Vec2::new(rect.max.x, center.y)),
        (center.y - rect.min.y, Vec2::NEG_Y, Vec2::new(center.x, rect.min.y)),
        (rect.max.y - center.y, Vec2::Y, Vec2::new(center.x, rect.max.y)),
    ];
    let (depth, normal, point) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::NEG_Y, center));

    CollisionResult {
        hit: true,
        point,
        normal,
        penetration: depth + radius,
    }
}

/// Reflect velocity off a surface with restitution
///
/// If `v` moves into the surface (`v·n < 0`), returns
/// `v - (1 + restitution)(v·n)n`; otherwise `v` unchanged. Returns a fresh
/// value, never mutates. A zero or non-finite normal leaves `v` unchanged.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    if !is_sane(velocity) || !is_sane(normal) || !restitution.is_finite() {
        return velocity;
    }
    let n = normal.normalize_or_zero();
    if n == Vec2::ZERO {
        return velocity;
    }
    let vn = velocity.dot(n);
    if vn < 0.0 {
        velocity - (1.0 + restitution) * vn * n
    } else {
        velocity
    }
}

/// Keep a circle inside `[margin, size - margin]` on both axes
///
/// Mutates `pos` and `vel` in place. A clamped axis has its velocity
/// component reflected and scaled by the restitution (the bottom edge uses
/// `ground_restitution`). Returns true if the bottom edge was touched.
pub fn clamp_to_bounds(
    pos: &mut Vec2,
    vel: &mut Vec2,
    size: Vec2,
    margin: f32,
    wall_restitution: f32,
    ground_restitution: f32,
) -> bool {
    let min = Vec2::splat(margin);
    let max = (size - Vec2::splat(margin)).max(min);
    let mut grounded = false;

    if pos.x < min.x {
        pos.x = min.x;
        vel.x *= -wall_restitution;
    } else if pos.x > max.x {
        pos.x = max.x;
        vel.x *= -wall_restitution;
    }

    if pos.y < min.y {
        pos.y = min.y;
        vel.y *= -wall_restitution;
    } else if pos.y > max.y {
        pos.y = max.y;
        vel.y *= -ground_restitution;
        grounded = true;
    }

    grounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_circle_circle_overlap() {
        let result = circle_circle(Vec2::new(15.0, 0.0), 10.0, Vec2::ZERO, 10.0);
        assert!(result.hit);
        assert!((result.penetration - 5.0).abs() < 1e-5);
        assert!((result.normal - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_circle_circle_separated_and_degenerate() {
        assert!(!circle_circle(Vec2::new(25.0, 0.0), 10.0, Vec2::ZERO, 10.0).hit);
        // Identical centers: skipped, no NaN
        let result = circle_circle(Vec2::ONE, 10.0, Vec2::ONE, 10.0);
        assert!(!result.hit);
        assert!(result.normal.is_finite());
        // Garbage in, miss out
        assert!(!circle_circle(Vec2::new(f32::NAN, 0.0), 10.0, Vec2::ZERO, 10.0).hit);
        assert!(!circle_circle(Vec2::new(1.0, 0.0), -10.0, Vec2::ZERO, 10.0).hit);
    }

    #[test]
    fn test_circle_rect_outside_corner() {
        let rect = Rect::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let result = circle_rect(Vec2::new(13.0, 14.0), 6.0, &rect);
        assert!(result.hit);
        assert_eq!(result.point, Vec2::new(10.0, 10.0));
        assert!((result.penetration - 1.0).abs() < 1e-5);

        assert!(!circle_rect(Vec2::new(20.0, 20.0), 6.0, &rect).hit);
    }

    #[test]
    fn test_circle_rect_center_inside_uses_nearest_face() {
        let rect = Rect::new(Vec2::ZERO, Vec2::new(100.0, 20.0));
        let result = circle_rect(Vec2::new(50.0, 3.0), 5.0, &rect);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::NEG_Y);
        assert!((result.penetration - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving down onto a floor whose normal points up
        let v = reflect_velocity(Vec2::new(3.0, 10.0), Vec2::NEG_Y, 0.5);
        assert!((v.x - 3.0).abs() < 1e-5);
        assert!((v.y + 5.0).abs() < 1e-5);

        // Moving away: untouched
        let v = reflect_velocity(Vec2::new(0.0, -4.0), Vec2::NEG_Y, 0.5);
        assert_eq!(v, Vec2::new(0.0, -4.0));

        // Zero normal: untouched
        let v = reflect_velocity(Vec2::new(1.0, 1.0), Vec2::ZERO, 0.5);
        assert_eq!(v, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_ground_clamp_bounce() {
        let height = 600.0;
        let mut pos = Vec2::new(200.0, height - 1.0);
        let mut vel = Vec2::new(0.0, 5.0);
        let grounded = clamp_to_bounds(&mut pos, &mut vel, Vec2::new(800.0, height), 12.0, 0.3, 0.3);
        assert!(grounded);
        assert_eq!(pos.y, height - 12.0);
        assert!((vel.y - (-1.5)).abs() < 1e-5);
    }

    #[test]
    fn test_wall_clamp_bounce() {
        let mut pos = Vec2::new(2.0, 100.0);
        let mut vel = Vec2::new(-10.0, 0.0);
        let grounded = clamp_to_bounds(&mut pos, &mut vel, Vec2::new(800.0, 600.0), 12.0, 0.3, 0.35);
        assert!(!grounded);
        assert_eq!(pos.x, 12.0);
        assert!((vel.x - 3.0).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_reflection_speed_bound(
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
            angle in 0.0f32..std::f32::consts::TAU,
            restitution in 0.0f32..=2.0,
        ) {
            let v = Vec2::new(vx, vy);
            let n = Vec2::new(angle.cos(), angle.sin());
            let out = reflect_velocity(v, n, restitution);
            prop_assert!(out.length() <= (1.0 + restitution) * v.length() + 1e-3);
        }
    }
}
