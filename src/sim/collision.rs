//! Collision detection for circles and axis-aligned rectangles
//!
//! Every movable thing in the arena is a circle (player, enemies, boss,
//! projectiles, pickups, explosion fields); walls are axis-aligned
//! rectangles. A circle with a non-positive radius is treated as having
//! no body at all and never collides.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Bounding square of a circle
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Grow the rectangle by `amount` in total along each axis (centered)
    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount / 2.0,
            self.y - amount / 2.0,
            self.w + amount,
            self.h + amount,
        )
    }

    /// Strict overlap test; touching edges do not count
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.w <= 0.0 || self.h <= 0.0 || other.w <= 0.0 || other.h <= 0.0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Closest point of the rectangle to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.x, self.right()), p.y.clamp(self.y, self.bottom()))
    }
}

/// Circle vs circle overlap (strictly closer than the sum of radii)
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    if radius_a <= 0.0 || radius_b <= 0.0 {
        return false;
    }
    a.distance(b) < radius_a + radius_b
}

/// Point-ish source vs circle: used by area damage where the source is a
/// burst radius and the target a body. Unlike [`circles_overlap`] the
/// burst may be measured from a point, so only the burst radius must be
/// positive; a bodiless target is still excluded.
#[inline]
pub fn within_burst(origin: Vec2, burst_radius: f32, target: Vec2, target_radius: f32) -> bool {
    if burst_radius <= 0.0 || target_radius <= 0.0 {
        return false;
    }
    origin.distance(target) < burst_radius + target_radius
}

/// Circle vs axis-aligned rectangle overlap
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    if radius <= 0.0 || rect.w <= 0.0 || rect.h <= 0.0 {
        return false;
    }
    let closest = rect.closest_point(center);
    center.distance_squared(closest) < radius * radius
}

/// True if the circle overlaps any of the rectangles
pub fn circle_hits_any(center: Vec2, radius: f32, rects: impl IntoIterator<Item = Rect>) -> bool {
    rects
        .into_iter()
        .any(|r| circle_rect_overlap(center, radius, &r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap() {
        let a = Vec2::new(0.0, 0.0);
        assert!(circles_overlap(a, 10.0, Vec2::new(15.0, 0.0), 10.0));
        assert!(!circles_overlap(a, 10.0, Vec2::new(25.0, 0.0), 10.0));
        // Touching is not overlapping
        assert!(!circles_overlap(a, 10.0, Vec2::new(20.0, 0.0), 10.0));
    }

    #[test]
    fn test_degenerate_radius_never_collides() {
        let a = Vec2::new(5.0, 5.0);
        assert!(!circles_overlap(a, 0.0, a, 10.0));
        assert!(!circles_overlap(a, -3.0, a, 10.0));
        assert!(!within_burst(a, 100.0, a, 0.0));
        let wall = Rect::new(0.0, 0.0, 20.0, 20.0);
        assert!(!circle_rect_overlap(a, 0.0, &wall));
        assert!(!circle_rect_overlap(a, -1.0, &wall));
    }

    #[test]
    fn test_circle_rect_overlap_edges_and_corners() {
        let wall = Rect::new(100.0, 100.0, 50.0, 20.0);

        // Directly above the top edge
        assert!(circle_rect_overlap(Vec2::new(120.0, 95.0), 8.0, &wall));
        assert!(!circle_rect_overlap(Vec2::new(120.0, 90.0), 8.0, &wall));

        // Near the corner: bounding boxes overlap but the circle does not
        assert!(!circle_rect_overlap(Vec2::new(94.0, 94.0), 8.0, &wall));
        assert!(Rect::around_circle(Vec2::new(94.0, 94.0), 8.0).intersects(&wall));

        // Center inside the rectangle
        assert!(circle_rect_overlap(Vec2::new(125.0, 110.0), 1.0, &wall));
    }

    #[test]
    fn test_rect_inflate_and_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(15.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.inflate(12.0).intersects(&b));
        // Edge contact only
        let c = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&c));
    }
}
