//! Collision primitives for an axis-aligned arena
//!
//! Walls and bounding boxes are screen-space rectangles (origin top-left,
//! y grows downward). Tanks and bullets also carry a radius for the
//! circle-vs-circle hit test.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, `pos` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on `center`
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.height
    }

    /// True if `p` lies strictly inside (points on an edge are outside)
    pub fn contains_point_strict(&self, p: Vec2) -> bool {
        p.x > self.pos.x && p.x < self.right() && p.y > self.pos.y && p.y < self.bottom()
    }
}

/// Circle used for hit tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Bounding-box overlap test with an optional shrink buffer.
///
/// The buffer is subtracted from `a`'s extent on the near-edge tests and from
/// `b`'s extent on the far-edge tests, which makes it asymmetric:
/// `rects_intersect(a, b, k)` is not in general equal to `rects_intersect(b, a, k)`.
pub fn rects_intersect(a: &Rect, b: &Rect, buffer: f32) -> bool {
    a.pos.x + (a.width - buffer) > b.pos.x
        && a.pos.x < b.pos.x + (b.width - buffer)
        && a.pos.y + (a.height - buffer) > b.pos.y
        && a.pos.y < b.pos.y + (b.height - buffer)
}

/// True iff the distance between centres is less than the sum of the radii
pub fn circle_collision(a: Circle, b: Circle) -> bool {
    a.center.distance(b.center) < a.radius + b.radius
}

/// Axis-aligned bounds of a `width` x `height` box centred on `center` and
/// rotated by `rotation`
pub fn rotated_bounds(center: Vec2, width: f32, height: f32, rotation: f32) -> Rect {
    let (sin, cos) = rotation.sin_cos();
    let w = width * cos.abs() + height * sin.abs();
    let h = width * sin.abs() + height * cos.abs();
    Rect::centered(center, w, h)
}
