//! Arc geometry
//!
//! Where an arc visually meets a node, and how parallel arcs between the
//! same pair of nodes fan out. Nothing here fails: degenerate input yields
//! the node center or a zero offset.

use crate::ids::NodeId;
use crate::net::Arc;
use std::ops::{Add, Mul, Neg, Sub};

// ============================================================================
// Primitives
// ============================================================================

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        self + (other - self) * t
    }

    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }
}

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Counter-clockwise perpendicular (in y-down screen space this points left)
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Sub for Point {
    type Output = Vec2;

    fn sub(self, rhs: Point) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vec2> for Point {
    type Output = Point;

    fn add(self, rhs: Vec2) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Node outline
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Place
    Circle { center: Point, radius: f32 },
    /// Transition
    Rect {
        center: Point,
        half_width: f32,
        half_height: f32,
    },
}

impl Shape {
    pub fn center(&self) -> Point {
        match *self {
            Shape::Circle { center, .. } | Shape::Rect { center, .. } => center,
        }
    }
}

// ============================================================================
// Anchors
// ============================================================================

/// Point on the shape's boundary in the direction of `towards`
///
/// Returns the center unchanged when `towards` coincides with it.
pub fn anchor_point(shape: &Shape, towards: Point) -> Point {
    let center = shape.center();
    let d = towards - center;
    if d.is_zero() {
        return center;
    }

    match *shape {
        Shape::Circle { radius, .. } => center + d.normalize() * radius,
        Shape::Rect {
            half_width,
            half_height,
            ..
        } => {
            // One of the ratios is infinite on an axis-aligned direction;
            // min() then picks the finite one.
            let sx = half_width / d.x.abs();
            let sy = half_height / d.y.abs();
            center + d * sx.min(sy)
        }
    }
}

// ============================================================================
// Parallel arcs
// ============================================================================

/// Signed perpendicular offset for `arc` among its siblings in `all_arcs`
///
/// Siblings join the same unordered pair of nodes. They are ordered by id and
/// spread symmetrically, `(index - (n - 1) / 2) * amount`. The value is
/// measured along [`canonical_normal`] of the pair, never along the arc's own
/// direction, so one arc keeps its lane whichever way a token travels on it.
pub fn parallel_offset(arc: &Arc, all_arcs: &[Arc], amount: f32) -> f32 {
    let mut siblings: Vec<&Arc> = all_arcs.iter().filter(|a| a.is_sibling_of(arc)).collect();
    if siblings.len() <= 1 {
        return 0.0;
    }
    siblings.sort_by(|a, b| a.id.cmp(&b.id));

    let Some(index) = siblings.iter().position(|a| a.id == arc.id) else {
        return 0.0;
    };

    let n = siblings.len() as f32;
    (index as f32 - (n - 1.0) / 2.0) * amount
}

/// Unit normal of the node pair, oriented from the lexicographically smaller
/// id to the larger one
///
/// Both travel directions between the same two nodes share this normal.
pub fn canonical_normal(a: (&NodeId, Point), b: (&NodeId, Point)) -> Vec2 {
    let ((_, from), (_, to)) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    (to - from).normalize().perpendicular()
}
