//! 2D vector math for the simulation plane.
//!
//! The level is flat geometry with scalar heights, so everything here is
//! planar: points, segment queries, and the crossing test the collision
//! resolver and trigger dispatcher share.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// 2D vector / point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar cross product (z component of the 3D cross)
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.len();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        Vec2 {
            x: self.x / l,
            y: self.y / l,
        }
    }

    pub fn scale(self, s: f32) -> Vec2 {
        Vec2 {
            x: self.x * s,
            y: self.y * s,
        }
    }

    /// Left-hand perpendicular
    pub fn perp(self) -> Vec2 {
        Vec2 {
            x: -self.y,
            y: self.x,
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        self.scale(s)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2 {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Nearest point on segment `a`-`b` to point `p`.
///
/// Returns the point and the segment parameter `t`. With `clamped`, `t` is
/// restricted to [0, 1]; otherwise the infinite line is used. A zero-length
/// segment returns `a` with `t = 0` rather than dividing by zero.
pub fn nearest_point_on_segment(p: Vec2, a: Vec2, b: Vec2, clamped: bool) -> (Vec2, f32) {
    let d = b - a;
    let len_sq = d.dot(d);
    if len_sq == 0.0 {
        return (a, 0.0);
    }

    let t = (p - a).dot(d) / len_sq;
    let c = if clamped { t.clamp(0.0, 1.0) } else { t };

    (a + d * c, c)
}

/// Intersection of segment `a1`-`a2` with segment `b1`-`b2`.
///
/// Returns the intersection point and the parameter along segment `a`, or
/// `None` for parallel or non-overlapping segments.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<(Vec2, f32)> {
    let a = a2 - a1;
    let b = b2 - b1;

    let denom = a.cross(b);

    // Parallel segments cannot intersect
    if denom == 0.0 {
        return None;
    }

    let c = b1 - a1;

    let u = c.cross(a) / denom;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let t = c.cross(b) / denom;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some((a1 + a * t, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_point_interior() {
        let (p, t) = nearest_point_on_segment(
            Vec2::new(5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            true,
        );
        assert_eq!(p, Vec2::new(5.0, 0.0));
        assert_eq!(t, 0.5);
    }

    #[test]
    fn test_nearest_point_clamps_to_endpoint() {
        let (p, t) = nearest_point_on_segment(
            Vec2::new(15.0, 3.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            true,
        );
        assert_eq!(p, Vec2::new(10.0, 0.0));
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_nearest_point_degenerate_segment() {
        let a = Vec2::new(3.0, 4.0);
        let (p, t) = nearest_point_on_segment(Vec2::new(9.0, 9.0), a, a, true);
        assert_eq!(p, a);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn test_segments_intersect_crossing() {
        let hit = segments_intersect(
            Vec2::new(0.0, -5.0),
            Vec2::new(0.0, 5.0),
            Vec2::new(-5.0, 0.0),
            Vec2::new(5.0, 0.0),
        );
        let (p, t) = hit.expect("segments cross");
        assert_eq!(p, Vec2::new(0.0, 0.0));
        assert_eq!(t, 0.5);
    }

    #[test]
    fn test_segments_intersect_parallel() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(10.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_segments_intersect_disjoint() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(5.0, -1.0),
            Vec2::new(5.0, 1.0),
        )
        .is_none());
    }
}
