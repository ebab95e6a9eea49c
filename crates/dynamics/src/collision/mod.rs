//! # Narrow-Phase Collision
//!
//! Exact pairwise tests producing contact points. Every contact normal is a
//! unit vector pointing from the first shape toward the second, and depth is
//! the non-negative penetration along that normal. Exactly touching shapes
//! report a contact with depth zero.

mod box_box;
mod capsule;
mod dispatcher;
mod gjk;
mod plane;
mod ray;
mod sphere;

pub use dispatcher::CollisionDispatcher;
pub use gjk::{gjk_epa, Support};

use glam::Vec3;

use crate::error::PhysicsError;
use crate::geometry::{Frame, Shape};

/// One point of contact between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactGeom {
    /// World position of the contact.
    pub position: Vec3,
    /// Unit normal from the first shape toward the second.
    pub normal: Vec3,
    /// Penetration depth along the normal.
    pub depth: f32,
}

impl ContactGeom {
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, depth: f32) -> Self {
        Self {
            position,
            normal,
            depth,
        }
    }

    /// The same contact seen from the other shape.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Runs the registered test for the pair using the shared dispatcher.
///
/// At most `max_contacts` points are returned, deepest first.
pub fn collide_shapes(
    a: &Shape,
    frame_a: &Frame,
    b: &Shape,
    frame_b: &Frame,
    max_contacts: usize,
) -> Result<Vec<ContactGeom>, PhysicsError> {
    CollisionDispatcher::shared().collide(a, frame_a, b, frame_b, max_contacts)
}

/// Shared sphere-vs-sphere kernel used by every shape that reduces to
/// spheres around a point (capsules, segment endpoints).
pub(crate) fn sphere_pair(
    c1: Vec3,
    r1: f32,
    c2: Vec3,
    r2: f32,
    out: &mut Vec<ContactGeom>,
) {
    let d = c2 - c1;
    let dist = d.length();
    if dist > r1 + r2 {
        return;
    }
    let depth = r1 + r2 - dist;
    // Coincident centers: any axis is as good as another.
    let normal = if dist > 1e-6 { d / dist } else { Vec3::X };
    out.push(ContactGeom::new(c1 + normal * (r1 - 0.5 * depth), normal, depth));
}

/// Closest point to `p` on segment `a..b`.
pub(crate) fn closest_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// End points of a Z-aligned segment of half length `half` placed at `frame`.
pub(crate) fn segment(frame: &Frame, half: f32) -> (Vec3, Vec3) {
    let axis = frame.axis(2) * half;
    (frame.position - axis, frame.position + axis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_spheres_get_a_fallback_normal() {
        let mut out = Vec::new();
        sphere_pair(Vec3::ONE, 1.0, Vec3::ONE, 0.5, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].normal, Vec3::X);
        assert!((out[0].depth - 1.5).abs() < 1e-6);
    }

    #[test]
    fn touching_spheres_report_zero_depth() {
        let mut out = Vec::new();
        sphere_pair(Vec3::ZERO, 1.0, Vec3::new(2.0, 0.0, 0.0), 1.0, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].depth.abs() < 1e-6);
        assert_eq!(out[0].normal, Vec3::X);
    }

    #[test]
    fn closest_point_clamps_to_ends() {
        let a = Vec3::ZERO;
        let b = Vec3::X;
        assert_eq!(closest_on_segment(a, b, Vec3::new(2.0, 1.0, 0.0)), b);
        assert_eq!(closest_on_segment(a, b, Vec3::new(0.5, 1.0, 0.0)), Vec3::new(0.5, 0.0, 0.0));
    }
}
