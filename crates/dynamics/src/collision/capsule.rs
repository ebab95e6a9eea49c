//! Capsule against capsule.

use glam::Vec3;

use super::{closest_on_segment, segment, sphere_pair, ContactGeom};
use crate::geometry::{Frame, Shape};

/// Closest points between segments `p1..q1` and `p2..q2`.
pub(crate) fn closest_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);
    let eps = 1e-12;

    if a <= eps && e <= eps {
        return (p1, p2);
    }
    let (s, t) = if a <= eps {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= eps {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > eps {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

pub(super) fn capsule_capsule(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (
        Shape::Capsule {
            radius: r1,
            half_length: h1,
        },
        Shape::Capsule {
            radius: r2,
            half_length: h2,
        },
    ) = (a, b)
    else {
        return;
    };
    let (p1, q1) = segment(fa, *h1);
    let (p2, q2) = segment(fb, *h2);

    // Parallel capsules lying side by side touch along a line; report both
    // ends of the shared interval so they do not see-saw.
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let len1 = d1.length_squared();
    if len1 > 1e-12 && d1.cross(d2).length_squared() <= 1e-6 * len1 * d2.length_squared().max(1e-12) {
        let t0 = (p2 - p1).dot(d1) / len1;
        let t1 = (q2 - p1).dot(d1) / len1;
        let lo = t0.min(t1).max(0.0);
        let hi = t0.max(t1).min(1.0);
        if hi - lo > 1e-4 {
            for t in [lo, hi] {
                let on_a = p1 + d1 * t;
                let on_b = closest_on_segment(p2, q2, on_a);
                sphere_pair(on_a, *r1, on_b, *r2, out);
            }
            return;
        }
    }

    let (on_a, on_b) = closest_between_segments(p1, q1, p2, q2);
    sphere_pair(on_a, *r1, on_b, *r2, out);
}
