//! Sphere against sphere, box, plane and capsule.

use glam::Vec3;

use super::{closest_on_segment, segment, sphere_pair, ContactGeom};
use crate::geometry::{Frame, Shape};

pub(super) fn sphere_sphere(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Shape::Sphere { radius: r1 }, Shape::Sphere { radius: r2 }) = (a, b) else {
        return;
    };
    sphere_pair(fa.position, *r1, fb.position, *r2, out);
}

pub(super) fn sphere_capsule(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (
        Shape::Sphere { radius },
        Shape::Capsule {
            radius: cap_radius,
            half_length,
        },
    ) = (a, b)
    else {
        return;
    };
    let (p, q) = segment(fb, *half_length);
    let nearest = closest_on_segment(p, q, fa.position);
    sphere_pair(fa.position, *radius, nearest, *cap_radius, out);
}

/// Plane half-space is `n . x <= d`; the normal from the sphere into the
/// plane solid is `-n`.
pub(super) fn sphere_plane(a: &Shape, fa: &Frame, b: &Shape, _fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Shape::Sphere { radius }, Shape::Plane { normal, offset }) = (a, b) else {
        return;
    };
    let depth = offset - normal.dot(fa.position) + radius;
    if depth < 0.0 {
        return;
    }
    out.push(ContactGeom::new(fa.position - *normal * *radius, -*normal, depth));
}

pub(super) fn sphere_box(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Shape::Sphere { radius }, Shape::Box { half_extents }) = (a, b) else {
        return;
    };
    let center = fb.to_local(fa.position);
    let clamped = center.clamp(-*half_extents, *half_extents);

    if clamped != center {
        // center outside the box: push along the closest feature
        let nearest = fb.to_world(clamped);
        let delta = nearest - fa.position;
        let dist = delta.length();
        if dist > *radius {
            return;
        }
        let normal = if dist > 1e-6 {
            delta / dist
        } else {
            (fb.position - fa.position).normalize_or_zero()
        };
        out.push(ContactGeom::new(nearest, normal, radius - dist));
        return;
    }

    // center inside: leave through the nearest face
    let gaps = *half_extents - center.abs();
    let mut axis = 0;
    for i in 1..3 {
        if gaps[i] < gaps[axis] {
            axis = i;
        }
    }
    let sign = if center[axis] < 0.0 { -1.0 } else { 1.0 };
    let face_normal = fb.axis(axis) * sign;
    out.push(ContactGeom::new(
        fa.position,
        -face_normal,
        radius + gaps[axis],
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn run(
        f: fn(&Shape, &Frame, &Shape, &Frame, &mut Vec<ContactGeom>),
        a: (&Shape, Frame),
        b: (&Shape, Frame),
    ) -> Vec<ContactGeom> {
        let mut out = Vec::new();
        f(a.0, &a.1, b.0, &b.1, &mut out);
        out
    }

    #[test]
    fn sphere_above_box_face() {
        let contacts = run(
            sphere_box,
            (&Shape::sphere(0.5), Frame::from_position(Vec3::new(0.0, 1.4, 0.0))),
            (&Shape::cuboid(Vec3::ONE), Frame::default()),
        );
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert!((c.normal - Vec3::NEG_Y).length() < 1e-5, "normal {:?}", c.normal);
        assert!((c.depth - 0.1).abs() < 1e-5);
    }

    #[test]
    fn sphere_inside_rotated_box() {
        let frame = Frame::new(Vec3::ZERO, Quat::from_rotation_y(0.3));
        let contacts = run(
            sphere_box,
            (&Shape::sphere(0.2), Frame::from_position(frame.axis(0) * 0.9)),
            (&Shape::cuboid(Vec3::ONE), frame),
        );
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert!((c.normal + frame.axis(0)).length() < 1e-4);
        assert!((c.depth - 0.3).abs() < 1e-4);
    }

    #[test]
    fn sphere_below_plane() {
        let contacts = run(
            sphere_plane,
            (&Shape::sphere(1.0), Frame::from_position(Vec3::new(3.0, 0.5, 0.0))),
            (&Shape::plane(Vec3::Y, 0.0), Frame::default()),
        );
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].normal, Vec3::NEG_Y);
        assert!((contacts[0].depth - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sphere_beside_capsule_body() {
        let contacts = run(
            sphere_capsule,
            (&Shape::sphere(0.5), Frame::from_position(Vec3::new(0.8, 0.0, 0.3))),
            (&Shape::capsule(0.5, 1.0), Frame::default()),
        );
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].normal - Vec3::NEG_X).length() < 1e-5);
        assert!((contacts[0].depth - 0.2).abs() < 1e-5);
    }
}
