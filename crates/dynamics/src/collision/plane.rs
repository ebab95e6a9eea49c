//! Solids against the plane half-space `n . x <= d`.
//!
//! Each test collects the candidate feature points of the solid that lie
//! below the plane. The normal always points from the solid into the plane.

use glam::Vec3;

use super::{segment, ContactGeom};
use crate::geometry::{Frame, Shape};
use crate::math::{plane_space, try_normalize};

fn push_below(points: impl IntoIterator<Item = Vec3>, normal: Vec3, offset: f32, out: &mut Vec<ContactGeom>) {
    for p in points {
        let depth = offset - normal.dot(p);
        if depth >= 0.0 {
            out.push(ContactGeom::new(p, -normal, depth));
        }
    }
}

pub(super) fn box_plane(a: &Shape, fa: &Frame, b: &Shape, _fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Shape::Box { half_extents }, Shape::Plane { normal, offset }) = (a, b) else {
        return;
    };
    let h = *half_extents;
    let corners = (0..8).map(|i| {
        fa.to_world(Vec3::new(
            if i & 1 == 0 { -h.x } else { h.x },
            if i & 2 == 0 { -h.y } else { h.y },
            if i & 4 == 0 { -h.z } else { h.z },
        ))
    });
    push_below(corners, *normal, *offset, out);
}

pub(super) fn capsule_plane(a: &Shape, fa: &Frame, b: &Shape, _fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (
        Shape::Capsule {
            radius,
            half_length,
        },
        Shape::Plane { normal, offset },
    ) = (a, b)
    else {
        return;
    };
    let (p, q) = segment(fa, *half_length);
    // each end cap is a sphere; its deepest point is one radius below
    push_below([p - *normal * *radius, q - *normal * *radius], *normal, *offset, out);
}

/// Samples four rim points on each cap, oriented so that one of them is the
/// deepest point of that cap.
pub(super) fn cylinder_plane(a: &Shape, fa: &Frame, b: &Shape, _fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (
        Shape::Cylinder {
            radius,
            half_length,
        },
        Shape::Plane { normal, offset },
    ) = (a, b)
    else {
        return;
    };
    let axis = fa.axis(2);
    let downhill = -*normal - axis * axis.dot(-*normal);
    let u = try_normalize(downhill).unwrap_or_else(|| plane_space(axis).0);
    let v = axis.cross(u);
    let (bottom, top) = segment(fa, *half_length);
    let rim = [u, v, -u, -v];
    let points = [bottom, top]
        .into_iter()
        .flat_map(|cap| rim.into_iter().map(move |dir| cap + dir * *radius));
    push_below(points, *normal, *offset, out);
}

pub(super) fn convex_plane(a: &Shape, fa: &Frame, b: &Shape, _fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Shape::Convex(hull), Shape::Plane { normal, offset }) = (a, b) else {
        return;
    };
    push_below(hull.points().iter().map(|p| fa.to_world(*p)), *normal, *offset, out);
}
