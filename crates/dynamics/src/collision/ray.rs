//! Rays against sphere, box, plane and capsule.
//!
//! A ray reports at most its first hit. The depth is the distance from the
//! ray origin to the hit point, and the normal is the surface normal at the
//! hit oriented along the direction of travel, so it points from the ray
//! into the shape it entered.

use glam::Vec3;

use super::{segment, ContactGeom};
use crate::geometry::{Frame, Shape};

struct Ray {
    origin: Vec3,
    dir: Vec3,
    length: f32,
}

impl Ray {
    fn from_shape(shape: &Shape, frame: &Frame) -> Option<Self> {
        let Shape::Ray { length } = shape else {
            return None;
        };
        Some(Self {
            origin: frame.position,
            dir: frame.axis(2),
            length: *length,
        })
    }

    fn hit(&self, t: f32, surface_normal: Vec3, out: &mut Vec<ContactGeom>) {
        if !(0.0..=self.length).contains(&t) {
            return;
        }
        let normal = if surface_normal.dot(self.dir) < 0.0 {
            -surface_normal
        } else {
            surface_normal
        };
        out.push(ContactGeom::new(self.origin + self.dir * t, normal, t));
    }
}

/// Smallest non-negative parameter where the ray meets the sphere.
fn sphere_hit(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    let t = if near >= 0.0 { near } else { -b + root };
    (t >= 0.0).then_some(t)
}

pub(super) fn ray_sphere(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Some(ray), Shape::Sphere { radius }) = (Ray::from_shape(a, fa), b) else {
        return;
    };
    if let Some(t) = sphere_hit(ray.origin, ray.dir, fb.position, *radius) {
        let p = ray.origin + ray.dir * t;
        ray.hit(t, (p - fb.position) / *radius, out);
    }
}

pub(super) fn ray_plane(a: &Shape, fa: &Frame, b: &Shape, _fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Some(ray), Shape::Plane { normal, offset }) = (Ray::from_shape(a, fa), b) else {
        return;
    };
    let denom = normal.dot(ray.dir);
    if denom.abs() < 1e-9 {
        return;
    }
    let t = (offset - normal.dot(ray.origin)) / denom;
    ray.hit(t, *normal, out);
}

/// Slab test in the box frame.
pub(super) fn ray_box(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Some(ray), Shape::Box { half_extents }) = (Ray::from_shape(a, fa), b) else {
        return;
    };
    let origin = fb.to_local(ray.origin);
    let dir = fb.rotation.transpose() * ray.dir;

    let mut enter = f32::NEG_INFINITY;
    let mut exit = f32::INFINITY;
    let mut enter_axis = 0;
    let mut exit_axis = 0;
    for i in 0..3 {
        if dir[i].abs() < 1e-9 {
            if origin[i].abs() > half_extents[i] {
                return;
            }
            continue;
        }
        let t1 = (-half_extents[i] - origin[i]) / dir[i];
        let t2 = (half_extents[i] - origin[i]) / dir[i];
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if near > enter {
            enter = near;
            enter_axis = i;
        }
        if far < exit {
            exit = far;
            exit_axis = i;
        }
    }
    if enter > exit || exit < 0.0 {
        return;
    }
    let (t, axis) = if enter >= 0.0 { (enter, enter_axis) } else { (exit, exit_axis) };
    ray.hit(t, fb.axis(axis), out);
}

pub(super) fn ray_capsule(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (
        Some(ray),
        Shape::Capsule {
            radius,
            half_length,
        },
    ) = (Ray::from_shape(a, fa), b)
    else {
        return;
    };
    let (p, q) = segment(fb, *half_length);
    let axis = fb.axis(2);
    let inside = super::closest_on_segment(p, q, ray.origin).distance(ray.origin) < *radius;

    let mut candidates: Vec<f32> = [p, q]
        .into_iter()
        .filter_map(|c| sphere_hit(ray.origin, ray.dir, c, *radius))
        .collect();

    // infinite cylinder around the axis, restricted to the segment
    let m = ray.origin - fb.position;
    let d_perp = ray.dir - axis * ray.dir.dot(axis);
    let m_perp = m - axis * m.dot(axis);
    let qa = d_perp.length_squared();
    if qa > 1e-12 {
        let qb = m_perp.dot(d_perp);
        let qc = m_perp.length_squared() - radius * radius;
        let disc = qb * qb - qa * qc;
        if disc >= 0.0 {
            let root = disc.sqrt();
            for t in [(-qb - root) / qa, (-qb + root) / qa] {
                let along = (m + ray.dir * t).dot(axis);
                if t >= 0.0 && along.abs() <= *half_length {
                    candidates.push(t);
                }
            }
        }
    }

    // from outside the first surface crossing wins, from inside the last
    let pick = if inside {
        candidates.into_iter().fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.max(t))))
    } else {
        candidates.into_iter().fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))
    };
    if let Some(t) = pick {
        let hit = ray.origin + ray.dir * t;
        let nearest = super::closest_on_segment(p, q, hit);
        let normal = (hit - nearest).normalize_or_zero();
        ray.hit(t, normal, out);
    }
}
