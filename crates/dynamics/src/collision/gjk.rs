//! GJK intersection test followed by the expanding polytope algorithm.
//!
//! Both work on the Minkowski difference `A - B` through support mappings, so
//! any pair of convex solids can be collided. The EPA face closest to the
//! origin gives the penetration normal (pointing from A toward B) and depth.

use glam::Vec3;

use super::ContactGeom;
use crate::geometry::{Frame, Shape};
use crate::math::{plane_space, try_normalize};

const MAX_ITERATIONS: usize = 64;
const EPA_TOLERANCE: f32 = 1e-4;

/// Support mapping of a convex solid in world coordinates.
pub trait Support {
    /// Furthest point of the solid along `dir`.
    fn support(&self, dir: Vec3) -> Vec3;
    /// Any interior point.
    fn center(&self) -> Vec3;
}

/// A support-mapped shape placed in the world.
pub(crate) struct Placed<'a> {
    pub shape: &'a Shape,
    pub frame: &'a Frame,
}

fn unit_or_x(v: Vec3) -> Vec3 {
    try_normalize(v).unwrap_or(Vec3::X)
}

impl Support for Placed<'_> {
    fn support(&self, dir: Vec3) -> Vec3 {
        let local = self.frame.rotation.transpose() * dir;
        let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
        let point = match self.shape {
            Shape::Sphere { radius } => unit_or_x(local) * *radius,
            Shape::Box { half_extents } => Vec3::new(
                sign(local.x) * half_extents.x,
                sign(local.y) * half_extents.y,
                sign(local.z) * half_extents.z,
            ),
            Shape::Capsule {
                radius,
                half_length,
            } => Vec3::new(0.0, 0.0, sign(local.z) * half_length) + unit_or_x(local) * *radius,
            Shape::Cylinder {
                radius,
                half_length,
            } => {
                let radial = Vec3::new(local.x, local.y, 0.0);
                let rim = try_normalize(radial).map_or(Vec3::ZERO, |r| r * *radius);
                rim + Vec3::new(0.0, 0.0, sign(local.z) * half_length)
            }
            Shape::Convex(hull) => hull.support(local),
            Shape::Plane { .. } | Shape::Ray { .. } => Vec3::ZERO,
        };
        self.frame.to_world(point)
    }

    fn center(&self) -> Vec3 {
        self.frame.position
    }
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    /// Point of the Minkowski difference.
    w: Vec3,
    /// Contributing point on A; the point on B is `a - w`.
    a: Vec3,
}

fn minkowski(a: &impl Support, b: &impl Support, dir: Vec3) -> Vertex {
    let pa = a.support(dir);
    let pb = b.support(-dir);
    Vertex { w: pa - pb, a: pa }
}

/// Simplex for GJK, newest point last.
struct Simplex {
    points: Vec<Vertex>,
}

impl Simplex {
    fn contains_origin(&mut self, dir: &mut Vec3) -> bool {
        match self.points.len() {
            2 => self.line_case(dir),
            3 => self.triangle_case(dir),
            4 => self.tetrahedron_case(dir),
            _ => false,
        }
    }

    fn line_case(&mut self, dir: &mut Vec3) -> bool {
        let a = self.points[1].w;
        let b = self.points[0].w;
        let ab = b - a;
        let ao = -a;
        if ab.dot(ao) > 0.0 {
            *dir = ab.cross(ao).cross(ab);
            if dir.length_squared() < 1e-12 {
                // origin on the segment: leave the line sideways
                *dir = plane_space(unit_or_x(ab)).0;
            }
        } else {
            self.points.remove(0);
            *dir = ao;
        }
        false
    }

    fn triangle_case(&mut self, dir: &mut Vec3) -> bool {
        let (c, b, a) = (self.points[0], self.points[1], self.points[2]);
        let ab = b.w - a.w;
        let ac = c.w - a.w;
        let ao = -a.w;
        let abc = ab.cross(ac);

        if abc.cross(ac).dot(ao) > 0.0 {
            if ac.dot(ao) > 0.0 {
                self.points = vec![c, a];
                *dir = ac.cross(ao).cross(ac);
            } else {
                self.points = vec![b, a];
                return self.line_case(dir);
            }
        } else if ab.cross(abc).dot(ao) > 0.0 {
            self.points = vec![b, a];
            return self.line_case(dir);
        } else if abc.dot(ao) >= 0.0 {
            *dir = abc;
        } else {
            self.points = vec![b, c, a];
            *dir = -abc;
        }
        false
    }

    fn tetrahedron_case(&mut self, dir: &mut Vec3) -> bool {
        let (d, c, b, a) = (self.points[0], self.points[1], self.points[2], self.points[3]);
        let ab = b.w - a.w;
        let ac = c.w - a.w;
        let ad = d.w - a.w;
        let ao = -a.w;

        if ab.cross(ac).dot(ao) > 0.0 {
            self.points = vec![c, b, a];
            return self.triangle_case(dir);
        }
        if ac.cross(ad).dot(ao) > 0.0 {
            self.points = vec![d, c, a];
            return self.triangle_case(dir);
        }
        if ad.cross(ab).dot(ao) > 0.0 {
            self.points = vec![b, d, a];
            return self.triangle_case(dir);
        }
        true
    }
}

/// Returns the enclosing tetrahedron when the shapes intersect.
fn gjk(a: &impl Support, b: &impl Support) -> Option<Vec<Vertex>> {
    let mut dir = b.center() - a.center();
    if dir.length_squared() < 1e-12 {
        dir = Vec3::X;
    }
    let first = minkowski(a, b, dir);
    let mut simplex = Simplex {
        points: vec![first],
    };
    dir = -first.w;
    if dir.length_squared() < 1e-12 {
        dir = Vec3::X;
    }

    for _ in 0..MAX_ITERATIONS {
        let next = minkowski(a, b, dir);
        if next.w.dot(dir) < 0.0 {
            return None;
        }
        simplex.points.push(next);
        if simplex.contains_origin(&mut dir) {
            return Some(simplex.points);
        }
        if dir.length_squared() < 1e-12 {
            dir = Vec3::X;
        }
    }
    None
}

#[derive(Debug, Clone, Copy)]
struct Face {
    v: [usize; 3],
    normal: Vec3,
    dist: f32,
}

fn make_face(vertices: &[Vertex], interior: Vec3, mut v: [usize; 3]) -> Option<Face> {
    let (p0, p1, p2) = (vertices[v[0]].w, vertices[v[1]].w, vertices[v[2]].w);
    let mut normal = try_normalize((p1 - p0).cross(p2 - p0))?;
    if normal.dot(p0 - interior) < 0.0 {
        normal = -normal;
        v.swap(1, 2);
    }
    Some(Face {
        v,
        normal,
        dist: normal.dot(p0),
    })
}

/// Barycentric coordinates of `p` with respect to triangle `a b c`.
fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-12 {
        return Vec3::splat(1.0 / 3.0);
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - v - w, v, w)
}

fn epa(a: &impl Support, b: &impl Support, simplex: Vec<Vertex>) -> Option<ContactGeom> {
    let mut vertices = simplex;
    let interior = vertices.iter().map(|v| v.w).sum::<Vec3>() / vertices.len() as f32;
    let mut faces: Vec<Face> = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]]
        .into_iter()
        .filter_map(|v| make_face(&vertices, interior, v))
        .collect();

    let mut closest = *faces.iter().min_by(|x, y| x.dist.total_cmp(&y.dist))?;
    for _ in 0..MAX_ITERATIONS {
        closest = *faces.iter().min_by(|x, y| x.dist.total_cmp(&y.dist))?;
        let next = minkowski(a, b, closest.normal);
        if next.w.dot(closest.normal) - closest.dist < EPA_TOLERANCE {
            break;
        }
        let index = vertices.len();
        vertices.push(next);

        // remove every face the new point can see, remembering the horizon
        let mut horizon: Vec<(usize, usize)> = Vec::new();
        faces.retain(|face| {
            let visible = face.normal.dot(next.w - vertices[face.v[0]].w) > 1e-7;
            if visible {
                for k in 0..3 {
                    let edge = (face.v[k], face.v[(k + 1) % 3]);
                    if let Some(pos) = horizon.iter().position(|&(x, y)| x == edge.1 && y == edge.0) {
                        horizon.swap_remove(pos);
                    } else {
                        horizon.push(edge);
                    }
                }
            }
            !visible
        });
        if horizon.is_empty() {
            break;
        }
        for (x, y) in horizon {
            if let Some(face) = make_face(&vertices, interior, [x, y, index]) {
                faces.push(face);
            }
        }
        if faces.is_empty() {
            break;
        }
    }

    let projected = closest.normal * closest.dist;
    let [i, j, k] = closest.v;
    let lambda = barycentric(projected, vertices[i].w, vertices[j].w, vertices[k].w);
    let on_a = vertices[i].a * lambda.x + vertices[j].a * lambda.y + vertices[k].a * lambda.z;
    let position = on_a - projected * 0.5;
    Some(ContactGeom::new(position, closest.normal, closest.dist.max(0.0)))
}

/// Penetration contact between two convex solids, or `None` when apart.
///
/// Touching or degenerate configurations that EPA cannot expand report depth
/// zero along the line between the two centers.
pub fn gjk_epa(a: &impl Support, b: &impl Support) -> Option<ContactGeom> {
    let simplex = gjk(a, b)?;
    epa(a, b, simplex).or_else(|| {
        let normal = unit_or_x(b.center() - a.center());
        Some(ContactGeom::new(
            (a.support(normal) + b.support(-normal)) * 0.5,
            normal,
            0.0,
        ))
    })
}

pub(super) fn convex_convex(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let pa = Placed { shape: a, frame: fa };
    let pb = Placed { shape: b, frame: fb };
    if let Some(contact) = gjk_epa(&pa, &pb) {
        out.push(contact);
    }
}
