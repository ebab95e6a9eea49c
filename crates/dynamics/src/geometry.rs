//! # Geometry
//!
//! Shape descriptors, their world placement and bounding boxes. A geom that
//! is attached to a body has no pose of its own: its frame is read from the
//! body every time it is needed.

use glam::{Mat3, Quat, Vec3};

use crate::arena::{BodyHandle, SpaceHandle};
use crate::error::PhysicsError;
use crate::math::try_normalize;

/// Dispatch tag for the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    Sphere,
    Box,
    Capsule,
    Cylinder,
    Plane,
    Convex,
    Ray,
}

/// Convex polytope given by its vertices in local coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvexHull {
    points: Vec<Vec3>,
}

impl ConvexHull {
    /// Builds a hull from its vertex cloud. Interior points are harmless;
    /// only the support mapping of the cloud is ever used.
    pub fn new(points: Vec<Vec3>) -> Result<Self, PhysicsError> {
        if points.len() < 4 {
            return Err(PhysicsError::InvalidShape("convex hull needs at least four points"));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(PhysicsError::InvalidShape("convex hull point is not finite"));
        }
        Ok(Self { points })
    }

    /// Axis aligned box centered on the origin with the given half extents.
    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        let h = half_extents;
        let points = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Vertex furthest along `dir`.
    #[must_use]
    pub fn support(&self, dir: Vec3) -> Vec3 {
        self.points
            .iter()
            .copied()
            .fold((f32::NEG_INFINITY, Vec3::ZERO), |(best, at), p| {
                let d = p.dot(dir);
                if d > best {
                    (d, p)
                } else {
                    (best, at)
                }
            })
            .1
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    /// Segment along local Z of length `2 * half_length`, swept by `radius`.
    Capsule { radius: f32, half_length: f32 },
    /// Flat-capped cylinder along local Z.
    Cylinder { radius: f32, half_length: f32 },
    /// Half-space `normal . p <= offset` in world coordinates. Planes are
    /// never placed and never attached to a body.
    Plane { normal: Vec3, offset: f32 },
    Convex(ConvexHull),
    /// Starts at the geom position and points along local +Z.
    Ray { length: f32 },
}

impl Shape {
    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    #[must_use]
    pub fn capsule(radius: f32, half_length: f32) -> Self {
        Self::Capsule {
            radius,
            half_length,
        }
    }

    #[must_use]
    pub fn cylinder(radius: f32, half_length: f32) -> Self {
        Self::Cylinder {
            radius,
            half_length,
        }
    }

    #[must_use]
    pub fn plane(normal: Vec3, offset: f32) -> Self {
        Self::Plane { normal, offset }
    }

    #[must_use]
    pub fn ray(length: f32) -> Self {
        Self::Ray { length }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Sphere { .. } => ShapeKind::Sphere,
            Self::Box { .. } => ShapeKind::Box,
            Self::Capsule { .. } => ShapeKind::Capsule,
            Self::Cylinder { .. } => ShapeKind::Cylinder,
            Self::Plane { .. } => ShapeKind::Plane,
            Self::Convex(_) => ShapeKind::Convex,
            Self::Ray { .. } => ShapeKind::Ray,
        }
    }

    /// Whether the shape has a pose of its own.
    #[must_use]
    pub fn is_placeable(&self) -> bool {
        !matches!(self, Self::Plane { .. })
    }

    /// Checks dimensions and normalises plane equations.
    pub(crate) fn validated(self) -> Result<Self, PhysicsError> {
        let positive = |v: f32| v > 0.0 && v.is_finite();
        let non_negative = |v: f32| v >= 0.0 && v.is_finite();
        match self {
            Self::Sphere { radius } if !positive(radius) => {
                Err(PhysicsError::InvalidShape("sphere radius must be positive"))
            }
            Self::Box { half_extents } if !(half_extents.min_element() > 0.0 && half_extents.is_finite()) => {
                Err(PhysicsError::InvalidShape("box extents must be positive"))
            }
            Self::Capsule {
                radius,
                half_length,
            }
            | Self::Cylinder {
                radius,
                half_length,
            } if !positive(radius) || !non_negative(half_length) => {
                Err(PhysicsError::InvalidShape("radius and length must be positive"))
            }
            Self::Ray { length } if !positive(length) => {
                Err(PhysicsError::InvalidShape("ray length must be positive"))
            }
            Self::Plane { normal, offset } => {
                let len = normal.length();
                let unit = try_normalize(normal).ok_or(PhysicsError::ZeroAxis)?;
                Ok(Self::Plane {
                    normal: unit,
                    offset: offset / len,
                })
            }
            other => Ok(other),
        }
    }
}

/// World placement of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec3,
    pub rotation: Mat3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
        }
    }
}

impl Frame {
    #[must_use]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            rotation: Mat3::from_quat(orientation),
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Mat3::IDENTITY,
        }
    }

    #[must_use]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    #[must_use]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.transpose() * (world - self.position)
    }

    /// Local axis `i` in world coordinates.
    #[must_use]
    pub fn axis(&self, i: usize) -> Vec3 {
        self.rotation.col(i)
    }
}

/// Axis aligned bounding box. Infinite extents are allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Closed-interval overlap test; touching boxes overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Bounds of `shape` placed at `frame`.
    #[must_use]
    pub fn of_shape(shape: &Shape, frame: &Frame) -> Aabb {
        let c = frame.position;
        match shape {
            Shape::Sphere { radius } => Aabb::from_center(c, Vec3::splat(*radius)),
            Shape::Box { half_extents } => {
                let abs = Mat3::from_cols(
                    frame.rotation.x_axis.abs(),
                    frame.rotation.y_axis.abs(),
                    frame.rotation.z_axis.abs(),
                );
                Aabb::from_center(c, abs * *half_extents)
            }
            Shape::Capsule {
                radius,
                half_length,
            } => {
                let axis = frame.axis(2);
                Aabb::from_center(c, axis.abs() * *half_length + Vec3::splat(*radius))
            }
            Shape::Cylinder {
                radius,
                half_length,
            } => {
                let a = frame.axis(2);
                // disc extent along x is |a x e_x| = sqrt(a.y^2 + a.z^2)
                let radial = Vec3::new(
                    a.y.hypot(a.z),
                    a.x.hypot(a.z),
                    a.x.hypot(a.y),
                );
                let half = a.abs() * *half_length + radial * *radius;
                Aabb::from_center(c, half)
            }
            Shape::Plane { normal, offset } => plane_bounds(*normal, *offset),
            Shape::Convex(hull) => {
                let mut min = Vec3::splat(f32::INFINITY);
                let mut max = Vec3::splat(f32::NEG_INFINITY);
                for p in hull.points() {
                    let w = frame.to_world(*p);
                    min = min.min(w);
                    max = max.max(w);
                }
                Aabb { min, max }
            }
            Shape::Ray { length } => {
                let end = c + frame.axis(2) * *length;
                Aabb {
                    min: c.min(end),
                    max: c.max(end),
                }
            }
        }
    }
}

/// Planes are unbounded unless their normal is axis aligned, in which case
/// one side of the box is the plane itself.
fn plane_bounds(normal: Vec3, offset: f32) -> Aabb {
    let mut min = Vec3::splat(f32::NEG_INFINITY);
    let mut max = Vec3::splat(f32::INFINITY);
    for i in 0..3 {
        let others = (0..3).filter(|&j| j != i).all(|j| normal[j] == 0.0);
        if others {
            if normal[i] == 1.0 {
                max[i] = offset;
            } else if normal[i] == -1.0 {
                min[i] = -offset;
            }
        }
    }
    Aabb { min, max }
}

/// Collision geometry, optionally attached to a body.
#[derive(Debug, Clone)]
pub struct Geom {
    pub(crate) shape: Shape,
    pub(crate) body: Option<BodyHandle>,
    pub(crate) position: Vec3,
    pub(crate) orientation: Quat,
    pub(crate) space: Option<SpaceHandle>,
    pub(crate) category_bits: u32,
    pub(crate) collide_bits: u32,
    pub(crate) enabled: bool,
    pub user_data: u64,
}

impl Geom {
    pub(crate) fn new(shape: Shape) -> Self {
        Self {
            shape,
            body: None,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            space: None,
            category_bits: u32::MAX,
            collide_bits: u32::MAX,
            enabled: true,
            user_data: 0,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    #[must_use]
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    #[must_use]
    pub fn space(&self) -> Option<SpaceHandle> {
        self.space
    }

    #[must_use]
    pub fn category_bits(&self) -> u32 {
        self.category_bits
    }

    #[must_use]
    pub fn collide_bits(&self) -> u32 {
        self.collide_bits
    }

    /// Which categories this geom belongs to.
    pub fn set_category_bits(&mut self, bits: u32) {
        self.category_bits = bits;
    }

    /// Which categories this geom is willing to collide with.
    pub fn set_collide_bits(&mut self, bits: u32) {
        self.collide_bits = bits;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether the category masks of two geoms allow them to touch.
    #[must_use]
    pub fn accepts(&self, other: &Geom) -> bool {
        (self.category_bits & other.collide_bits) != 0 || (other.category_bits & self.collide_bits) != 0
    }
}
