//! # Mass Properties
//!
//! Total mass, center of mass and inertia tensor about the body origin, with
//! constructors for the primitive shapes and the usual algebra for combining
//! them. Capsules and cylinders are aligned with the local Z axis.

use std::f32::consts::PI;

use glam::{Mat3, Vec3};

use crate::error::PhysicsError;
use crate::math::{cross_matrix, is_positive_definite, is_symmetric};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mass {
    pub mass: f32,
    /// Center of mass in body coordinates.
    pub center: Vec3,
    /// Inertia tensor about the body origin, in body coordinates.
    pub inertia: Mat3,
}

impl Default for Mass {
    /// Unit mass with identity inertia, the properties of a fresh body.
    fn default() -> Self {
        Self {
            mass: 1.0,
            center: Vec3::ZERO,
            inertia: Mat3::IDENTITY,
        }
    }
}

impl Mass {
    #[must_use]
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            center: Vec3::ZERO,
            inertia: Mat3::ZERO,
        }
    }

    /// Solid sphere of the given density.
    #[must_use]
    pub fn sphere(density: f32, radius: f32) -> Self {
        let mass = (4.0 / 3.0) * PI * radius.powi(3) * density;
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            center: Vec3::ZERO,
            inertia: Mat3::from_diagonal(Vec3::splat(i)),
        }
    }

    #[must_use]
    pub fn sphere_total(total: f32, radius: f32) -> Self {
        let mut m = Self::sphere(1.0, radius);
        m.adjust(total);
        m
    }

    /// Solid box; `lengths` are full side lengths, not half extents.
    #[must_use]
    pub fn cuboid(density: f32, lengths: Vec3) -> Self {
        let mass = lengths.x * lengths.y * lengths.z * density;
        let sq = lengths * lengths;
        Self {
            mass,
            center: Vec3::ZERO,
            inertia: Mat3::from_diagonal(
                Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0),
            ),
        }
    }

    #[must_use]
    pub fn cuboid_total(total: f32, lengths: Vec3) -> Self {
        let mut m = Self::cuboid(1.0, lengths);
        m.adjust(total);
        m
    }

    /// Capsule along Z; `length` excludes the hemispherical caps.
    #[must_use]
    pub fn capsule(density: f32, radius: f32, length: f32) -> Self {
        let r2 = radius * radius;
        let cylinder = PI * r2 * length * density;
        let caps = (4.0 / 3.0) * PI * r2 * radius * density;
        let transverse = cylinder * (0.25 * r2 + length * length / 12.0)
            + caps * (0.4 * r2 + 0.375 * radius * length + 0.25 * length * length);
        let axial = (cylinder * 0.5 + caps * 0.4) * r2;
        Self {
            mass: cylinder + caps,
            center: Vec3::ZERO,
            inertia: Mat3::from_diagonal(Vec3::new(transverse, transverse, axial)),
        }
    }

    #[must_use]
    pub fn capsule_total(total: f32, radius: f32, length: f32) -> Self {
        let mut m = Self::capsule(1.0, radius, length);
        m.adjust(total);
        m
    }

    /// Solid cylinder along Z.
    #[must_use]
    pub fn cylinder(density: f32, radius: f32, length: f32) -> Self {
        let r2 = radius * radius;
        let mass = PI * r2 * length * density;
        let transverse = mass * (0.25 * r2 + length * length / 12.0);
        Self {
            mass,
            center: Vec3::ZERO,
            inertia: Mat3::from_diagonal(Vec3::new(transverse, transverse, 0.5 * mass * r2)),
        }
    }

    #[must_use]
    pub fn cylinder_total(total: f32, radius: f32, length: f32) -> Self {
        let mut m = Self::cylinder(1.0, radius, length);
        m.adjust(total);
        m
    }

    /// Rescales to a new total mass, keeping the distribution.
    pub fn adjust(&mut self, new_mass: f32) {
        if self.mass > 0.0 {
            self.inertia *= new_mass / self.mass;
        }
        self.mass = new_mass;
    }

    /// Moves the mass distribution by `offset` in body coordinates.
    pub fn translate(&mut self, offset: Vec3) {
        let before = cross_matrix(self.center);
        let moved = self.center + offset;
        let after = cross_matrix(moved);
        // parallel axis theorem, expressed about the reference point
        self.inertia += (before * before - after * after) * self.mass;
        self.center = moved;
    }

    /// Rotates the mass distribution by `rotation` in body coordinates.
    pub fn rotate(&mut self, rotation: Mat3) {
        self.inertia = rotation * self.inertia * rotation.transpose();
        self.center = rotation * self.center;
    }

    /// Combines two distributions expressed about the same reference point.
    pub fn add(&mut self, other: &Mass) {
        let total = self.mass + other.mass;
        if total > 0.0 {
            self.center = (self.center * self.mass + other.center * other.mass) / total;
        }
        self.mass = total;
        self.inertia += other.inertia;
    }

    /// Inertia about the center of mass.
    #[must_use]
    pub fn central_inertia(&self) -> Mat3 {
        let c = cross_matrix(self.center);
        self.inertia + c * c * self.mass
    }

    /// Validates the distribution: positive finite mass and a symmetric
    /// positive-definite inertia about both the origin and the center.
    pub fn check(&self) -> Result<(), PhysicsError> {
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(PhysicsError::InvalidMass("mass must be positive and finite"));
        }
        let scale = self
            .inertia
            .to_cols_array()
            .iter()
            .fold(1.0_f32, |acc, v| acc.max(v.abs()));
        if !is_symmetric(self.inertia, 1e-4 * scale) {
            return Err(PhysicsError::InvalidMass("inertia tensor is not symmetric"));
        }
        if !is_positive_definite(self.inertia) || !is_positive_definite(self.central_inertia()) {
            return Err(PhysicsError::InvalidMass(
                "inertia tensor is not positive definite",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Mat3, b: Mat3) -> bool {
        (a - b).to_cols_array().iter().all(|d| d.abs() < 1e-4)
    }

    #[test]
    fn primitives_are_valid() {
        Mass::sphere(2.0, 0.5).check().unwrap();
        Mass::cuboid(1.0, Vec3::new(1.0, 2.0, 3.0)).check().unwrap();
        Mass::capsule(1.0, 0.3, 1.0).check().unwrap();
        Mass::cylinder(1.0, 0.3, 1.0).check().unwrap();
    }

    #[test]
    fn total_mass_constructors() {
        let m = Mass::cuboid_total(5.0, Vec3::new(1.0, 1.0, 1.0));
        assert!((m.mass - 5.0).abs() < 1e-6);
        assert!((m.inertia.x_axis.x - 5.0 / 6.0).abs() < 1e-5);
        let s = Mass::sphere_total(2.0, 1.0);
        assert!((s.inertia.y_axis.y - 0.8).abs() < 1e-5);
    }

    #[test]
    fn translate_and_back_is_identity() {
        let original = Mass::cuboid(1.0, Vec3::new(1.0, 2.0, 3.0));
        let mut m = original;
        m.translate(Vec3::new(0.5, -1.0, 2.0));
        assert!(m.center.length() > 0.0);
        m.check().unwrap();
        m.translate(Vec3::new(-0.5, 1.0, -2.0));
        assert!(approx(m.inertia, original.inertia));
        assert!(m.center.length() < 1e-6);
    }

    #[test]
    fn adding_two_halves_makes_the_whole() {
        let mut left = Mass::cuboid(1.0, Vec3::new(1.0, 1.0, 1.0));
        left.translate(Vec3::new(-0.5, 0.0, 0.0));
        let mut right = Mass::cuboid(1.0, Vec3::new(1.0, 1.0, 1.0));
        right.translate(Vec3::new(0.5, 0.0, 0.0));
        left.add(&right);
        let whole = Mass::cuboid(1.0, Vec3::new(2.0, 1.0, 1.0));
        assert!((left.mass - whole.mass).abs() < 1e-6);
        assert!(left.center.length() < 1e-6);
        assert!(approx(left.inertia, whole.inertia), "{:?} vs {:?}", left.inertia, whole.inertia);
    }

    #[test]
    fn rotation_preserves_trace() {
        let mut m = Mass::cuboid(1.0, Vec3::new(1.0, 2.0, 3.0));
        let trace = m.inertia.x_axis.x + m.inertia.y_axis.y + m.inertia.z_axis.z;
        m.rotate(Mat3::from_rotation_y(0.7));
        let rotated = m.inertia.x_axis.x + m.inertia.y_axis.y + m.inertia.z_axis.z;
        assert!((trace - rotated).abs() < 1e-4);
        m.check().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Mass::sphere(0.0, 1.0).check().is_err());
        let mut m = Mass::default();
        m.inertia.x_axis.x = -1.0;
        assert!(m.check().is_err());
    }
}
