//! # Rigid Bodies
//!
//! A body carries its kinematic state, mass distribution and the force and
//! torque accumulated since the last step. Inverse mass and inverse inertia
//! are derived from [`Mass`] and only change through [`Body::set_mass`].

use glam::{Mat3, Quat, Vec3};

use crate::config::AutoDisable;
use crate::error::PhysicsError;
use crate::mass::Mass;

#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) position: Vec3,
    pub(crate) orientation: Quat,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    mass: Mass,
    inv_mass: f32,
    inv_inertia: Mat3,
    pub(crate) force: Vec3,
    pub(crate) torque: Vec3,
    pub(crate) enabled: bool,
    gravity_enabled: bool,
    finite_rotation: bool,
    pub(crate) auto_disable: AutoDisable,
    pub(crate) idle_steps: u32,
    pub user_data: u64,
}

impl Body {
    pub(crate) fn new(auto_disable: AutoDisable) -> Self {
        let mass = Mass::default();
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            inv_mass: 1.0 / mass.mass,
            inv_inertia: mass.inertia.inverse(),
            mass,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            enabled: true,
            gravity_enabled: true,
            finite_rotation: false,
            auto_disable,
            idle_steps: 0,
            user_data: 0,
        }
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Sets the orientation; the quaternion is normalised on the way in.
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = if orientation.length_squared() > 0.0 {
            orientation.normalize()
        } else {
            Quat::IDENTITY
        };
    }

    /// Body-to-world rotation matrix.
    #[must_use]
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_quat(self.orientation)
    }

    #[must_use]
    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }

    #[must_use]
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
    }

    #[must_use]
    pub fn mass(&self) -> &Mass {
        &self.mass
    }

    /// Replaces the mass distribution.
    ///
    /// The center of mass must coincide with the body origin, since the
    /// position of a body is its center of mass.
    pub fn set_mass(&mut self, mass: Mass) -> Result<(), PhysicsError> {
        mass.check()?;
        if mass.center.length() > 1e-4 {
            return Err(PhysicsError::MassNotCentered);
        }
        self.inv_mass = 1.0 / mass.mass;
        self.inv_inertia = mass.inertia.inverse();
        self.mass = mass;
        Ok(())
    }

    #[must_use]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Inertia tensor in world coordinates.
    #[must_use]
    pub fn world_inertia(&self) -> Mat3 {
        let r = self.rotation();
        r * self.mass.inertia * r.transpose()
    }

    /// Inverse inertia tensor in world coordinates.
    #[must_use]
    pub fn world_inv_inertia(&self) -> Mat3 {
        let r = self.rotation();
        r * self.inv_inertia * r.transpose()
    }

    #[must_use]
    pub fn force(&self) -> Vec3 {
        self.force
    }

    #[must_use]
    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Force given in body coordinates.
    pub fn add_relative_force(&mut self, force: Vec3) {
        self.force += self.orientation * force;
    }

    pub fn add_relative_torque(&mut self, torque: Vec3) {
        self.torque += self.orientation * torque;
    }

    /// World-frame force applied at a world-frame point.
    pub fn add_force_at_position(&mut self, force: Vec3, point: Vec3) {
        self.force += force;
        self.torque += (point - self.position).cross(force);
    }

    /// World-frame force applied at a point given in body coordinates.
    pub fn add_force_at_relative_position(&mut self, force: Vec3, point: Vec3) {
        self.force += force;
        self.torque += (self.orientation * point).cross(force);
    }

    pub fn set_force(&mut self, force: Vec3) {
        self.force = force;
    }

    pub fn set_torque(&mut self, torque: Vec3) {
        self.torque = torque;
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.idle_steps = 0;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[must_use]
    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    #[must_use]
    pub fn finite_rotation(&self) -> bool {
        self.finite_rotation
    }

    /// Selects the exact axis-angle orientation update.
    pub fn set_finite_rotation(&mut self, finite: bool) {
        self.finite_rotation = finite;
    }

    #[must_use]
    pub fn auto_disable(&self) -> &AutoDisable {
        &self.auto_disable
    }

    pub fn set_auto_disable(&mut self, settings: AutoDisable) {
        self.auto_disable = settings;
        self.idle_steps = 0;
    }

    /// Point in body coordinates to world coordinates.
    #[must_use]
    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        self.position + self.orientation * point
    }

    #[must_use]
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        self.orientation.conjugate() * (point - self.position)
    }

    #[must_use]
    pub fn vector_to_world(&self, v: Vec3) -> Vec3 {
        self.orientation * v
    }

    #[must_use]
    pub fn vector_from_world(&self, v: Vec3) -> Vec3 {
        self.orientation.conjugate() * v
    }

    /// Velocity of the material point currently at world position `point`.
    #[must_use]
    pub fn point_velocity(&self, point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.position)
    }

    /// Velocity of the material point at body coordinates `point`.
    #[must_use]
    pub fn relative_point_velocity(&self, point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(self.orientation * point)
    }

    /// Advances the idle counter and reports whether the body should sleep.
    pub(crate) fn tick_idle(&mut self) -> bool {
        let settings = self.auto_disable;
        if !settings.enabled {
            return false;
        }
        let lin = settings.linear_threshold;
        let ang = settings.angular_threshold;
        if self.linear_velocity.length_squared() > lin * lin
            || self.angular_velocity.length_squared() > ang * ang
        {
            self.idle_steps = 0;
            return false;
        }
        self.idle_steps += 1;
        self.idle_steps >= settings.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_center_mass_is_rejected() {
        let mut body = Body::new(AutoDisable::default());
        let mut mass = Mass::sphere(1.0, 1.0);
        mass.translate(Vec3::X);
        assert_eq!(body.set_mass(mass), Err(PhysicsError::MassNotCentered));
        assert_eq!(body.mass(), &Mass::default(), "failed set_mass must not mutate");
    }

    #[test]
    fn world_inertia_inverse_is_consistent() {
        let mut body = Body::new(AutoDisable::default());
        body.set_mass(Mass::cuboid(2.0, Vec3::new(1.0, 2.0, 3.0))).unwrap();
        body.set_orientation(Quat::from_euler(glam::EulerRot::XYZ, 0.3, -1.1, 0.5));
        let product = body.world_inertia() * body.world_inv_inertia();
        let error = (product - Mat3::IDENTITY).to_cols_array().iter().fold(0.0_f32, |a, v| a.max(v.abs()));
        assert!(error < 1e-4, "I * I^-1 deviates from identity by {error}");
    }

    #[test]
    fn force_at_position_produces_torque() {
        let mut body = Body::new(AutoDisable::default());
        body.add_force_at_position(Vec3::Y, Vec3::X);
        assert_eq!(body.force(), Vec3::Y);
        assert_eq!(body.torque(), Vec3::Z);
    }

    #[test]
    fn frame_conversions_round_trip() {
        let mut body = Body::new(AutoDisable::default());
        body.set_position(Vec3::new(1.0, 2.0, 3.0));
        body.set_orientation(Quat::from_rotation_y(0.8));
        let p = Vec3::new(-0.4, 0.9, 2.0);
        assert!((body.world_to_local(body.local_to_world(p)) - p).length() < 1e-5);
    }

    #[test]
    fn idle_counter_needs_consecutive_slow_steps() {
        let mut body = Body::new(AutoDisable {
            enabled: true,
            steps: 3,
            ..AutoDisable::default()
        });
        assert!(!body.tick_idle());
        assert!(!body.tick_idle());
        body.set_linear_velocity(Vec3::X);
        assert!(!body.tick_idle());
        body.set_linear_velocity(Vec3::ZERO);
        assert!(!body.tick_idle());
        assert!(!body.tick_idle());
        assert!(body.tick_idle());
    }
}
