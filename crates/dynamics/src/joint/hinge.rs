use std::f32::consts::PI;

use glam::{Quat, Vec3};

use super::{
    anchor1_world, anchor2_world, anchors_from_world, angle_about, angular_rate, axes_from_world,
    axis2_world, point_rows, relative_rotation, rotation_error, JacobianRow, LimitMotor,
    RowContext,
};
use crate::body::Body;
use crate::error::PhysicsError;
use crate::math;

/// Rotation about a single shared axis through a shared anchor.
#[derive(Debug, Clone)]
pub struct Hinge {
    pub(crate) anchor1: Vec3,
    pub(crate) anchor2: Vec3,
    pub(crate) axis1: Vec3,
    pub(crate) axis2: Vec3,
    /// Relative rotation at which the hinge angle is zero.
    pub(crate) qrel: Quat,
    pub(crate) limot: LimitMotor,
}

impl Hinge {
    pub(crate) fn new(erp: f32, cfm: f32) -> Self {
        Self {
            anchor1: Vec3::ZERO,
            anchor2: Vec3::ZERO,
            axis1: Vec3::Z,
            axis2: Vec3::Z,
            qrel: Quat::IDENTITY,
            limot: LimitMotor::new(erp, cfm),
        }
    }

    #[must_use]
    pub fn limit_motor(&self) -> &LimitMotor {
        &self.limot
    }

    pub(crate) fn set_anchor(&mut self, b1: &Body, b2: Option<&Body>, anchor: Vec3) {
        (self.anchor1, self.anchor2) = anchors_from_world(b1, b2, anchor);
    }

    /// Sets the axis and makes the current pose the zero angle.
    pub(crate) fn set_axis(
        &mut self,
        b1: &Body,
        b2: Option<&Body>,
        axis: Vec3,
    ) -> Result<(), PhysicsError> {
        (self.axis1, self.axis2) = axes_from_world(b1, b2, axis)?;
        self.qrel = relative_rotation(b1, b2);
        Ok(())
    }

    pub(crate) fn anchors(&self, b1: &Body, b2: Option<&Body>) -> (Vec3, Vec3) {
        (anchor1_world(b1, self.anchor1), anchor2_world(b2, self.anchor2))
    }

    pub(crate) fn axis(&self, b1: &Body) -> Vec3 {
        b1.vector_to_world(self.axis1)
    }

    pub(crate) fn angle(&self, b1: &Body, b2: Option<&Body>) -> f32 {
        angle_about(rotation_error(b1, b2, self.qrel), self.axis1)
    }

    pub(crate) fn angle_rate(&self, b1: &Body, b2: Option<&Body>) -> f32 {
        angular_rate(b1, b2, self.axis(b1))
    }

    pub(crate) fn rows(&mut self, ctx: &mut RowContext<'_>, out: &mut Vec<JacobianRow>) {
        let k = ctx.k();
        point_rows(
            ctx,
            self.anchor1,
            self.anchor2,
            [Vec3::X, Vec3::Y, Vec3::Z],
            [k; 3],
            ctx.cfm,
            out,
        );

        let ax1 = self.axis(ctx.body1);
        let ax2 = axis2_world(ctx.body2, self.axis2);
        let (p, q) = math::plane_space(ax1);
        let misalignment = ax1.cross(ax2);
        for dir in [p, q] {
            let mut row = JacobianRow::angular(dir, ctx.has_body2(), ctx.cfm);
            row.rhs = k * misalignment.dot(dir);
            out.push(row);
        }

        let angle = self.angle(ctx.body1, ctx.body2);
        self.limot.test(angle, PI);
        self.limot.add_row(ctx, ax1, true, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::tests::{body_at, context};
    use crate::joint::LimitParam;

    fn hinge_between(b1: &Body, b2: Option<&Body>) -> Hinge {
        let mut hinge = Hinge::new(0.2, 1e-5);
        hinge.set_anchor(b1, b2, Vec3::ZERO);
        hinge.set_axis(b1, b2, Vec3::Z).unwrap();
        hinge
    }

    #[test]
    fn zero_axis_is_rejected() {
        let b1 = body_at(Vec3::ZERO);
        let mut hinge = Hinge::new(0.2, 1e-5);
        assert_eq!(hinge.set_axis(&b1, None, Vec3::ZERO), Err(PhysicsError::ZeroAxis));
    }

    #[test]
    fn angle_follows_body_rotation() {
        let mut b1 = body_at(Vec3::ZERO);
        let b2 = body_at(Vec3::X);
        let hinge = hinge_between(&b1, Some(&b2));
        assert!(hinge.angle(&b1, Some(&b2)).abs() < 1e-6);

        b1.set_orientation(Quat::from_rotation_z(0.4));
        let angle = hinge.angle(&b1, Some(&b2));
        println!("hinge angle after rotating body 1 by 0.4: {angle}");
        assert!((angle - 0.4).abs() < 1e-4);

        b1.set_angular_velocity(Vec3::new(0.0, 0.0, 1.5));
        assert!((hinge.angle_rate(&b1, Some(&b2)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn aligned_hinge_has_no_angular_error() {
        let b1 = body_at(Vec3::ZERO);
        let mut hinge = hinge_between(&b1, None);
        let mut ctx = context(&b1, None);
        let mut rows = Vec::new();
        hinge.rows(&mut ctx, &mut rows);
        assert_eq!(rows.len(), 5, "no limit or motor row for a free hinge");
        assert!(rows.iter().all(|r| r.rhs.abs() < 1e-6));
    }

    #[test]
    fn limit_adds_a_sixth_row() {
        let mut b1 = body_at(Vec3::ZERO);
        let mut hinge = hinge_between(&b1, None);
        hinge.limot.set(LimitParam::LoStop, -0.2);
        hinge.limot.set(LimitParam::HiStop, 0.2);
        b1.set_orientation(Quat::from_rotation_z(0.3));
        let mut ctx = context(&b1, None);
        let mut rows = Vec::new();
        hinge.rows(&mut ctx, &mut rows);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5].hi, 0.0, "past the high stop the row may only push back");
        assert!(rows[5].rhs < 0.0);
    }
}
