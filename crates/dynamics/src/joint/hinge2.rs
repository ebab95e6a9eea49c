use std::f32::consts::PI;

use glam::Vec3;

use super::{
    anchor1_world, anchor2_world, anchors_from_world, angular_rate, point_rows, JacobianRow,
    LimitMotor, RowContext,
};
use crate::body::Body;
use crate::error::PhysicsError;
use crate::math;

/// Two hinges in series, as in a steered and driven wheel.
///
/// Axis 1 is fixed to body 1 (steering, with stops and a motor), axis 2 is
/// fixed to body 2 (the wheel axle, motor only). The anchor is free to move
/// along axis 1 against a spring-damper set by the suspension ERP and CFM.
#[derive(Debug, Clone)]
pub struct Hinge2 {
    pub(crate) anchor1: Vec3,
    pub(crate) anchor2: Vec3,
    pub(crate) axis1: Vec3,
    pub(crate) axis2: Vec3,
    /// Cosine and sine of the rest angle between the axes.
    pub(crate) c0: f32,
    pub(crate) s0: f32,
    /// Reference frame in body 1 for measuring the steering angle.
    pub(crate) v1: Vec3,
    pub(crate) v2: Vec3,
    pub(crate) limot1: LimitMotor,
    pub(crate) limot2: LimitMotor,
    pub(crate) susp_erp: f32,
    pub(crate) susp_cfm: f32,
}

impl Hinge2 {
    pub(crate) fn new(erp: f32, cfm: f32) -> Self {
        Self {
            anchor1: Vec3::ZERO,
            anchor2: Vec3::ZERO,
            axis1: Vec3::Z,
            axis2: Vec3::Y,
            c0: 0.0,
            s0: 1.0,
            v1: Vec3::Y,
            v2: Vec3::NEG_X,
            limot1: LimitMotor::new(erp, cfm),
            limot2: LimitMotor::new(erp, cfm),
            susp_erp: erp,
            susp_cfm: cfm,
        }
    }

    #[must_use]
    pub fn limit_motors(&self) -> (&LimitMotor, &LimitMotor) {
        (&self.limot1, &self.limot2)
    }

    pub(crate) fn set_anchor(&mut self, b1: &Body, b2: &Body, anchor: Vec3) {
        (self.anchor1, self.anchor2) = anchors_from_world(b1, Some(b2), anchor);
    }

    pub(crate) fn anchors(&self, b1: &Body, b2: &Body) -> (Vec3, Vec3) {
        (anchor1_world(b1, self.anchor1), anchor2_world(Some(b2), self.anchor2))
    }

    pub(crate) fn set_axis1(&mut self, b1: &Body, b2: &Body, axis: Vec3) -> Result<(), PhysicsError> {
        let axis = math::try_normalize(axis).ok_or(PhysicsError::ZeroAxis)?;
        self.axis1 = b1.vector_from_world(axis);
        self.record_rest(b1, b2);
        Ok(())
    }

    pub(crate) fn set_axis2(&mut self, b1: &Body, b2: &Body, axis: Vec3) -> Result<(), PhysicsError> {
        let axis = math::try_normalize(axis).ok_or(PhysicsError::ZeroAxis)?;
        self.axis2 = b2.vector_from_world(axis);
        self.record_rest(b1, b2);
        Ok(())
    }

    pub(crate) fn axes(&self, b1: &Body, b2: &Body) -> (Vec3, Vec3) {
        (b1.vector_to_world(self.axis1), b2.vector_to_world(self.axis2))
    }

    /// Stores the current axis separation as the rest angle and rebuilds the
    /// steering reference frame.
    fn record_rest(&mut self, b1: &Body, b2: &Body) {
        let (ax1, ax2) = self.axes(b1, b2);
        self.s0 = ax1.cross(ax2).length();
        self.c0 = ax1.dot(ax2);

        if ax1 == ax2 {
            return;
        }
        let Some(perp) = math::try_normalize(ax2 - ax1.dot(ax2) * ax1) else {
            return;
        };
        self.v1 = b1.vector_from_world(perp);
        self.v2 = b1.vector_from_world(ax1.cross(perp));
    }

    /// Steering angle: rotation of axis 2 about axis 1, seen from body 1.
    pub(crate) fn angle1(&self, b1: &Body, b2: &Body) -> f32 {
        let a = b1.vector_from_world(b2.vector_to_world(self.axis2));
        -a.dot(self.v2).atan2(a.dot(self.v1))
    }

    pub(crate) fn angle1_rate(&self, b1: &Body, b2: &Body) -> f32 {
        angular_rate(b1, Some(b2), self.axes(b1, b2).0)
    }

    pub(crate) fn angle2_rate(&self, b1: &Body, b2: &Body) -> f32 {
        angular_rate(b1, Some(b2), self.axes(b1, b2).1)
    }

    pub(crate) fn rows(&mut self, ctx: &mut RowContext<'_>, out: &mut Vec<JacobianRow>) {
        let Some(b2) = ctx.body2 else {
            return;
        };
        let (ax1, ax2) = self.axes(ctx.body1, b2);
        let cross = ax1.cross(ax2);
        let s = cross.length();
        let c = ax1.dot(ax2);
        let k = ctx.k();

        let (p, q) = math::plane_space(ax1);
        let first = out.len();
        point_rows(
            ctx,
            self.anchor1,
            self.anchor2,
            [ax1, p, q],
            [ctx.fps * self.susp_erp, k, k],
            ctx.cfm,
            out,
        );
        out[first].cfm = self.susp_cfm;

        // keeps the angle between the axes at its rest value
        let hinge = math::try_normalize(cross).unwrap_or(p);
        let mut row = JacobianRow::angular(hinge, true, ctx.cfm);
        row.rhs = k * (self.c0 * s - self.s0 * c);
        out.push(row);

        let angle = self.angle1(ctx.body1, b2);
        self.limot1.test(angle, PI);
        self.limot1.add_row(ctx, ax1, true, out);

        self.limot2.limit = super::LimitState::Free;
        self.limot2.add_row(ctx, ax2, true, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::tests::{body_at, context};
    use crate::joint::LimitParam;
    use glam::Quat;

    fn wheel() -> (Body, Body, Hinge2) {
        let chassis = body_at(Vec3::ZERO);
        let wheel = body_at(Vec3::new(1.0, 0.0, 0.0));
        let mut joint = Hinge2::new(0.2, 1e-5);
        joint.set_anchor(&chassis, &wheel, wheel.position());
        joint.set_axis1(&chassis, &wheel, Vec3::Y).unwrap();
        joint.set_axis2(&chassis, &wheel, Vec3::X).unwrap();
        (chassis, wheel, joint)
    }

    #[test]
    fn rest_pose_has_no_error() {
        let (chassis, wheel, mut joint) = wheel();
        assert!(joint.angle1(&chassis, &wheel).abs() < 1e-6);
        let mut ctx = context(&chassis, Some(&wheel));
        let mut rows = Vec::new();
        joint.rows(&mut ctx, &mut rows);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.rhs.abs() < 1e-6));
        assert_eq!(rows[0].j1l, Vec3::Y, "suspension row runs along axis 1");
        assert_eq!(rows[0].cfm, joint.susp_cfm);
    }

    #[test]
    fn steering_angle_tracks_the_wheel() {
        let (chassis, mut wheel, joint) = wheel();
        wheel.set_orientation(Quat::from_rotation_y(0.3));
        let angle = joint.angle1(&chassis, &wheel);
        println!("steering angle {angle}");
        assert!((angle.abs() - 0.3).abs() < 1e-4);
    }

    #[test]
    fn motors_add_rows() {
        let (chassis, wheel, mut joint) = wheel();
        joint.limot1.set(LimitParam::FMax, 1.0);
        joint.limot2.set(LimitParam::FMax, 1.0);
        joint.limot2.set(LimitParam::Vel, 4.0);
        let mut ctx = context(&chassis, Some(&wheel));
        let mut rows = Vec::new();
        joint.rows(&mut ctx, &mut rows);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[5].j1a, Vec3::X);
        assert_eq!(rows[5].rhs, 4.0);
    }

    #[test]
    fn one_body_contributes_nothing() {
        let chassis = body_at(Vec3::ZERO);
        let mut joint = Hinge2::new(0.2, 1e-5);
        let mut ctx = context(&chassis, None);
        let mut rows = Vec::new();
        joint.rows(&mut ctx, &mut rows);
        assert!(rows.is_empty());
    }
}
