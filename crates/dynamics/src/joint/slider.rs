use glam::{Quat, Vec3};

use super::{
    axes_from_world, orientation_rows, relative_rotation, JacobianRow, LimitMotor, RowContext,
};
use crate::body::Body;
use crate::error::PhysicsError;
use crate::math;

/// Translation along one axis, no relative rotation.
#[derive(Debug, Clone)]
pub struct Slider {
    pub(crate) axis1: Vec3,
    pub(crate) qrel: Quat,
    /// Body 1's origin in body 2 coordinates (or in world coordinates
    /// without a second body) at the time the axis was set.
    pub(crate) offset: Vec3,
    pub(crate) limot: LimitMotor,
}

impl Slider {
    pub(crate) fn new(erp: f32, cfm: f32) -> Self {
        Self {
            axis1: Vec3::Z,
            qrel: Quat::IDENTITY,
            offset: Vec3::ZERO,
            limot: LimitMotor::new(erp, cfm),
        }
    }

    #[must_use]
    pub fn limit_motor(&self) -> &LimitMotor {
        &self.limot
    }

    /// Sets the axis and makes the current pose the zero position.
    pub(crate) fn set_axis(
        &mut self,
        b1: &Body,
        b2: Option<&Body>,
        axis: Vec3,
    ) -> Result<(), PhysicsError> {
        (self.axis1, _) = axes_from_world(b1, b2, axis)?;
        self.qrel = relative_rotation(b1, b2);
        self.offset = match b2 {
            Some(b2) => b2.vector_from_world(b1.position - b2.position),
            None => b1.position,
        };
        Ok(())
    }

    pub(crate) fn axis(&self, b1: &Body) -> Vec3 {
        b1.vector_to_world(self.axis1)
    }

    pub(crate) fn position(&self, b1: &Body, b2: Option<&Body>) -> f32 {
        let q = match b2 {
            Some(b2) => b1.position - b2.vector_to_world(self.offset) - b2.position,
            None => b1.position - self.offset,
        };
        self.axis(b1).dot(q)
    }

    pub(crate) fn position_rate(&self, b1: &Body, b2: Option<&Body>) -> f32 {
        let axis = self.axis(b1);
        let rate = axis.dot(b1.linear_velocity);
        b2.map_or(rate, |b| rate - axis.dot(b.linear_velocity))
    }

    pub(crate) fn rows(&mut self, ctx: &mut RowContext<'_>, out: &mut Vec<JacobianRow>) {
        let k = ctx.k();
        orientation_rows(ctx, self.qrel, k, ctx.cfm, out);

        let ax1 = self.axis(ctx.body1);
        let (p, q) = math::plane_space(ax1);
        // with the rotation locked, w1 == w2, so the angular terms use their
        // average and split the lever arm between the two centers
        let (c, error) = match ctx.body2 {
            Some(b2) => {
                let c = b2.position - ctx.body1.position;
                (c, c + b2.vector_to_world(self.offset))
            }
            None => (Vec3::ZERO, self.offset - ctx.body1.position),
        };
        for dir in [p, q] {
            let mut row = JacobianRow::new(ctx.cfm);
            row.j1l = dir;
            if ctx.has_body2() {
                let lever = 0.5 * c.cross(dir);
                row.j1a = lever;
                row.j2a = lever;
                row.j2l = -dir;
            }
            row.rhs = k * dir.dot(error);
            out.push(row);
        }

        let position = self.position(ctx.body1, ctx.body2);
        self.limot.test(position, f32::INFINITY);
        self.limot.add_row(ctx, ax1, false, out);
    }
}
