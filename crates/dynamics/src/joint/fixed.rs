use glam::{Quat, Vec3};

use super::{orientation_rows, relative_rotation, JacobianRow, RowContext};
use crate::body::Body;

/// Locks the relative position and orientation captured by `set`.
#[derive(Debug, Clone, Default)]
pub struct Fixed {
    /// Body 2's origin to body 1's origin in body 1 coordinates, or body
    /// 1's world position without a second body.
    pub(crate) offset: Vec3,
    pub(crate) qrel: Quat,
    pub(crate) erp: Option<f32>,
    pub(crate) cfm: Option<f32>,
}

impl Fixed {
    pub(crate) fn set(&mut self, b1: &Body, b2: Option<&Body>) {
        self.offset = match b2 {
            Some(b2) => b1.vector_from_world(b1.position - b2.position),
            None => b1.position,
        };
        self.qrel = relative_rotation(b1, b2);
    }

    pub(crate) fn rows(&self, ctx: &RowContext<'_>, out: &mut Vec<JacobianRow>) {
        let k = ctx.fps * self.erp.unwrap_or(ctx.erp);
        let cfm = self.cfm.unwrap_or(ctx.cfm);

        let b1 = ctx.body1;
        let ofs = b1.vector_to_world(self.offset);
        let error = match ctx.body2 {
            Some(b2) => b2.position + ofs - b1.position,
            None => self.offset - b1.position,
        };
        for (axis, e) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().zip(error.to_array()) {
            let mut row = JacobianRow::new(cfm);
            row.j1l = axis;
            if ctx.has_body2() {
                row.j1a = axis.cross(ofs);
                row.j2l = -axis;
            }
            row.rhs = k * e;
            out.push(row);
        }
        orientation_rows(ctx, self.qrel, k, cfm, out);
    }
}
