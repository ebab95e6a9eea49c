use glam::Vec3;

use super::{anchor1_world, anchor2_world, anchors_from_world, point_rows, JacobianRow, RowContext};
use crate::body::Body;

/// Ball and socket: the two anchor points coincide, rotation is free.
#[derive(Debug, Clone, Default)]
pub struct Ball {
    pub(crate) anchor1: Vec3,
    pub(crate) anchor2: Vec3,
    /// Overrides of the world ERP and CFM.
    pub(crate) erp: Option<f32>,
    pub(crate) cfm: Option<f32>,
}

impl Ball {
    pub(crate) fn set_anchor(&mut self, b1: &Body, b2: Option<&Body>, anchor: Vec3) {
        (self.anchor1, self.anchor2) = anchors_from_world(b1, b2, anchor);
    }

    /// World positions of the anchor as seen from each body.
    pub(crate) fn anchors(&self, b1: &Body, b2: Option<&Body>) -> (Vec3, Vec3) {
        (anchor1_world(b1, self.anchor1), anchor2_world(b2, self.anchor2))
    }

    pub(crate) fn rows(&self, ctx: &RowContext<'_>, out: &mut Vec<JacobianRow>) {
        let k = ctx.fps * self.erp.unwrap_or(ctx.erp);
        let cfm = self.cfm.unwrap_or(ctx.cfm);
        point_rows(
            ctx,
            self.anchor1,
            self.anchor2,
            [Vec3::X, Vec3::Y, Vec3::Z],
            [k; 3],
            cfm,
            out,
        );
    }
}
