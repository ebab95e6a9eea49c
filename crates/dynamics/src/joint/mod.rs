//! # Joints
//!
//! A joint removes degrees of freedom between two bodies, or between one body
//! and the static environment. Each step every active joint contributes a
//! handful of [`JacobianRow`]s describing the velocities it constrains and
//! how hard it may push; the solver turns those rows into impulses.
//!
//! Joints store their anchors and axes in body coordinates. When the second
//! body is absent the second anchor (or axis) is kept in world coordinates.
//!
//! Row construction follows one convention throughout: a row with Jacobian
//! `J` and right hand side `rhs` asks the solver for `J * v == rhs`, where
//! `v = (v1, w1, v2, w2)`.

mod ball;
mod contact;
mod fixed;
mod hinge;
mod hinge2;
mod limit;
mod slider;

pub use ball::Ball;
pub use contact::{Contact, ContactJoint, SurfaceParams};
pub use fixed::Fixed;
pub use hinge::Hinge;
pub use hinge2::Hinge2;
pub use limit::{LimitMotor, LimitState};
pub use slider::Slider;

use glam::{Quat, Vec3};

use crate::arena::{BodyHandle, JointGroupHandle};
use crate::body::Body;
use crate::error::PhysicsError;
use crate::math;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Discriminant of [`JointKind`], used in errors and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    Ball,
    Hinge,
    Slider,
    Hinge2,
    Fixed,
    Contact,
}

/// Parameters of a single limit/motor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LimitParam {
    LoStop,
    HiStop,
    /// Desired motor velocity.
    Vel,
    /// Maximum motor force or torque. Negative values are ignored.
    FMax,
    /// Fraction of `FMax` applied when powering away from a stop, in `[0, 1]`.
    FudgeFactor,
    Bounce,
    /// Constraint force mixing used when the axis is not at a stop.
    Cfm,
    StopErp,
    StopCfm,
}

/// Joint parameter selector for [`crate::World::set_joint_param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointParam {
    /// Limit/motor of the first (or only) axis.
    Axis1(LimitParam),
    /// Limit/motor of the second hinge-2 axis.
    Axis2(LimitParam),
    /// Error reduction of ball and fixed joints.
    Erp,
    /// Constraint force mixing of ball and fixed joints.
    Cfm,
    SuspensionErp,
    SuspensionCfm,
}

/// Constraint forces a joint applied during the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointFeedback {
    pub force1: Vec3,
    pub torque1: Vec3,
    pub force2: Vec3,
    pub torque2: Vec3,
}

/// Variant data of a joint.
#[derive(Debug, Clone)]
pub enum JointKind {
    Ball(Ball),
    Hinge(Hinge),
    Slider(Slider),
    Hinge2(Hinge2),
    Fixed(Fixed),
    Contact(ContactJoint),
}

impl JointKind {
    #[must_use]
    pub fn joint_type(&self) -> JointType {
        match self {
            Self::Ball(_) => JointType::Ball,
            Self::Hinge(_) => JointType::Hinge,
            Self::Slider(_) => JointType::Slider,
            Self::Hinge2(_) => JointType::Hinge2,
            Self::Fixed(_) => JointType::Fixed,
            Self::Contact(_) => JointType::Contact,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Joint {
    pub(crate) kind: JointKind,
    pub(crate) body1: Option<BodyHandle>,
    pub(crate) body2: Option<BodyHandle>,
    /// Set when the joint was attached as `(None, body)`: the body is then
    /// stored first, contact normals are flipped and the user-facing
    /// getters are mirrored.
    pub(crate) reversed: bool,
    pub(crate) group: Option<JointGroupHandle>,
    pub(crate) feedback: Option<JointFeedback>,
    pub user_data: u64,
}

impl Joint {
    pub(crate) fn new(kind: JointKind, group: Option<JointGroupHandle>) -> Self {
        Self {
            kind,
            body1: None,
            body2: None,
            reversed: false,
            group,
            feedback: None,
            user_data: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    #[must_use]
    pub fn joint_type(&self) -> JointType {
        self.kind.joint_type()
    }

    /// Attached bodies in the order they were given to `attach`.
    #[must_use]
    pub fn bodies(&self) -> (Option<BodyHandle>, Option<BodyHandle>) {
        if self.reversed {
            (self.body2, self.body1)
        } else {
            (self.body1, self.body2)
        }
    }

    #[must_use]
    pub fn group(&self) -> Option<JointGroupHandle> {
        self.group
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.body1.is_some()
    }

    pub(crate) fn connects(&self, body: BodyHandle) -> bool {
        self.body1 == Some(body) || self.body2 == Some(body)
    }

    /// Stores the bodies so that the first slot is filled whenever any body
    /// is attached.
    pub(crate) fn set_bodies(&mut self, body1: Option<BodyHandle>, body2: Option<BodyHandle>) {
        if body1.is_none() && body2.is_some() {
            self.body1 = body2;
            self.body2 = None;
            self.reversed = true;
        } else {
            self.body1 = body1;
            self.body2 = body2;
            self.reversed = false;
        }
    }

    /// `-1` when the bodies were swapped at attachment. Angles, positions,
    /// rates and added torques are reported in the caller's order.
    pub(crate) fn sign(&self) -> f32 {
        if self.reversed {
            -1.0
        } else {
            1.0
        }
    }

    /// Detaches the joint from both bodies. Anchors and axes are stored
    /// relative to the original pair, so the survivor cannot keep them.
    pub(crate) fn detach(&mut self) {
        self.set_bodies(None, None);
    }

    pub(crate) fn set_param(&mut self, param: JointParam, value: f32) -> Result<(), PhysicsError> {
        let joint = self.joint_type();
        let unsupported = PhysicsError::ParamNotSupported { joint, param };
        match (&mut self.kind, param) {
            (JointKind::Ball(b), JointParam::Erp) => b.erp = Some(value),
            (JointKind::Ball(b), JointParam::Cfm) => b.cfm = Some(value),
            (JointKind::Fixed(f), JointParam::Erp) => f.erp = Some(value),
            (JointKind::Fixed(f), JointParam::Cfm) => f.cfm = Some(value),
            (JointKind::Hinge(h), JointParam::Axis1(p)) => h.limot.set(p, value),
            (JointKind::Slider(s), JointParam::Axis1(p)) => s.limot.set(p, value),
            (JointKind::Hinge2(h), JointParam::Axis1(p)) => h.limot1.set(p, value),
            (JointKind::Hinge2(h), JointParam::Axis2(p)) => h.limot2.set(p, value),
            (JointKind::Hinge2(h), JointParam::SuspensionErp) => h.susp_erp = value,
            (JointKind::Hinge2(h), JointParam::SuspensionCfm) => h.susp_cfm = value,
            _ => return Err(unsupported),
        }
        Ok(())
    }

    pub(crate) fn param(&self, param: JointParam, erp: f32, cfm: f32) -> Result<f32, PhysicsError> {
        let joint = self.joint_type();
        let value = match (&self.kind, param) {
            (JointKind::Ball(b), JointParam::Erp) => b.erp.unwrap_or(erp),
            (JointKind::Ball(b), JointParam::Cfm) => b.cfm.unwrap_or(cfm),
            (JointKind::Fixed(f), JointParam::Erp) => f.erp.unwrap_or(erp),
            (JointKind::Fixed(f), JointParam::Cfm) => f.cfm.unwrap_or(cfm),
            (JointKind::Hinge(h), JointParam::Axis1(p)) => h.limot.get(p),
            (JointKind::Slider(s), JointParam::Axis1(p)) => s.limot.get(p),
            (JointKind::Hinge2(h), JointParam::Axis1(p)) => h.limot1.get(p),
            (JointKind::Hinge2(h), JointParam::Axis2(p)) => h.limot2.get(p),
            (JointKind::Hinge2(h), JointParam::SuspensionErp) => h.susp_erp,
            (JointKind::Hinge2(h), JointParam::SuspensionCfm) => h.susp_cfm,
            _ => return Err(PhysicsError::ParamNotSupported { joint, param }),
        };
        Ok(value)
    }

    /// Appends this joint's rows for the current configuration.
    pub(crate) fn rows(&mut self, ctx: &mut RowContext<'_>, out: &mut Vec<JacobianRow>) {
        match &mut self.kind {
            JointKind::Ball(j) => j.rows(ctx, out),
            JointKind::Hinge(j) => j.rows(ctx, out),
            JointKind::Slider(j) => j.rows(ctx, out),
            JointKind::Hinge2(j) => j.rows(ctx, out),
            JointKind::Fixed(j) => j.rows(ctx, out),
            JointKind::Contact(j) => j.rows(ctx, self.reversed, out),
        }
    }
}

/// One scalar velocity constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianRow {
    pub j1l: Vec3,
    pub j1a: Vec3,
    pub j2l: Vec3,
    pub j2a: Vec3,
    /// Desired value of `J * v`.
    pub rhs: f32,
    pub cfm: f32,
    /// Force bounds. With a friction index they are multiples of the
    /// referenced row's force instead.
    pub lo: f32,
    pub hi: f32,
    /// Offset of the normal row this friction row depends on, relative to the
    /// first row of the same joint.
    pub friction_index: Option<usize>,
}

impl JacobianRow {
    /// Unbounded row with no Jacobian entries.
    #[must_use]
    pub fn new(cfm: f32) -> Self {
        Self {
            j1l: Vec3::ZERO,
            j1a: Vec3::ZERO,
            j2l: Vec3::ZERO,
            j2a: Vec3::ZERO,
            rhs: 0.0,
            cfm,
            lo: f32::NEG_INFINITY,
            hi: f32::INFINITY,
            friction_index: None,
        }
    }

    /// Pure angular row: `w1 . axis - w2 . axis`.
    pub(crate) fn angular(axis: Vec3, two_bodies: bool, cfm: f32) -> Self {
        let mut row = Self::new(cfm);
        row.j1a = axis;
        if two_bodies {
            row.j2a = -axis;
        }
        row
    }

    /// `J * v` for the given body velocities.
    #[must_use]
    pub fn velocity(&self, v1: Vec3, w1: Vec3, v2: Vec3, w2: Vec3) -> f32 {
        self.j1l.dot(v1) + self.j1a.dot(w1) + self.j2l.dot(v2) + self.j2a.dot(w2)
    }
}

/// What a joint sees while building its rows.
pub(crate) struct RowContext<'a> {
    /// Inverse time step.
    pub fps: f32,
    pub erp: f32,
    pub cfm: f32,
    pub max_correcting_vel: f32,
    pub surface_layer: f32,
    pub body1: &'a Body,
    pub body2: Option<&'a Body>,
    /// Force and torque applied directly to each body this step, outside the
    /// solver (motors pushing against a stop).
    pub applied: [(Vec3, Vec3); 2],
}

impl RowContext<'_> {
    pub(crate) fn has_body2(&self) -> bool {
        self.body2.is_some()
    }

    /// Position correction gain for the global ERP.
    pub(crate) fn k(&self) -> f32 {
        self.fps * self.erp
    }
}

// ---------------------------------------------------------------------------
// Shared anchor and axis bookkeeping
// ---------------------------------------------------------------------------

/// World point `p` as `(body1 local, body2 local or world)`.
pub(crate) fn anchors_from_world(b1: &Body, b2: Option<&Body>, p: Vec3) -> (Vec3, Vec3) {
    let a2 = b2.map_or(p, |b| b.world_to_local(p));
    (b1.world_to_local(p), a2)
}

pub(crate) fn anchor1_world(b1: &Body, anchor1: Vec3) -> Vec3 {
    b1.local_to_world(anchor1)
}

pub(crate) fn anchor2_world(b2: Option<&Body>, anchor2: Vec3) -> Vec3 {
    b2.map_or(anchor2, |b| b.local_to_world(anchor2))
}

/// Normalised world axis as `(body1 local, body2 local or world)`.
pub(crate) fn axes_from_world(
    b1: &Body,
    b2: Option<&Body>,
    axis: Vec3,
) -> Result<(Vec3, Vec3), PhysicsError> {
    let axis = math::try_normalize(axis).ok_or(PhysicsError::ZeroAxis)?;
    let a2 = b2.map_or(axis, |b| b.vector_from_world(axis));
    Ok((b1.vector_from_world(axis), a2))
}

pub(crate) fn axis2_world(b2: Option<&Body>, axis2: Vec3) -> Vec3 {
    b2.map_or(axis2, |b| b.vector_to_world(axis2))
}

/// Rotation taking body 1's frame to body 2's frame, or to the world frame
/// when there is no second body.
pub(crate) fn relative_rotation(b1: &Body, b2: Option<&Body>) -> Quat {
    let q1 = b1.orientation.conjugate();
    b2.map_or(q1, |b| q1 * b.orientation)
}

/// Deviation of the current relative rotation from the reference `qrel`.
pub(crate) fn rotation_error(b1: &Body, b2: Option<&Body>, qrel: Quat) -> Quat {
    relative_rotation(b1, b2) * qrel.conjugate()
}

/// Signed rotation about `axis` (body 1 frame) contained in the relative
/// rotation `q`, in `(-pi, pi]`.
pub(crate) fn angle_about(q: Quat, axis: Vec3) -> f32 {
    use std::f32::consts::PI;
    let v = Vec3::new(q.x, q.y, q.z);
    let sin_half = v.length();
    let mut theta = if v.dot(axis) >= 0.0 {
        2.0 * sin_half.atan2(q.w)
    } else {
        2.0 * sin_half.atan2(-q.w)
    };
    if theta > PI {
        theta -= 2.0 * PI;
    }
    -theta
}

/// Rate of rotation of body 1 relative to body 2 about the world `axis`.
pub(crate) fn angular_rate(b1: &Body, b2: Option<&Body>, axis: Vec3) -> f32 {
    let rate = axis.dot(b1.angular_velocity);
    b2.map_or(rate, |b| rate - axis.dot(b.angular_velocity))
}

/// Three rows pinning the anchor points together, measured along the
/// orthonormal `dirs`. `gains[i]` scales the positional error along `dirs[i]`.
pub(crate) fn point_rows(
    ctx: &RowContext<'_>,
    anchor1: Vec3,
    anchor2: Vec3,
    dirs: [Vec3; 3],
    gains: [f32; 3],
    cfm: f32,
    out: &mut Vec<JacobianRow>,
) {
    let a1 = ctx.body1.orientation * anchor1;
    let p1 = ctx.body1.position + a1;
    let (a2, p2) = match ctx.body2 {
        Some(b2) => {
            let a2 = b2.orientation * anchor2;
            (a2, b2.position + a2)
        }
        None => (Vec3::ZERO, anchor2),
    };
    let error = p2 - p1;
    for (dir, gain) in dirs.into_iter().zip(gains) {
        let mut row = JacobianRow::new(cfm);
        row.j1l = dir;
        row.j1a = a1.cross(dir);
        if ctx.has_body2() {
            row.j2l = -dir;
            row.j2a = -a2.cross(dir);
        }
        row.rhs = gain * error.dot(dir);
        out.push(row);
    }
}

/// Three rows locking the relative orientation to `qrel`.
pub(crate) fn orientation_rows(
    ctx: &RowContext<'_>,
    qrel: Quat,
    k: f32,
    cfm: f32,
    out: &mut Vec<JacobianRow>,
) {
    let mut err = rotation_error(ctx.body1, ctx.body2, qrel);
    if err.w < 0.0 {
        err = -err;
    }
    let e = ctx.body1.orientation * Vec3::new(err.x, err.y, err.z);
    for (axis, e) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().zip(e.to_array()) {
        let mut row = JacobianRow::angular(axis, ctx.has_body2(), cfm);
        row.rhs = 2.0 * k * e;
        out.push(row);
    }
}
