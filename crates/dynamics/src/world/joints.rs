use std::f32::consts::PI;

use glam::Vec3;
use tracing::{debug, warn};

use super::{stale, World};
use crate::arena::{Arena, BodyHandle, JointGroupHandle, JointHandle};
use crate::body::Body;
use crate::error::PhysicsError;
use crate::group::JointGroup;
use crate::joint::{
    Ball, Contact, ContactJoint, Fixed, Hinge, Hinge2, Joint, JointFeedback, JointKind, JointParam,
    JointType, LimitParam, Slider,
};

/// The attached bodies of `joint`; body 1 must be present.
fn attached<'a>(
    bodies: &'a Arena<Body>,
    joint: &Joint,
) -> Result<(&'a Body, Option<&'a Body>), PhysicsError> {
    let b1 = joint
        .body1
        .and_then(|h| bodies.get(h.0))
        .ok_or(PhysicsError::JointNotAttached)?;
    Ok((b1, joint.body2.and_then(|h| bodies.get(h.0))))
}

fn wrong_kind(expected: JointType, found: &JointKind) -> PhysicsError {
    PhysicsError::WrongJointKind {
        expected,
        found: found.joint_type(),
    }
}

fn two_bodies<'a>(b2: Option<&'a Body>) -> Result<&'a Body, PhysicsError> {
    b2.ok_or(PhysicsError::JointNeedsTwoBodies)
}

impl World {
    fn insert_joint(
        &mut self,
        kind: JointKind,
        group: Option<JointGroupHandle>,
    ) -> Result<JointHandle, PhysicsError> {
        if let Some(group) = group {
            self.group_ref(group)?;
        }
        let handle = JointHandle(self.joints.insert(Joint::new(kind, group)));
        if let Some(g) = group.and_then(|g| self.groups.get_mut(g.0)) {
            g.joints.push(handle);
        }
        Ok(handle)
    }

    pub fn create_ball(&mut self, group: Option<JointGroupHandle>) -> Result<JointHandle, PhysicsError> {
        self.insert_joint(JointKind::Ball(Ball::default()), group)
    }

    pub fn create_hinge(&mut self, group: Option<JointGroupHandle>) -> Result<JointHandle, PhysicsError> {
        let (erp, cfm) = (self.config.erp, self.config.cfm);
        self.insert_joint(JointKind::Hinge(Hinge::new(erp, cfm)), group)
    }

    pub fn create_slider(&mut self, group: Option<JointGroupHandle>) -> Result<JointHandle, PhysicsError> {
        let (erp, cfm) = (self.config.erp, self.config.cfm);
        self.insert_joint(JointKind::Slider(Slider::new(erp, cfm)), group)
    }

    pub fn create_hinge2(&mut self, group: Option<JointGroupHandle>) -> Result<JointHandle, PhysicsError> {
        let (erp, cfm) = (self.config.erp, self.config.cfm);
        self.insert_joint(JointKind::Hinge2(Hinge2::new(erp, cfm)), group)
    }

    pub fn create_fixed(&mut self, group: Option<JointGroupHandle>) -> Result<JointHandle, PhysicsError> {
        self.insert_joint(JointKind::Fixed(Fixed::default()), group)
    }

    pub fn create_contact(
        &mut self,
        group: Option<JointGroupHandle>,
        contact: &Contact,
    ) -> Result<JointHandle, PhysicsError> {
        self.insert_joint(JointKind::Contact(ContactJoint::new(*contact)), group)
    }

    pub fn destroy_joint(&mut self, handle: JointHandle) -> Result<(), PhysicsError> {
        let joint = self.joints.remove(handle.0).ok_or(stale("joint"))?;
        if let Some(group) = joint.group.and_then(|g| self.groups.get_mut(g.0)) {
            group.joints.retain(|&j| j != handle);
        }
        Ok(())
    }

    pub fn joint(&self, handle: JointHandle) -> Result<&Joint, PhysicsError> {
        self.joint_ref(handle)
    }

    /// Attaches a joint to up to two bodies, replacing any previous
    /// attachment. `None` stands for the static environment.
    pub fn attach(
        &mut self,
        handle: JointHandle,
        body1: Option<BodyHandle>,
        body2: Option<BodyHandle>,
    ) -> Result<(), PhysicsError> {
        let joint_type = self.joint_ref(handle)?.joint_type();
        for body in [body1, body2].into_iter().flatten() {
            self.body(body)?;
        }
        if body1.is_some() && body1 == body2 {
            return Err(PhysicsError::SameBody);
        }
        if joint_type == JointType::Hinge2 && body1.is_some() != body2.is_some() {
            return Err(PhysicsError::JointNeedsTwoBodies);
        }
        if let Some(joint) = self.joints.get_mut(handle.0) {
            joint.set_bodies(body1, body2);
        }
        Ok(())
    }

    /// Runs `f` on the joint variant with its attached bodies.
    fn with_joint<R>(
        &mut self,
        handle: JointHandle,
        f: impl FnOnce(&mut JointKind, &Body, Option<&Body>) -> Result<R, PhysicsError>,
    ) -> Result<R, PhysicsError> {
        let joint = self.joints.get_mut(handle.0).ok_or(stale("joint"))?;
        let (b1, b2) = attached(&self.bodies, joint)?;
        f(&mut joint.kind, b1, b2)
    }

    /// Swaps a pair of per-body values back into the order given to
    /// `attach`.
    fn in_attach_order(
        &self,
        handle: JointHandle,
        pair: (Vec3, Vec3),
    ) -> Result<(Vec3, Vec3), PhysicsError> {
        Ok(if self.joint_ref(handle)?.reversed {
            (pair.1, pair.0)
        } else {
            pair
        })
    }

    fn sign(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        Ok(self.joint_ref(handle)?.sign())
    }

    fn read_joint<R>(
        &self,
        handle: JointHandle,
        f: impl FnOnce(&JointKind, &Body, Option<&Body>) -> Result<R, PhysicsError>,
    ) -> Result<R, PhysicsError> {
        let joint = self.joint_ref(handle)?;
        let (b1, b2) = attached(&self.bodies, joint)?;
        f(&joint.kind, b1, b2)
    }

    // -- ball ---------------------------------------------------------------

    pub fn set_ball_anchor(&mut self, handle: JointHandle, anchor: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Ball(ball) => {
                ball.set_anchor(b1, b2, anchor);
                Ok(())
            }
            other => Err(wrong_kind(JointType::Ball, other)),
        })
    }

    /// The anchor in world coordinates as carried by each body. The two
    /// agree when the joint is satisfied.
    pub fn ball_anchors(&self, handle: JointHandle) -> Result<(Vec3, Vec3), PhysicsError> {
        let anchors = self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Ball(ball) => Ok(ball.anchors(b1, b2)),
            other => Err(wrong_kind(JointType::Ball, other)),
        })?;
        self.in_attach_order(handle, anchors)
    }

    // -- hinge --------------------------------------------------------------

    pub fn set_hinge_anchor(&mut self, handle: JointHandle, anchor: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge(hinge) => {
                hinge.set_anchor(b1, b2, anchor);
                Ok(())
            }
            other => Err(wrong_kind(JointType::Hinge, other)),
        })
    }

    pub fn set_hinge_axis(&mut self, handle: JointHandle, axis: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge(hinge) => hinge.set_axis(b1, b2, axis),
            other => Err(wrong_kind(JointType::Hinge, other)),
        })
    }

    pub fn hinge_anchors(&self, handle: JointHandle) -> Result<(Vec3, Vec3), PhysicsError> {
        let anchors = self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge(hinge) => Ok(hinge.anchors(b1, b2)),
            other => Err(wrong_kind(JointType::Hinge, other)),
        })?;
        self.in_attach_order(handle, anchors)
    }

    pub fn hinge_axis(&self, handle: JointHandle) -> Result<Vec3, PhysicsError> {
        self.read_joint(handle, |kind, b1, _| match kind {
            JointKind::Hinge(hinge) => Ok(hinge.axis(b1)),
            other => Err(wrong_kind(JointType::Hinge, other)),
        })
    }

    /// Rotation of the first attached body relative to the second about
    /// the hinge axis, in `(-pi, pi]`, zero at the pose where the axis was
    /// set. A joint attached as `(None, body)` reports the mirrored angle.
    pub fn hinge_angle(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        let angle = self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge(hinge) => Ok(hinge.angle(b1, b2)),
            other => Err(wrong_kind(JointType::Hinge, other)),
        })?;
        Ok(self.sign(handle)? * angle)
    }

    pub fn hinge_angle_rate(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        let rate = self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge(hinge) => Ok(hinge.angle_rate(b1, b2)),
            other => Err(wrong_kind(JointType::Hinge, other)),
        })?;
        Ok(self.sign(handle)? * rate)
    }

    /// Applies `torque` about the hinge axis to the first attached body and
    /// the reaction to the second.
    pub fn add_hinge_torque(&mut self, handle: JointHandle, torque: f32) -> Result<(), PhysicsError> {
        let axis = self.hinge_axis(handle)? * self.sign(handle)?;
        self.apply_pair(handle, Vec3::ZERO, axis * torque, [Vec3::ZERO; 2])
    }

    // -- slider -------------------------------------------------------------

    pub fn set_slider_axis(&mut self, handle: JointHandle, axis: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Slider(slider) => slider.set_axis(b1, b2, axis),
            other => Err(wrong_kind(JointType::Slider, other)),
        })
    }

    pub fn slider_axis(&self, handle: JointHandle) -> Result<Vec3, PhysicsError> {
        self.read_joint(handle, |kind, b1, _| match kind {
            JointKind::Slider(slider) => Ok(slider.axis(b1)),
            other => Err(wrong_kind(JointType::Slider, other)),
        })
    }

    /// Travel of the first attached body along the slider axis since the
    /// axis was set.
    pub fn slider_position(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        let position = self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Slider(slider) => Ok(slider.position(b1, b2)),
            other => Err(wrong_kind(JointType::Slider, other)),
        })?;
        Ok(self.sign(handle)? * position)
    }

    pub fn slider_position_rate(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        let rate = self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Slider(slider) => Ok(slider.position_rate(b1, b2)),
            other => Err(wrong_kind(JointType::Slider, other)),
        })?;
        Ok(self.sign(handle)? * rate)
    }

    /// Pushes the first attached body along the slider axis and the second
    /// the other way.
    pub fn add_slider_force(&mut self, handle: JointHandle, force: f32) -> Result<(), PhysicsError> {
        let axis = self.slider_axis(handle)? * (self.sign(handle)? * force);
        let decoupling = self.read_joint(handle, |_, b1, b2| {
            Ok(b2.map_or(Vec3::ZERO, |b2| {
                (0.5 * (b2.position - b1.position)).cross(axis)
            }))
        })?;
        self.apply_pair(handle, axis, Vec3::ZERO, [decoupling; 2])
    }

    // -- hinge2 -------------------------------------------------------------

    pub fn set_hinge2_anchor(&mut self, handle: JointHandle, anchor: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => {
                joint.set_anchor(b1, two_bodies(b2)?, anchor);
                Ok(())
            }
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    /// Sets the steering axis, fixed to body 1.
    pub fn set_hinge2_axis1(&mut self, handle: JointHandle, axis: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => joint.set_axis1(b1, two_bodies(b2)?, axis),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    /// Sets the axle, fixed to body 2.
    pub fn set_hinge2_axis2(&mut self, handle: JointHandle, axis: Vec3) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => joint.set_axis2(b1, two_bodies(b2)?, axis),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    pub fn hinge2_anchors(&self, handle: JointHandle) -> Result<(Vec3, Vec3), PhysicsError> {
        self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => Ok(joint.anchors(b1, two_bodies(b2)?)),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    pub fn hinge2_axes(&self, handle: JointHandle) -> Result<(Vec3, Vec3), PhysicsError> {
        self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => Ok(joint.axes(b1, two_bodies(b2)?)),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    pub fn hinge2_angle1(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => Ok(joint.angle1(b1, two_bodies(b2)?)),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    pub fn hinge2_angle1_rate(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => Ok(joint.angle1_rate(b1, two_bodies(b2)?)),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    pub fn hinge2_angle2_rate(&self, handle: JointHandle) -> Result<f32, PhysicsError> {
        self.read_joint(handle, |kind, b1, b2| match kind {
            JointKind::Hinge2(joint) => Ok(joint.angle2_rate(b1, two_bodies(b2)?)),
            other => Err(wrong_kind(JointType::Hinge2, other)),
        })
    }

    /// Torques about the steering axis and the axle.
    pub fn add_hinge2_torques(
        &mut self,
        handle: JointHandle,
        torque1: f32,
        torque2: f32,
    ) -> Result<(), PhysicsError> {
        let (ax1, ax2) = self.hinge2_axes(handle)?;
        self.apply_pair(handle, Vec3::ZERO, ax1 * torque1 + ax2 * torque2, [Vec3::ZERO; 2])
    }

    // -- fixed --------------------------------------------------------------

    /// Captures the current relative pose as the one to hold.
    pub fn set_fixed(&mut self, handle: JointHandle) -> Result<(), PhysicsError> {
        self.with_joint(handle, |kind, b1, b2| match kind {
            JointKind::Fixed(fixed) => {
                fixed.set(b1, b2);
                Ok(())
            }
            other => Err(wrong_kind(JointType::Fixed, other)),
        })
    }

    /// Adds `force`/`torque` to body 1 and their negation to body 2, plus an
    /// extra torque on each body.
    fn apply_pair(
        &mut self,
        handle: JointHandle,
        force: Vec3,
        torque: Vec3,
        extra_torque: [Vec3; 2],
    ) -> Result<(), PhysicsError> {
        let joint = self.joint_ref(handle)?;
        let (body1, body2) = (joint.body1, joint.body2);
        let body1 = body1.ok_or(PhysicsError::JointNotAttached)?;
        let b1 = self.body_mut(body1)?;
        b1.add_force(force);
        b1.add_torque(torque + extra_torque[0]);
        if let Some(body2) = body2 {
            let b2 = self.body_mut(body2)?;
            b2.add_force(-force);
            b2.add_torque(-torque + extra_torque[1]);
        }
        Ok(())
    }

    // -- parameters ---------------------------------------------------------

    /// Sets a joint parameter verbatim.
    pub fn set_joint_param(
        &mut self,
        handle: JointHandle,
        param: JointParam,
        value: f32,
    ) -> Result<(), PhysicsError> {
        self.joints
            .get_mut(handle.0)
            .ok_or(stale("joint"))?
            .set_param(param, value)
    }

    pub fn joint_param(&self, handle: JointHandle, param: JointParam) -> Result<f32, PhysicsError> {
        self.joint_ref(handle)?
            .param(param, self.config.erp, self.config.cfm)
    }

    /// Sets the stops of the first axis of a hinge, slider or hinge-2.
    ///
    /// A stop on the wrong side of zero (a low stop above zero or a high
    /// stop below zero) is not applied: that side is left unlimited. Angular
    /// stops must also lie strictly inside `(-pi, pi)`.
    pub fn set_limits(&mut self, handle: JointHandle, lo: f32, hi: f32) -> Result<(), PhysicsError> {
        let joint_type = self.joint_ref(handle)?.joint_type();
        let range = match joint_type {
            JointType::Hinge | JointType::Hinge2 => PI,
            JointType::Slider => f32::INFINITY,
            joint => {
                return Err(PhysicsError::ParamNotSupported {
                    joint,
                    param: JointParam::Axis1(LimitParam::LoStop),
                })
            }
        };
        let lo_applied = if lo > -range && lo <= 0.0 {
            lo
        } else {
            warn!(joint = %handle, lo, "low stop on the wrong side of zero, leaving it disabled");
            f32::NEG_INFINITY
        };
        let hi_applied = if (0.0..range).contains(&hi) {
            hi
        } else {
            warn!(joint = %handle, hi, "high stop on the wrong side of zero, leaving it disabled");
            f32::INFINITY
        };
        self.set_joint_param(handle, JointParam::Axis1(LimitParam::LoStop), lo_applied)?;
        self.set_joint_param(handle, JointParam::Axis1(LimitParam::HiStop), hi_applied)
    }

    /// Starts or stops recording the constraint forces of a joint.
    pub fn enable_feedback(&mut self, handle: JointHandle, enabled: bool) -> Result<(), PhysicsError> {
        let joint = self.joints.get_mut(handle.0).ok_or(stale("joint"))?;
        joint.feedback = enabled.then(JointFeedback::default);
        Ok(())
    }

    /// Forces applied during the last step, if feedback is enabled.
    pub fn feedback(&self, handle: JointHandle) -> Result<Option<JointFeedback>, PhysicsError> {
        Ok(self.joint_ref(handle)?.feedback)
    }

    // -- groups -------------------------------------------------------------

    pub fn create_joint_group(&mut self) -> JointGroupHandle {
        JointGroupHandle(self.groups.insert(JointGroup::default()))
    }

    pub fn joint_group(&self, handle: JointGroupHandle) -> Result<&JointGroup, PhysicsError> {
        self.group_ref(handle)
    }

    /// Destroys every joint in the group. The group stays usable.
    pub fn empty_joint_group(&mut self, handle: JointGroupHandle) -> Result<usize, PhysicsError> {
        let group = self.groups.get_mut(handle.0).ok_or(stale("joint group"))?;
        let members = std::mem::take(&mut group.joints);
        let count = members.len();
        for joint in members {
            self.joints.remove(joint.0);
        }
        debug!(group = %handle, count, "emptied joint group");
        Ok(count)
    }

    pub fn destroy_joint_group(&mut self, handle: JointGroupHandle) -> Result<(), PhysicsError> {
        self.empty_joint_group(handle)?;
        self.groups.remove(handle.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ContactGeom;
    use crate::joint::SurfaceParams;
    use glam::Quat;

    fn two_bodies_world() -> (World, BodyHandle, BodyHandle) {
        let mut world = World::default();
        let a = world.create_body();
        let b = world.create_body();
        world.body_mut(b).unwrap().set_position(Vec3::X);
        (world, a, b)
    }

    #[test]
    fn getters_need_an_attached_joint() {
        let mut world = World::default();
        let hinge = world.create_hinge(None).unwrap();
        assert_eq!(world.hinge_angle(hinge), Err(PhysicsError::JointNotAttached));
    }

    #[test]
    fn wrong_kind_is_reported() {
        let (mut world, a, b) = two_bodies_world();
        let ball = world.create_ball(None).unwrap();
        world.attach(ball, Some(a), Some(b)).unwrap();
        assert_eq!(
            world.set_hinge_axis(ball, Vec3::Z),
            Err(PhysicsError::WrongJointKind {
                expected: JointType::Hinge,
                found: JointType::Ball
            })
        );
    }

    #[test]
    fn hinge2_refuses_a_single_body() {
        let (mut world, a, b) = two_bodies_world();
        let joint = world.create_hinge2(None).unwrap();
        assert_eq!(world.attach(joint, Some(a), None), Err(PhysicsError::JointNeedsTwoBodies));
        assert_eq!(world.attach(joint, Some(a), Some(a)), Err(PhysicsError::SameBody));
        world.attach(joint, Some(a), Some(b)).unwrap();
    }

    #[test]
    fn limits_on_the_wrong_side_of_zero_stay_disabled() {
        // inherited behaviour: a low stop above zero is silently dropped
        let (mut world, a, _) = two_bodies_world();
        let hinge = world.create_hinge(None).unwrap();
        world.attach(hinge, Some(a), None).unwrap();
        world.set_limits(hinge, 0.3, 0.5).unwrap();
        let lo = world.joint_param(hinge, JointParam::Axis1(LimitParam::LoStop)).unwrap();
        let hi = world.joint_param(hinge, JointParam::Axis1(LimitParam::HiStop)).unwrap();
        assert_eq!(lo, f32::NEG_INFINITY);
        assert_eq!(hi, 0.5);

        world.set_limits(hinge, -0.2, 4.0).unwrap();
        let hi = world.joint_param(hinge, JointParam::Axis1(LimitParam::HiStop)).unwrap();
        assert_eq!(hi, f32::INFINITY, "angular stops beyond pi are dropped too");
    }

    #[test]
    fn emptying_a_group_invalidates_its_joints() {
        let (mut world, a, _) = two_bodies_world();
        let group = world.create_joint_group();
        let contact = Contact::new(
            ContactGeom::new(Vec3::ZERO, Vec3::NEG_Y, 0.01),
            SurfaceParams::default(),
        );
        let joint = world.create_contact(Some(group), &contact).unwrap();
        world.attach(joint, Some(a), None).unwrap();
        assert_eq!(world.empty_joint_group(group), Ok(1));
        assert!(matches!(world.joint(joint), Err(PhysicsError::StaleHandle { .. })));
        assert!(world.joint_group(group).unwrap().is_empty());
    }

    #[test]
    fn hinge_torque_acts_on_both_bodies() {
        let (mut world, a, b) = two_bodies_world();
        let hinge = world.create_hinge(None).unwrap();
        world.attach(hinge, Some(a), Some(b)).unwrap();
        world.set_hinge_axis(hinge, Vec3::Y).unwrap();
        world.add_hinge_torque(hinge, 2.0).unwrap();
        assert_eq!(world.body(a).unwrap().torque(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(world.body(b).unwrap().torque(), Vec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn reversed_attachment_mirrors_the_hinge() {
        let (mut world, _, b) = two_bodies_world();
        let forward = world.create_hinge(None).unwrap();
        world.attach(forward, Some(b), None).unwrap();
        world.set_hinge_axis(forward, Vec3::Z).unwrap();
        let reversed = world.create_hinge(None).unwrap();
        world.attach(reversed, None, Some(b)).unwrap();
        world.set_hinge_axis(reversed, Vec3::Z).unwrap();

        {
            let body = world.body_mut(b).unwrap();
            body.set_orientation(Quat::from_rotation_z(0.3));
            body.set_angular_velocity(Vec3::new(0.0, 0.0, 2.0));
        }
        let angle = world.hinge_angle(forward).unwrap();
        assert!((angle - 0.3).abs() < 1e-5, "forward angle {angle}");
        assert!((world.hinge_angle(reversed).unwrap() + angle).abs() < 1e-6);
        let rate = world.hinge_angle_rate(forward).unwrap();
        assert!((world.hinge_angle_rate(reversed).unwrap() + rate).abs() < 1e-6);

        world.add_hinge_torque(reversed, 1.5).unwrap();
        assert_eq!(world.body(b).unwrap().torque(), Vec3::new(0.0, 0.0, -1.5));
    }

    #[test]
    fn reversed_attachment_swaps_anchors_and_slider_travel() {
        let (mut world, _, b) = two_bodies_world();
        let ball = world.create_ball(None).unwrap();
        world.attach(ball, None, Some(b)).unwrap();
        world.set_ball_anchor(ball, Vec3::ZERO).unwrap();
        world.body_mut(b).unwrap().set_position(Vec3::new(1.0, 0.5, 0.0));
        let (first, second) = world.ball_anchors(ball).unwrap();
        assert_eq!(first, Vec3::ZERO, "first anchor belongs to the environment");
        assert!((second - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);

        let slider = world.create_slider(None).unwrap();
        world.attach(slider, None, Some(b)).unwrap();
        world.set_slider_axis(slider, Vec3::X).unwrap();
        world.body_mut(b).unwrap().set_position(Vec3::new(1.25, 0.5, 0.0));
        let position = world.slider_position(slider).unwrap();
        assert!((position + 0.25).abs() < 1e-6, "position {position}");

        world.add_slider_force(slider, 2.0).unwrap();
        assert_eq!(world.body(b).unwrap().force(), Vec3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn connected_bodies() {
        let (mut world, a, b) = two_bodies_world();
        assert_eq!(world.are_connected(a, b), Ok(false));
        let ball = world.create_ball(None).unwrap();
        world.attach(ball, Some(b), Some(a)).unwrap();
        assert_eq!(world.are_connected(a, b), Ok(true));
        world.destroy_joint(ball).unwrap();
        assert_eq!(world.are_connected(a, b), Ok(false));
    }
}
