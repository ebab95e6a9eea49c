//! # World
//!
//! The [`World`] owns every body, geom, joint, joint group and space and is
//! the only way to create or destroy them. Objects are addressed through
//! generation-checked handles: once an object is destroyed, every handle to
//! it fails with [`PhysicsError::StaleHandle`], even if its slot is reused.
//!
//! The methods are split by concern:
//! - this module: bodies, geoms and poses
//! - `collide`: spaces, broad-phase queries and contact generation
//! - `joints`: joint creation, configuration and joint groups
//! - `step`: island discovery, constraint solving and integration

mod collide;
mod joints;
mod step;

use glam::{Quat, Vec3};
use tracing::debug;

use crate::arena::{Arena, BodyHandle, GeomHandle, JointGroupHandle, JointHandle, SpaceHandle};
use crate::body::Body;
use crate::config::WorldConfig;
use crate::error::PhysicsError;
use crate::geometry::{Aabb, Frame, Geom, Shape};
use crate::group::JointGroup;
use crate::joint::Joint;
use crate::pose::{BodyPose, GeomPose};
use crate::space::{Member, Space};

#[derive(Debug, Default)]
pub struct World {
    config: WorldConfig,
    bodies: Arena<Body>,
    geoms: Arena<Geom>,
    joints: Arena<Joint>,
    groups: Arena<JointGroup>,
    spaces: Arena<Space>,
}

fn stale(kind: &'static str) -> PhysicsError {
    PhysicsError::StaleHandle { kind }
}

impl World {
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Global parameters. Auto-disable defaults only affect bodies created
    /// afterwards.
    pub fn config_mut(&mut self) -> &mut WorldConfig {
        &mut self.config
    }

    // -- bodies -------------------------------------------------------------

    pub fn create_body(&mut self) -> BodyHandle {
        BodyHandle(self.bodies.insert(Body::new(self.config.auto_disable)))
    }

    /// Destroys a body. Attached geoms stay where the body was and become
    /// static. Joints attached to it are detached from both of their bodies.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> Result<(), PhysicsError> {
        let body = self.bodies.remove(handle.0).ok_or(stale("body"))?;
        for (_, geom) in self.geoms.iter_mut() {
            if geom.body == Some(handle) {
                geom.body = None;
                geom.position = body.position;
                geom.orientation = body.orientation;
            }
        }
        for (_, joint) in self.joints.iter_mut() {
            if joint.connects(handle) {
                joint.detach();
            }
        }
        debug!(body = %handle, "destroyed body");
        Ok(())
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&Body, PhysicsError> {
        self.bodies.get(handle.0).ok_or(stale("body"))
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body, PhysicsError> {
        self.bodies.get_mut(handle.0).ok_or(stale("body"))
    }

    /// Live bodies in a stable order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter().map(|(index, body)| (BodyHandle(index), body))
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body_pose(&self, handle: BodyHandle) -> Result<BodyPose, PhysicsError> {
        let body = self.body(handle)?;
        Ok(BodyPose::new(body.position, body.orientation))
    }

    // -- geoms --------------------------------------------------------------

    /// Creates a static geom at the origin, optionally inside `space`.
    pub fn create_geom(
        &mut self,
        shape: Shape,
        space: Option<SpaceHandle>,
    ) -> Result<GeomHandle, PhysicsError> {
        let shape = shape.validated()?;
        if let Some(space) = space {
            if !self.spaces.contains(space.0) {
                return Err(stale("space"));
            }
        }
        let handle = GeomHandle(self.geoms.insert(Geom::new(shape)));
        if let Some(space) = space {
            self.space_add(space, handle)?;
        }
        Ok(handle)
    }

    pub fn destroy_geom(&mut self, handle: GeomHandle) -> Result<(), PhysicsError> {
        let geom = self.geoms.remove(handle.0).ok_or(stale("geom"))?;
        if let Some(space) = geom.space.and_then(|s| self.spaces.get_mut(s.0)) {
            space.remove_member(Member::Geom(handle));
        }
        Ok(())
    }

    pub fn geom(&self, handle: GeomHandle) -> Result<&Geom, PhysicsError> {
        self.geoms.get(handle.0).ok_or(stale("geom"))
    }

    pub fn geom_mut(&mut self, handle: GeomHandle) -> Result<&mut Geom, PhysicsError> {
        self.geoms.get_mut(handle.0).ok_or(stale("geom"))
    }

    /// Attaches a geom to a body, or detaches it with `None`.
    ///
    /// An attached geom takes the body's pose. A detached geom keeps the
    /// pose it had.
    pub fn set_geom_body(
        &mut self,
        geom: GeomHandle,
        body: Option<BodyHandle>,
    ) -> Result<(), PhysicsError> {
        let frame = self.geom_frame(geom)?;
        if let Some(body) = body {
            self.body(body)?;
        }
        let g = self.geom_mut(geom)?;
        if body.is_some() && !g.shape.is_placeable() {
            return Err(PhysicsError::InvalidShape("planes cannot be attached to a body"));
        }
        if body.is_none() && g.body.is_some() {
            g.position = frame.position;
            g.orientation = Quat::from_mat3(&frame.rotation);
        }
        g.body = body;
        Ok(())
    }

    /// Moves a geom, or the body it is attached to.
    pub fn set_geom_position(&mut self, geom: GeomHandle, position: Vec3) -> Result<(), PhysicsError> {
        let g = self.geom(geom)?;
        if !g.shape.is_placeable() {
            return Err(PhysicsError::InvalidShape("planes are not placeable"));
        }
        let attached = g.body;
        match attached {
            Some(body) => self.body_mut(body)?.set_position(position),
            None => self.geom_mut(geom)?.position = position,
        }
        Ok(())
    }

    /// Rotates a geom, or the body it is attached to.
    pub fn set_geom_orientation(
        &mut self,
        geom: GeomHandle,
        orientation: Quat,
    ) -> Result<(), PhysicsError> {
        let g = self.geom(geom)?;
        if !g.shape.is_placeable() {
            return Err(PhysicsError::InvalidShape("planes are not placeable"));
        }
        let attached = g.body;
        match attached {
            Some(body) => self.body_mut(body)?.set_orientation(orientation),
            None => self.geom_mut(geom)?.orientation = orientation.normalize(),
        }
        Ok(())
    }

    /// World placement of a geom, taken from its body when attached.
    pub fn geom_frame(&self, handle: GeomHandle) -> Result<Frame, PhysicsError> {
        let geom = self.geom(handle)?;
        Ok(self.frame_of(geom))
    }

    fn frame_of(&self, geom: &Geom) -> Frame {
        match geom.body.and_then(|b| self.bodies.get(b.0)) {
            Some(body) => Frame::new(body.position, body.orientation),
            None => Frame::new(geom.position, geom.orientation),
        }
    }

    pub fn geom_aabb(&self, handle: GeomHandle) -> Result<Aabb, PhysicsError> {
        let geom = self.geom(handle)?;
        Ok(Aabb::of_shape(&geom.shape, &self.frame_of(geom)))
    }

    pub fn geom_pose(&self, handle: GeomHandle) -> Result<GeomPose, PhysicsError> {
        let frame = self.geom_frame(handle)?;
        Ok(GeomPose::new(frame.position, frame.rotation))
    }

    // -- shared lookups -----------------------------------------------------

    fn joint_ref(&self, handle: JointHandle) -> Result<&Joint, PhysicsError> {
        self.joints.get(handle.0).ok_or(stale("joint"))
    }

    fn group_ref(&self, handle: JointGroupHandle) -> Result<&JointGroup, PhysicsError> {
        self.groups.get(handle.0).ok_or(stale("joint group"))
    }

    fn space_ref(&self, handle: SpaceHandle) -> Result<&Space, PhysicsError> {
        self.spaces.get(handle.0).ok_or(stale("space"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destroyed_body_handles_are_stale() {
        let mut world = World::default();
        let body = world.create_body();
        world.destroy_body(body).unwrap();
        let reused = world.create_body();
        assert_eq!(body.0.slot(), reused.0.slot(), "slot is recycled");
        assert_eq!(world.body(body).err(), Some(PhysicsError::StaleHandle { kind: "body" }));
        assert!(world.body(reused).is_ok());
    }

    #[test]
    fn geom_follows_its_body_and_freezes_when_the_body_dies() {
        let mut world = World::default();
        let body = world.create_body();
        let geom = world.create_geom(Shape::sphere(0.5), None).unwrap();
        world.set_geom_body(geom, Some(body)).unwrap();
        world.set_geom_position(geom, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(world.body(body).unwrap().position(), Vec3::new(1.0, 2.0, 3.0));

        world.destroy_body(body).unwrap();
        let g = world.geom(geom).unwrap();
        assert_eq!(g.body(), None);
        assert_eq!(world.geom_frame(geom).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn planes_stay_static() {
        let mut world = World::default();
        let body = world.create_body();
        let plane = world.create_geom(Shape::plane(Vec3::Y, 0.0), None).unwrap();
        assert!(matches!(
            world.set_geom_body(plane, Some(body)),
            Err(PhysicsError::InvalidShape(_))
        ));
        assert!(world.set_geom_position(plane, Vec3::ONE).is_err());
    }

    #[test]
    fn invalid_shapes_are_rejected_without_side_effects() {
        let mut world = World::default();
        assert!(world.create_geom(Shape::sphere(-1.0), None).is_err());
        assert_eq!(world.geoms.len(), 0);
    }

    #[test]
    fn detaching_keeps_the_last_pose() {
        let mut world = World::default();
        let body = world.create_body();
        world
            .body_mut(body)
            .unwrap()
            .set_orientation(Quat::from_rotation_x(0.5));
        let geom = world.create_geom(Shape::cuboid(Vec3::ONE), None).unwrap();
        world.set_geom_body(geom, Some(body)).unwrap();
        world.set_geom_body(geom, None).unwrap();
        world.body_mut(body).unwrap().set_orientation(Quat::IDENTITY);
        let pose = world.geom_pose(geom).unwrap();
        let expected = GeomPose::new(Vec3::ZERO, glam::Mat3::from_rotation_x(0.5));
        for (a, b) in pose.rotation.iter().zip(expected.rotation.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
