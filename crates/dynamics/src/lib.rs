#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
    clippy::similar_names,
    clippy::many_single_char_names,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::float_cmp
)]
//! # Dynamics
//!
//! A constraint-based rigid body engine with spatial broad-phase collision.
//!
//! This crate advances rigid bodies under gravity, applied forces, joints
//! and transient contacts. Every step assembles the constraints into one
//! velocity-level system per island of connected bodies, solves it, and
//! integrates the result.
//!
//! ## Key Components
//!
//! -   **World:** [`World`] owns all bodies, geoms, joints, joint groups and
//!     spaces and hands out generation-checked handles to them.
//! -   **Collision:** geoms live in [`space`]s which propose candidate pairs
//!     through a broad-phase strategy. [`collision`] turns a pair into
//!     contact points.
//! -   **Joints:** ball, hinge, slider, hinge-2, fixed and contact joints
//!     in [`joint`], each producing Jacobian rows for the [`solver`].
//! -   **Snapshots:** [`BodyPose`] and [`GeomPose`] are plain data for
//!     renderers.
//!
//! ## Usage
//!
//! A frame usually collides, steps and then throws the contacts away:
//!
//! ```rust
//! use dynamics::{Shape, SpaceKind, SurfaceParams, World, WorldConfig};
//! use glam::Vec3;
//!
//! # fn main() -> Result<(), dynamics::PhysicsError> {
//! let mut world = World::new(WorldConfig::default().with_gravity(Vec3::new(0.0, -9.81, 0.0)));
//! let space = world.create_space(SpaceKind::Flat);
//! world.create_geom(Shape::plane(Vec3::Y, 0.0), Some(space))?;
//!
//! let ball = world.create_body();
//! world.body_mut(ball)?.set_position(Vec3::new(0.0, 2.0, 0.0));
//! let geom = world.create_geom(Shape::sphere(0.5), Some(space))?;
//! world.set_geom_body(geom, Some(ball))?;
//!
//! let contacts = world.create_joint_group();
//! for _ in 0..100 {
//!     world.auto_contacts(space, contacts, 4, SurfaceParams::with_friction(0.5))?;
//!     world.step(0.01)?;
//!     world.empty_joint_group(contacts)?;
//! }
//! assert!(world.body(ball)?.position().y > 0.4);
//! # Ok(())
//! # }
//! ```

pub mod arena;
pub mod body;
pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod group;
pub mod joint;
pub mod mass;
pub mod math;
pub mod pose;
pub mod solver;
pub mod space;
pub mod world;

pub use arena::{BodyHandle, GeomHandle, JointGroupHandle, JointHandle, SpaceHandle};
pub use body::Body;
pub use collision::ContactGeom;
pub use config::{AutoDisable, StepMode, WorldConfig};
pub use error::PhysicsError;
pub use geometry::{Shape, ShapeKind};
pub use joint::{Contact, JointFeedback, JointParam, JointType, LimitParam, SurfaceParams};
pub use mass::Mass;
pub use pose::{BodyPose, GeomPose};
pub use solver::StepStats;
pub use space::SpaceKind;
pub use world::World;
