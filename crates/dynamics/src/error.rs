use thiserror::Error;

use crate::geometry::ShapeKind;
use crate::joint::{JointParam, JointType};

/// Configuration and lifecycle failures reported by the engine.
///
/// Every operation that returns one of these leaves the world unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("{kind} handle refers to a destroyed or foreign object")]
    StaleHandle { kind: &'static str },
    #[error("invalid mass properties: {0}")]
    InvalidMass(&'static str),
    #[error("mass center must be at the body origin before it is assigned to a body")]
    MassNotCentered,
    #[error("axis has zero length")]
    ZeroAxis,
    #[error("joint is not attached to any body")]
    JointNotAttached,
    #[error("joint type requires two attached bodies")]
    JointNeedsTwoBodies,
    #[error("a joint cannot attach a body to itself")]
    SameBody,
    #[error("expected a {expected:?} joint, found {found:?}")]
    WrongJointKind {
        expected: JointType,
        found: JointType,
    },
    #[error("{joint:?} joints have no parameter {param:?}")]
    ParamNotSupported { joint: JointType, param: JointParam },
    #[error("no collider registered for {first:?} vs {second:?}")]
    NoCollider { first: ShapeKind, second: ShapeKind },
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),
    #[error("adding this space would create a cycle of nested spaces")]
    SpaceCycle,
    #[error("geom or space is already a member of a space")]
    GeomAlreadyInSpace,
}
