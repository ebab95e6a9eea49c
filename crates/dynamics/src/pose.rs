//! Pose snapshots for renderers.
//!
//! Poses are plain `#[repr(C)]` data so a frame's worth of them can be cast to
//! bytes with `bytemuck` and uploaded without conversion.

use glam::{Mat3, Mat4, Quat, Vec3};

use crate::math;

/// World transform of a body after a step.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyPose {
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub orientation: [f32; 4],
    /// Row-major 3x4 rotation; the fourth column of each row is padding.
    pub rotation: [f32; 12],
}

/// World transform of a geom, taken from its body when attached.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeomPose {
    pub position: [f32; 3],
    pub rotation: [f32; 12],
}

impl BodyPose {
    #[must_use]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position: position.to_array(),
            orientation: orientation.to_array(),
            rotation: math::rotation_3x4(Mat3::from_quat(orientation)),
        }
    }

    /// Column-major 4x4 model matrix.
    #[must_use]
    pub fn to_transform_matrix(&self) -> [[f32; 4]; 4] {
        let quat = Quat::from_array(self.orientation);
        Mat4::from_rotation_translation(quat, Vec3::from_array(self.position)).to_cols_array_2d()
    }
}

impl GeomPose {
    #[must_use]
    pub fn new(position: Vec3, rotation: Mat3) -> Self {
        Self {
            position: position.to_array(),
            rotation: math::rotation_3x4(rotation),
        }
    }

    /// Column-major 4x4 model matrix.
    #[must_use]
    pub fn to_transform_matrix(&self) -> [[f32; 4]; 4] {
        let r = &self.rotation;
        let p = self.position;
        [
            [r[0], r[4], r[8], 0.0],
            [r[1], r[5], r[9], 0.0],
            [r[2], r[6], r[10], 0.0],
            [p[0], p[1], p[2], 1.0],
        ]
    }
}
