//! # World Configuration
//!
//! Global simulation parameters. Joints and contacts fall back to the global
//! ERP/CFM values unless they carry their own.

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the stepper solves the assembled constraint system.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepMode {
    /// Fixed number of projected Gauss-Seidel sweeps per island with
    /// successive over-relaxation factor `sor`.
    Iterative { iterations: usize, sor: f32 },
    /// One dense system over every enabled body, relaxed until the largest
    /// impulse change drops below `tolerance` or `max_iterations` is reached.
    Exact { max_iterations: usize, tolerance: f32 },
}

impl Default for StepMode {
    fn default() -> Self {
        Self::Iterative {
            iterations: 20,
            sor: 1.3,
        }
    }
}

/// Sleep thresholds for bodies that have come to rest.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AutoDisable {
    pub enabled: bool,
    pub linear_threshold: f32,
    pub angular_threshold: f32,
    /// Consecutive idle steps before a body is disabled.
    pub steps: u32,
}

impl Default for AutoDisable {
    fn default() -> Self {
        Self {
            enabled: false,
            linear_threshold: 0.01,
            angular_threshold: 0.01,
            steps: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    pub gravity: Vec3,
    /// Global error reduction parameter.
    pub erp: f32,
    /// Global constraint force mixing.
    pub cfm: f32,
    pub step_mode: StepMode,
    /// Upper bound on the velocity a contact may use to resolve penetration.
    pub contact_max_correcting_vel: f32,
    /// Penetration depth that is tolerated without correction.
    pub contact_surface_layer: f32,
    /// Defaults copied onto every body created afterwards.
    pub auto_disable: AutoDisable,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::ZERO,
            erp: 0.2,
            cfm: 1e-5,
            step_mode: StepMode::default(),
            contact_max_correcting_vel: f32::INFINITY,
            contact_surface_layer: 0.0,
            auto_disable: AutoDisable::default(),
        }
    }
}

impl WorldConfig {
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_step_mode(mut self, mode: StepMode) -> Self {
        self.step_mode = mode;
        self
    }
}
