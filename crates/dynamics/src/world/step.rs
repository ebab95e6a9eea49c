//! # Stepping
//!
//! One step runs the pipeline below, in order:
//!
//! 1. **Islands**: enabled bodies are grouped into connected components of
//!    the joint graph. A joint reaching a disabled body wakes it.
//! 2. **Assembly**: every joint in an island emits its rows. The
//!    unconstrained velocities `v*` are computed from the accumulated forces,
//!    gravity and the gyroscopic term.
//! 3. **Solve**: each island is solved on its own (in parallel with the
//!    `parallel` feature). The exact mode merges everything into one system.
//! 4. **Integration**: positions and orientations advance with the solved
//!    velocities. Accumulators are cleared and resting islands may sleep.

use std::collections::HashMap;
use std::ops::Range;

use glam::Vec3;
use tracing::debug;

use super::World;
use crate::arena::{BodyHandle, JointHandle};
use crate::config::StepMode;
use crate::error::PhysicsError;
use crate::joint::{JacobianRow, RowContext};
use crate::math;
use crate::solver::{ConstraintSystem, SolverBody, StepStats};

/// Bodies and joints of one connected component.
#[derive(Debug, Default)]
struct Island {
    bodies: Vec<BodyHandle>,
    joints: Vec<JointHandle>,
}

/// Assembled system of one island, ready to be solved.
struct IslandWork {
    bodies: Vec<BodyHandle>,
    joints: Vec<(JointHandle, Range<usize>)>,
    system: ConstraintSystem,
    iterations: usize,
}

impl IslandWork {
    fn solve(&mut self, mode: StepMode, h: f32) {
        self.iterations = match mode {
            StepMode::Iterative { iterations, sor } => self.system.solve_iterative(iterations, sor, h),
            StepMode::Exact {
                max_iterations,
                tolerance,
            } => self.system.solve_exact(max_iterations, tolerance, h),
        };
    }
}

impl World {
    /// Advances the world by `dt` with the configured [`StepMode`].
    pub fn step(&mut self, dt: f32) -> Result<StepStats, PhysicsError> {
        self.step_with(dt, self.config.step_mode)
    }

    /// Advances the world with a fixed number of relaxation sweeps per
    /// island.
    pub fn step_iterative(
        &mut self,
        dt: f32,
        iterations: usize,
        sor: f32,
    ) -> Result<StepStats, PhysicsError> {
        self.step_with(dt, StepMode::Iterative { iterations, sor })
    }

    /// Advances the world by solving one system over all enabled bodies
    /// until it converges. Much slower than [`World::step_iterative`] on
    /// large scenes.
    pub fn step_exact(
        &mut self,
        dt: f32,
        max_iterations: usize,
        tolerance: f32,
    ) -> Result<StepStats, PhysicsError> {
        self.step_with(
            dt,
            StepMode::Exact {
                max_iterations,
                tolerance,
            },
        )
    }

    fn step_with(&mut self, dt: f32, mode: StepMode) -> Result<StepStats, PhysicsError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(PhysicsError::InvalidTimeStep(dt));
        }

        let mut islands = self.find_islands();
        if matches!(mode, StepMode::Exact { .. }) && islands.len() > 1 {
            let merged = islands.drain(..).fold(Island::default(), |mut all, island| {
                all.bodies.extend(island.bodies);
                all.joints.extend(island.joints);
                all
            });
            islands.push(merged);
        }

        let mut work: Vec<IslandWork> = islands
            .into_iter()
            .map(|island| self.assemble(island, dt))
            .collect();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            work.par_iter_mut().for_each(|w| w.solve(mode, dt));
        }
        #[cfg(not(feature = "parallel"))]
        work.iter_mut().for_each(|w| w.solve(mode, dt));

        let mut stats = StepStats::default();
        for island in &work {
            self.finish_island(island, dt);
            stats += StepStats {
                bodies: island.bodies.len(),
                islands: 1,
                rows: island.system.row_count(),
                iterations: island.iterations,
            };
        }

        for (_, body) in self.bodies.iter_mut() {
            body.clear_accumulators();
        }
        for island in &work {
            self.auto_disable(&island.bodies);
        }

        debug!(
            bodies = stats.bodies,
            islands = stats.islands,
            rows = stats.rows,
            iterations = stats.iterations,
            "stepped world"
        );
        Ok(stats)
    }

    /// Connected components of enabled bodies, in body order. Disabled
    /// bodies reached through a joint are enabled.
    fn find_islands(&mut self) -> Vec<Island> {
        let mut adjacency: HashMap<BodyHandle, Vec<JointHandle>> = HashMap::new();
        for (index, joint) in self.joints.iter() {
            if let Some(b1) = joint.body1 {
                adjacency.entry(b1).or_default().push(JointHandle(index));
                if let Some(b2) = joint.body2 {
                    adjacency.entry(b2).or_default().push(JointHandle(index));
                }
            }
        }

        let seeds: Vec<BodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.enabled)
            .map(|(index, _)| BodyHandle(index))
            .collect();

        let mut visited_bodies = std::collections::HashSet::new();
        let mut visited_joints = std::collections::HashSet::new();
        let mut islands = Vec::new();
        let mut stack = Vec::new();
        for seed in seeds {
            if !visited_bodies.insert(seed) {
                continue;
            }
            let mut island = Island::default();
            stack.push(seed);
            while let Some(body) = stack.pop() {
                island.bodies.push(body);
                for &joint in adjacency.get(&body).into_iter().flatten() {
                    if !visited_joints.insert(joint) {
                        continue;
                    }
                    island.joints.push(joint);
                    let Some(j) = self.joints.get(joint.0) else {
                        continue;
                    };
                    for other in [j.body1, j.body2].into_iter().flatten() {
                        if visited_bodies.insert(other) {
                            if let Some(b) = self.bodies.get_mut(other.0) {
                                if !b.enabled {
                                    b.enable();
                                }
                            }
                            stack.push(other);
                        }
                    }
                }
            }
            islands.push(island);
        }
        islands
    }

    /// Builds the rows and unconstrained velocities of one island.
    fn assemble(&mut self, island: Island, h: f32) -> IslandWork {
        let local: HashMap<BodyHandle, usize> = island
            .bodies
            .iter()
            .enumerate()
            .map(|(i, &b)| (b, i))
            .collect();
        let mut applied = vec![(Vec3::ZERO, Vec3::ZERO); island.bodies.len()];
        let mut joint_rows: Vec<(JointHandle, usize, Option<usize>, Vec<JacobianRow>)> =
            Vec::with_capacity(island.joints.len());

        let config = self.config;
        for &handle in &island.joints {
            let Some(joint) = self.joints.get_mut(handle.0) else {
                continue;
            };
            let Some(b1) = joint.body1 else {
                continue;
            };
            let (Some(&l1), Some(body1)) = (local.get(&b1), self.bodies.get(b1.0)) else {
                continue;
            };
            let l2 = joint.body2.and_then(|b| local.get(&b).copied());
            let body2 = joint.body2.and_then(|b| self.bodies.get(b.0));

            let mut ctx = RowContext {
                fps: 1.0 / h,
                erp: config.erp,
                cfm: config.cfm,
                max_correcting_vel: config.contact_max_correcting_vel,
                surface_layer: config.contact_surface_layer,
                body1,
                body2,
                applied: [(Vec3::ZERO, Vec3::ZERO); 2],
            };
            let mut rows = Vec::new();
            joint.rows(&mut ctx, &mut rows);

            let [(f1, t1), (f2, t2)] = ctx.applied;
            applied[l1].0 += f1;
            applied[l1].1 += t1;
            if let Some(l2) = l2 {
                applied[l2].0 += f2;
                applied[l2].1 += t2;
            }
            joint_rows.push((handle, l1, l2, rows));
        }

        let solver_bodies = island
            .bodies
            .iter()
            .zip(&applied)
            .filter_map(|(&handle, &(force, torque))| {
                let body = self.bodies.get(handle.0)?;
                let inertia = body.world_inertia();
                let inv_inertia = body.world_inv_inertia();
                let mut linear = body.linear_velocity + body.inv_mass() * h * (body.force + force);
                if body.gravity_enabled() {
                    linear += config.gravity * h;
                }
                let w = body.angular_velocity;
                let gyroscopic = w.cross(inertia * w);
                let angular = w + inv_inertia * (body.torque + torque - gyroscopic) * h;
                Some(SolverBody {
                    inv_mass: body.inv_mass(),
                    inv_inertia,
                    linear,
                    angular,
                })
            })
            .collect();

        let mut system = ConstraintSystem::new(solver_bodies);
        let joints = joint_rows
            .into_iter()
            .map(|(handle, l1, l2, rows)| (handle, system.add_joint(l1, l2, &rows, h)))
            .collect();

        IslandWork {
            bodies: island.bodies,
            joints,
            system,
            iterations: 0,
        }
    }

    /// Writes back velocities and feedback, then integrates the pose.
    fn finish_island(&mut self, work: &IslandWork, h: f32) {
        for (&handle, solved) in work.bodies.iter().zip(&work.system.bodies) {
            let Some(body) = self.bodies.get_mut(handle.0) else {
                continue;
            };
            body.linear_velocity = solved.linear;
            body.angular_velocity = solved.angular;
            body.position += solved.linear * h;
            body.orientation = math::integrate_orientation(
                body.orientation,
                solved.angular,
                h,
                body.finite_rotation(),
            );
        }
        for (handle, range) in &work.joints {
            if let Some(joint) = self.joints.get_mut(handle.0) {
                if joint.feedback.is_some() {
                    joint.feedback = Some(work.system.feedback(range.clone(), h));
                }
            }
        }
    }

    /// Puts an island to sleep once every body in it has been idle long
    /// enough.
    fn auto_disable(&mut self, island: &[BodyHandle]) {
        let mut idle = !island.is_empty();
        for handle in island {
            if let Some(body) = self.bodies.get_mut(handle.0) {
                idle &= body.tick_idle();
            }
        }
        if !idle {
            return;
        }
        for handle in island {
            if let Some(body) = self.bodies.get_mut(handle.0) {
                body.disable();
            }
        }
        debug!(bodies = island.len(), "island went to sleep");
    }
}
