//! # Constraint Solver
//!
//! Solves the mixed linear complementarity problem assembled from joint rows
//! at the velocity level. Unknowns are row impulses `P = lambda * h`:
//!
//! ```text
//! (J M^-1 J^T + cfm / h) P = rhs - J v*      lo * h <= P <= hi * h
//! ```
//!
//! where `v*` is the unconstrained velocity after applying external forces.
//! Friction rows bound their impulse by `mu` times the impulse of the normal
//! row they reference instead.
//!
//! Two strategies share the same assembly:
//! - projected Gauss-Seidel with over-relaxation and a fixed sweep count
//! - a dense system relaxed until the largest impulse change falls below a
//!   tolerance

use std::ops::Range;

use glam::{Mat3, Vec3};

use crate::joint::{JacobianRow, JointFeedback};

/// Counters describing the work done by one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Enabled bodies that were integrated.
    pub bodies: usize,
    pub islands: usize,
    /// Constraint rows handed to the solver.
    pub rows: usize,
    /// Solver sweeps summed over islands.
    pub iterations: usize,
}

impl std::ops::AddAssign for StepStats {
    fn add_assign(&mut self, other: Self) {
        self.bodies += other.bodies;
        self.islands += other.islands;
        self.rows += other.rows;
        self.iterations += other.iterations;
    }
}

/// Mass properties and velocity of one body while solving.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverBody {
    pub inv_mass: f32,
    pub inv_inertia: Mat3,
    pub linear: Vec3,
    pub angular: Vec3,
}

impl SolverBody {
    fn apply(&mut self, linear: Vec3, angular: Vec3, impulse: f32) {
        self.linear += linear * impulse;
        self.angular += angular * impulse;
    }
}

/// A row bound to solver body indices, with `M^-1 J^T` cached.
#[derive(Debug, Clone, Copy)]
struct SolverRow {
    row: JacobianRow,
    body1: usize,
    body2: Option<usize>,
    /// Absolute index of the normal row this friction row depends on.
    normal: Option<usize>,
    m1l: Vec3,
    m1a: Vec3,
    m2l: Vec3,
    m2a: Vec3,
    /// `J M^-1 J^T + cfm / h`
    diag: f32,
}

#[derive(Debug, Default)]
pub(crate) struct ConstraintSystem {
    pub bodies: Vec<SolverBody>,
    rows: Vec<SolverRow>,
    impulses: Vec<f32>,
}

impl ConstraintSystem {
    pub(crate) fn new(bodies: Vec<SolverBody>) -> Self {
        Self {
            bodies,
            rows: Vec::new(),
            impulses: Vec::new(),
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Adds the rows of one joint and returns their index range.
    pub(crate) fn add_joint(
        &mut self,
        body1: usize,
        body2: Option<usize>,
        rows: &[JacobianRow],
        h: f32,
    ) -> Range<usize> {
        let start = self.rows.len();
        for row in rows {
            let b1 = self.bodies[body1];
            let m1l = row.j1l * b1.inv_mass;
            let m1a = b1.inv_inertia * row.j1a;
            let (m2l, m2a) = body2.map_or((Vec3::ZERO, Vec3::ZERO), |b| {
                let b2 = self.bodies[b];
                (row.j2l * b2.inv_mass, b2.inv_inertia * row.j2a)
            });
            let diag = row.j1l.dot(m1l) + row.j1a.dot(m1a) + row.j2l.dot(m2l) + row.j2a.dot(m2a)
                + row.cfm / h;
            self.rows.push(SolverRow {
                row: *row,
                body1,
                body2,
                normal: row.friction_index.map(|offset| start + offset),
                m1l,
                m1a,
                m2l,
                m2a,
                diag,
            });
        }
        start..self.rows.len()
    }

    fn velocity(&self, r: &SolverRow) -> f32 {
        let b1 = &self.bodies[r.body1];
        let mut jv = r.row.j1l.dot(b1.linear) + r.row.j1a.dot(b1.angular);
        if let Some(b2) = r.body2 {
            let b2 = &self.bodies[b2];
            jv += r.row.j2l.dot(b2.linear) + r.row.j2a.dot(b2.angular);
        }
        jv
    }

    fn bounds(&self, r: &SolverRow, h: f32) -> (f32, f32) {
        match r.normal {
            Some(n) => {
                let normal = self.impulses[n];
                let limit = if normal > 0.0 { (r.row.hi * normal).abs() } else { 0.0 };
                (-limit, limit)
            }
            None => (r.row.lo * h, r.row.hi * h),
        }
    }

    fn apply(&mut self, i: usize, delta: f32) {
        let r = self.rows[i];
        self.bodies[r.body1].apply(r.m1l, r.m1a, delta);
        if let Some(b2) = r.body2 {
            self.bodies[b2].apply(r.m2l, r.m2a, delta);
        }
    }

    /// Projected Gauss-Seidel with over-relaxation `sor`. Returns the number
    /// of sweeps.
    pub(crate) fn solve_iterative(&mut self, iterations: usize, sor: f32, h: f32) -> usize {
        self.impulses = vec![0.0; self.rows.len()];
        if self.rows.is_empty() {
            return 0;
        }
        for _ in 0..iterations {
            for i in 0..self.rows.len() {
                let r = self.rows[i];
                if r.diag <= 0.0 {
                    continue;
                }
                let old = self.impulses[i];
                let residual = r.row.rhs - self.velocity(&r) - r.row.cfm / h * old;
                let (lo, hi) = self.bounds(&r, h);
                let new = (old + sor * residual / r.diag).clamp(lo, hi);
                self.impulses[i] = new;
                self.apply(i, new - old);
            }
        }
        iterations
    }

    /// Dense relaxation of the full system until the largest impulse change
    /// in a sweep is below `tolerance`. Returns the number of sweeps.
    pub(crate) fn solve_exact(&mut self, max_iterations: usize, tolerance: f32, h: f32) -> usize {
        let m = self.rows.len();
        self.impulses = vec![0.0; m];
        if m == 0 {
            return 0;
        }

        let mut a = vec![0.0_f32; m * m];
        let mut b = vec![0.0_f32; m];
        for i in 0..m {
            let ri = self.rows[i];
            b[i] = ri.row.rhs - self.velocity(&ri);
            for j in 0..m {
                let rj = &self.rows[j];
                let mut sum = 0.0;
                if rj.body1 == ri.body1 {
                    sum += ri.row.j1l.dot(rj.m1l) + ri.row.j1a.dot(rj.m1a);
                }
                if Some(rj.body1) == ri.body2 {
                    sum += ri.row.j2l.dot(rj.m1l) + ri.row.j2a.dot(rj.m1a);
                }
                if let Some(b2) = rj.body2 {
                    if b2 == ri.body1 {
                        sum += ri.row.j1l.dot(rj.m2l) + ri.row.j1a.dot(rj.m2a);
                    }
                    if Some(b2) == ri.body2 {
                        sum += ri.row.j2l.dot(rj.m2l) + ri.row.j2a.dot(rj.m2a);
                    }
                }
                a[i * m + j] = sum;
            }
            a[i * m + i] += ri.row.cfm / h;
        }

        let mut sweeps = 0;
        while sweeps < max_iterations {
            sweeps += 1;
            let mut largest = 0.0_f32;
            for i in 0..m {
                let diag = a[i * m + i];
                if diag <= 0.0 {
                    continue;
                }
                let row = &a[i * m..(i + 1) * m];
                let ax: f32 = row.iter().zip(&self.impulses).map(|(aij, p)| aij * p).sum();
                let r = self.rows[i];
                let (lo, hi) = self.bounds(&r, h);
                let old = self.impulses[i];
                let new = (old + (b[i] - ax) / diag).clamp(lo, hi);
                largest = largest.max((new - old).abs());
                self.impulses[i] = new;
            }
            if largest < tolerance {
                break;
            }
        }

        for i in 0..m {
            let impulse = self.impulses[i];
            self.apply(i, impulse);
        }
        sweeps
    }

    /// Constraint forces the rows in `range` applied over a step of `h`.
    pub(crate) fn feedback(&self, range: Range<usize>, h: f32) -> JointFeedback {
        let mut fb = JointFeedback::default();
        for i in range {
            let lambda = self.impulses[i] / h;
            let row = &self.rows[i].row;
            fb.force1 += row.j1l * lambda;
            fb.torque1 += row.j1a * lambda;
            fb.force2 += row.j2l * lambda;
            fb.torque2 += row.j2a * lambda;
        }
        fb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_body(linear: Vec3) -> SolverBody {
        SolverBody {
            inv_mass: 1.0,
            inv_inertia: Mat3::IDENTITY,
            linear,
            angular: Vec3::ZERO,
        }
    }

    fn normal_row(rhs: f32) -> JacobianRow {
        let mut row = JacobianRow::new(0.0);
        row.j1l = Vec3::Y;
        row.rhs = rhs;
        row.lo = 0.0;
        row
    }

    #[test]
    fn single_row_is_solved_in_one_sweep() {
        let mut system = ConstraintSystem::new(vec![unit_body(Vec3::new(0.0, -2.0, 0.0))]);
        system.add_joint(0, None, &[normal_row(0.0)], 0.01);
        system.solve_iterative(1, 1.0, 0.01);
        let v = system.bodies[0].linear;
        println!("velocity after contact {v}");
        assert!(v.y.abs() < 1e-6);
    }

    #[test]
    fn unilateral_row_does_not_pull() {
        let mut system = ConstraintSystem::new(vec![unit_body(Vec3::new(0.0, 3.0, 0.0))]);
        system.add_joint(0, None, &[normal_row(0.0)], 0.01);
        system.solve_iterative(10, 1.0, 0.01);
        assert_eq!(system.bodies[0].linear.y, 3.0);
        assert_eq!(system.impulses[0], 0.0);
    }

    #[test]
    fn friction_is_bounded_by_the_normal_impulse() {
        let mut system = ConstraintSystem::new(vec![unit_body(Vec3::new(5.0, -1.0, 0.0))]);
        let mut friction = JacobianRow::new(0.0);
        friction.j1l = Vec3::X;
        friction.lo = -0.5;
        friction.hi = 0.5;
        friction.friction_index = Some(0);
        system.add_joint(0, None, &[normal_row(0.0), friction], 0.01);
        system.solve_iterative(20, 1.0, 0.01);
        let v = system.bodies[0].linear;
        println!("sliding velocity {v}");
        // normal impulse 1.0 allows at most 0.5 of tangential impulse
        assert!((v.x - 4.5).abs() < 1e-4);
        assert!(v.y.abs() < 1e-5);
    }

    #[test]
    fn exact_and_iterative_agree_on_a_chain() {
        let build = || {
            let mut system = ConstraintSystem::new(vec![
                unit_body(Vec3::new(0.0, -1.0, 0.0)),
                unit_body(Vec3::new(0.0, 1.0, 0.0)),
            ]);
            let mut tie = JacobianRow::new(1e-5);
            tie.j1l = Vec3::Y;
            tie.j2l = -Vec3::Y;
            system.add_joint(0, Some(1), &[tie], 0.01);
            let mut floor = normal_row(0.0);
            floor.cfm = 1e-5;
            system.add_joint(0, None, &[floor], 0.01);
            system
        };
        let mut iterative = build();
        iterative.solve_iterative(200, 1.0, 0.01);
        let mut exact = build();
        let sweeps = exact.solve_exact(500, 1e-7, 0.01);
        println!("exact solver took {sweeps} sweeps");
        for (a, b) in iterative.bodies.iter().zip(&exact.bodies) {
            assert!((a.linear - b.linear).length() < 1e-3);
        }
        assert!(exact.bodies[0].linear.y.abs() < 1e-3);
    }

    #[test]
    fn feedback_reports_force() {
        let mut system = ConstraintSystem::new(vec![unit_body(Vec3::new(0.0, -2.0, 0.0))]);
        let range = system.add_joint(0, None, &[normal_row(0.0)], 0.01);
        system.solve_iterative(1, 1.0, 0.01);
        let fb = system.feedback(range, 0.01);
        assert!((fb.force1.y - 200.0).abs() < 1e-2);
    }
}
