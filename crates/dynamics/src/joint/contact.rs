use glam::Vec3;

use super::{JacobianRow, RowContext};
use crate::collision::ContactGeom;
use crate::math;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Surface properties of one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceParams {
    /// Coulomb friction coefficient. Zero disables friction, infinity never
    /// slips.
    pub mu: f32,
    /// Separate coefficient for the second friction direction.
    pub mu2: Option<f32>,
    /// Restitution in `[0, 1]`; zero disables bounce.
    pub bounce: f32,
    /// Minimum incoming velocity for bounce to apply.
    pub bounce_vel: f32,
    pub soft_erp: Option<f32>,
    pub soft_cfm: Option<f32>,
    /// Surface velocity along each friction direction.
    pub motion1: f32,
    pub motion2: f32,
    /// Force-dependent slip along each friction direction.
    pub slip1: Option<f32>,
    pub slip2: Option<f32>,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            mu: 0.0,
            mu2: None,
            bounce: 0.0,
            bounce_vel: 0.0,
            soft_erp: None,
            soft_cfm: None,
            motion1: 0.0,
            motion2: 0.0,
            slip1: None,
            slip2: None,
        }
    }
}

impl SurfaceParams {
    #[must_use]
    pub fn with_friction(mu: f32) -> Self {
        Self {
            mu,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_bounce(mut self, bounce: f32, bounce_vel: f32) -> Self {
        self.bounce = bounce;
        self.bounce_vel = bounce_vel;
        self
    }

    fn mu2(&self) -> f32 {
        self.mu2.unwrap_or(self.mu)
    }
}

/// A contact point together with the surface it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    pub geom: ContactGeom,
    pub surface: SurfaceParams,
    /// First friction direction. Must be perpendicular to the normal.
    pub fdir1: Option<Vec3>,
}

impl Contact {
    #[must_use]
    pub fn new(geom: ContactGeom, surface: SurfaceParams) -> Self {
        Self {
            geom,
            surface,
            fdir1: None,
        }
    }
}

/// Short-lived joint that keeps two bodies from interpenetrating at one
/// point and applies friction there.
#[derive(Debug, Clone)]
pub struct ContactJoint {
    pub(crate) contact: Contact,
}

impl ContactJoint {
    pub(crate) fn new(contact: Contact) -> Self {
        Self { contact }
    }

    #[must_use]
    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub(crate) fn rows(&self, ctx: &RowContext<'_>, reversed: bool, out: &mut Vec<JacobianRow>) {
        let Contact {
            geom,
            surface,
            fdir1,
        } = self.contact;
        // the rows push body 1 along `n`, i.e. away from body 2
        let n = if reversed { geom.normal } else { -geom.normal };
        let c1 = geom.position - ctx.body1.position;
        let c2 = ctx.body2.map(|b| geom.position - b.position);

        let base = out.len();
        let directional = |dir: Vec3, cfm: f32| {
            let mut row = JacobianRow::new(cfm);
            row.j1l = dir;
            row.j1a = c1.cross(dir);
            if let Some(c2) = c2 {
                row.j2l = -dir;
                row.j2a = -c2.cross(dir);
            }
            row
        };

        let erp = surface.soft_erp.unwrap_or(ctx.erp);
        let mut normal = directional(n, surface.soft_cfm.unwrap_or(ctx.cfm));
        let depth = (geom.depth - ctx.surface_layer).max(0.0);
        normal.rhs = (ctx.fps * erp * depth).min(ctx.max_correcting_vel);
        if surface.bounce > 0.0 {
            let b1 = ctx.body1;
            let v2 = ctx.body2.map_or((Vec3::ZERO, Vec3::ZERO), |b| {
                (b.linear_velocity, b.angular_velocity)
            });
            let outgoing = normal.velocity(b1.linear_velocity, b1.angular_velocity, v2.0, v2.1);
            if surface.bounce_vel >= 0.0 && -outgoing > surface.bounce_vel {
                normal.rhs = normal.rhs.max(-surface.bounce * outgoing);
            }
        }
        normal.lo = 0.0;
        normal.hi = f32::INFINITY;
        out.push(normal);

        let (t1, t2) = match fdir1.and_then(math::try_normalize) {
            Some(t1) => (t1, n.cross(t1)),
            None => math::plane_space(n),
        };
        let friction = [
            (t1, surface.mu, surface.motion1, surface.slip1),
            (t2, surface.mu2(), surface.motion2, surface.slip2),
        ];
        for (dir, mu, motion, slip) in friction {
            if mu <= 0.0 {
                continue;
            }
            let mut row = directional(dir, slip.unwrap_or(ctx.cfm));
            row.rhs = motion;
            if mu.is_finite() {
                row.lo = -mu;
                row.hi = mu;
                row.friction_index = Some(0);
            } else {
                // sticks regardless of the normal load
                row.lo = f32::NEG_INFINITY;
                row.hi = f32::INFINITY;
            }
            out.push(row);
        }
        debug_assert!(out.len() - base <= 3);
    }
}
