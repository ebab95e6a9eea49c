use glam::Vec3;
use tracing::trace;

use super::{JacobianRow, LimitParam, RowContext};

/// Which stop, if any, the axis is resting against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitState {
    #[default]
    Free,
    Low,
    High,
}

/// Stops and motor of one joint axis.
///
/// At most one extra row per axis: the motor row when the axis is free and
/// powered, or the stop row when the axis is at a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitMotor {
    pub lo_stop: f32,
    pub hi_stop: f32,
    pub vel: f32,
    pub fmax: f32,
    pub fudge_factor: f32,
    pub normal_cfm: f32,
    pub stop_erp: f32,
    pub stop_cfm: f32,
    pub bounce: f32,
    pub(crate) limit: LimitState,
    /// Signed amount the axis has gone past the active stop.
    pub(crate) limit_err: f32,
}

impl LimitMotor {
    #[must_use]
    pub fn new(erp: f32, cfm: f32) -> Self {
        Self {
            lo_stop: f32::NEG_INFINITY,
            hi_stop: f32::INFINITY,
            vel: 0.0,
            fmax: 0.0,
            fudge_factor: 1.0,
            normal_cfm: cfm,
            stop_erp: erp,
            stop_cfm: cfm,
            bounce: 0.0,
            limit: LimitState::Free,
            limit_err: 0.0,
        }
    }

    #[must_use]
    pub fn limit(&self) -> LimitState {
        self.limit
    }

    pub(crate) fn set(&mut self, param: LimitParam, value: f32) {
        match param {
            LimitParam::LoStop => self.lo_stop = value,
            LimitParam::HiStop => self.hi_stop = value,
            LimitParam::Vel => self.vel = value,
            LimitParam::FMax if value >= 0.0 => self.fmax = value,
            LimitParam::FudgeFactor if (0.0..=1.0).contains(&value) => self.fudge_factor = value,
            LimitParam::Bounce => self.bounce = value,
            LimitParam::Cfm => self.normal_cfm = value,
            LimitParam::StopErp => self.stop_erp = value,
            LimitParam::StopCfm => self.stop_cfm = value,
            LimitParam::FMax | LimitParam::FudgeFactor => {
                trace!(?param, value, "ignoring out-of-range motor parameter");
            }
        }
    }

    pub(crate) fn get(&self, param: LimitParam) -> f32 {
        match param {
            LimitParam::LoStop => self.lo_stop,
            LimitParam::HiStop => self.hi_stop,
            LimitParam::Vel => self.vel,
            LimitParam::FMax => self.fmax,
            LimitParam::FudgeFactor => self.fudge_factor,
            LimitParam::Bounce => self.bounce,
            LimitParam::Cfm => self.normal_cfm,
            LimitParam::StopErp => self.stop_erp,
            LimitParam::StopCfm => self.stop_cfm,
        }
    }

    /// Updates the stop state for the joint coordinate `value`.
    ///
    /// `range` bounds the stops that are honoured: angular axes ignore stops
    /// outside `[-pi, pi]` entirely, linear axes accept any finite stop.
    pub(crate) fn test(&mut self, value: f32, range: f32) -> bool {
        let usable = (self.lo_stop >= -range || self.hi_stop <= range) && self.lo_stop <= self.hi_stop;
        self.limit = if !usable {
            LimitState::Free
        } else if value <= self.lo_stop {
            self.limit_err = value - self.lo_stop;
            LimitState::Low
        } else if value >= self.hi_stop {
            self.limit_err = value - self.hi_stop;
            LimitState::High
        } else {
            LimitState::Free
        };
        self.limit != LimitState::Free
    }

    fn is_powered(&self) -> bool {
        self.fmax > 0.0
    }

    /// Appends the limit/motor row along world axis `axis`, if one is needed.
    ///
    /// A motor pushing against a stop cannot be expressed by a single bounded
    /// row, so its force is applied to the bodies directly through
    /// `ctx.applied` and the row only enforces the stop.
    pub(crate) fn add_row(
        &self,
        ctx: &mut RowContext<'_>,
        axis: Vec3,
        rotational: bool,
        out: &mut Vec<JacobianRow>,
    ) -> bool {
        let limited = self.limit != LimitState::Free;
        if !limited && !self.is_powered() {
            return false;
        }
        let two_bodies = ctx.has_body2();
        let mut row = JacobianRow::new(self.normal_cfm);
        let mut decoupling = Vec3::ZERO;
        if rotational {
            row.j1a = axis;
            if two_bodies {
                row.j2a = -axis;
            }
        } else {
            row.j1l = axis;
            if let Some(b2) = ctx.body2 {
                row.j2l = -axis;
                // keep the linear motor from producing a spurious torque when
                // the centers of mass are offset along the axis
                let c = 0.5 * (b2.position - ctx.body1.position);
                decoupling = c.cross(axis);
                row.j1a = decoupling;
                row.j2a = decoupling;
            }
        }

        let equal_stops = self.lo_stop == self.hi_stop;
        let powered = self.is_powered() && !(limited && equal_stops);
        if powered {
            if limited {
                let mut fm = self.fmax;
                if self.vel > 0.0 || (self.vel == 0.0 && self.limit == LimitState::High) {
                    fm = -fm;
                }
                let away = (self.limit == LimitState::Low && self.vel > 0.0)
                    || (self.limit == LimitState::High && self.vel < 0.0);
                if away {
                    fm *= self.fudge_factor;
                }
                if rotational {
                    ctx.applied[0].1 -= fm * axis;
                    if two_bodies {
                        ctx.applied[1].1 += fm * axis;
                    }
                } else {
                    ctx.applied[0].0 -= fm * axis;
                    if two_bodies {
                        ctx.applied[1].0 += fm * axis;
                        ctx.applied[0].1 -= fm * decoupling;
                        ctx.applied[1].1 -= fm * decoupling;
                    }
                }
            } else {
                row.rhs = self.vel;
                row.lo = -self.fmax;
                row.hi = self.fmax;
            }
        }

        if limited {
            row.rhs = -ctx.fps * self.stop_erp * self.limit_err;
            row.cfm = self.stop_cfm;
            if equal_stops {
                row.lo = f32::NEG_INFINITY;
                row.hi = f32::INFINITY;
            } else {
                if self.limit == LimitState::Low {
                    row.lo = 0.0;
                    row.hi = f32::INFINITY;
                } else {
                    row.lo = f32::NEG_INFINITY;
                    row.hi = 0.0;
                }
                if self.bounce > 0.0 {
                    let vel = if rotational {
                        let v = axis.dot(ctx.body1.angular_velocity);
                        ctx.body2.map_or(v, |b| v - axis.dot(b.angular_velocity))
                    } else {
                        let v = axis.dot(ctx.body1.linear_velocity);
                        ctx.body2.map_or(v, |b| v - axis.dot(b.linear_velocity))
                    };
                    // only incoming motion bounces
                    if self.limit == LimitState::Low && vel < 0.0 {
                        row.rhs = row.rhs.max(-self.bounce * vel);
                    } else if self.limit == LimitState::High && vel > 0.0 {
                        row.rhs = row.rhs.min(-self.bounce * vel);
                    }
                }
            }
        }
        out.push(row);
        true
    }
}
