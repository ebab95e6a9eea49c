//! # Vector and Rotation Helpers
//!
//! `glam` supplies the vector, matrix and quaternion types. This module adds
//! the handful of operations rigid body dynamics needs on top of them.

use glam::{Mat3, Quat, Vec3};

/// Lengths below this are treated as zero when normalising.
pub const EPSILON: f32 = 1e-9;

/// Two unit vectors `p` and `q` such that `(n, p, q)` is orthonormal.
///
/// `n` must be unit length. The choice is deterministic: the vectors only
/// depend on `n`.
#[must_use]
pub fn plane_space(n: Vec3) -> (Vec3, Vec3) {
    if n.z.abs() > std::f32::consts::FRAC_1_SQRT_2 {
        // choose p in the y-z plane
        let a = n.y * n.y + n.z * n.z;
        let k = 1.0 / a.sqrt();
        let p = Vec3::new(0.0, -n.z * k, n.y * k);
        let q = Vec3::new(a * k, -n.x * p.z, n.x * p.y);
        (p, q)
    } else {
        // choose p in the x-y plane
        let a = n.x * n.x + n.y * n.y;
        let k = 1.0 / a.sqrt();
        let p = Vec3::new(-n.y * k, n.x * k, 0.0);
        let q = Vec3::new(-n.z * p.y, n.z * p.x, a * k);
        (p, q)
    }
}

/// Matrix `[v]x` such that `[v]x * u == v.cross(u)`.
#[must_use]
pub fn cross_matrix(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

/// Normalises `v`, reporting `None` for vectors too short to carry a direction.
#[must_use]
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if len > EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Advances an orientation by the world-frame angular velocity `w` over `dt`.
///
/// The first-order form adds the quaternion rate `0.5 * (w, 0) * q`. The
/// finite form rotates by the exact axis-angle increment, which keeps fast
/// spinning bodies from drifting. Both renormalise.
#[must_use]
pub fn integrate_orientation(q: Quat, w: Vec3, dt: f32, finite: bool) -> Quat {
    let next = if finite {
        let speed = w.length();
        let angle = speed * dt;
        if angle > 1e-4 {
            Quat::from_axis_angle(w / speed, angle) * q
        } else {
            first_order(q, w, dt)
        }
    } else {
        first_order(q, w, dt)
    };
    let len = next.length();
    if len > EPSILON && len.is_finite() {
        next / len
    } else {
        Quat::IDENTITY
    }
}

fn first_order(q: Quat, w: Vec3, dt: f32) -> Quat {
    let rate = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * q;
    q + rate * (0.5 * dt)
}

/// Rotation matrix as 12 floats, row-major with a zero fourth column.
#[must_use]
pub fn rotation_3x4(r: Mat3) -> [f32; 12] {
    let rows = [r.row(0), r.row(1), r.row(2)];
    let mut out = [0.0; 12];
    for (i, row) in rows.iter().enumerate() {
        out[i * 4] = row.x;
        out[i * 4 + 1] = row.y;
        out[i * 4 + 2] = row.z;
    }
    out
}

/// Sylvester's criterion on a symmetric 3x3 matrix.
#[must_use]
pub fn is_positive_definite(m: Mat3) -> bool {
    let a = m.x_axis.x;
    let minor2 = m.x_axis.x * m.y_axis.y - m.y_axis.x * m.x_axis.y;
    a > 0.0 && minor2 > 0.0 && m.determinant() > 0.0
}

#[must_use]
pub fn is_symmetric(m: Mat3, tolerance: f32) -> bool {
    let diff = m - m.transpose();
    diff.x_axis.abs().max_element() <= tolerance
        && diff.y_axis.abs().max_element() <= tolerance
        && diff.z_axis.abs().max_element() <= tolerance
}
