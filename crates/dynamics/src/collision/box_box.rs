//! Box against box.
//!
//! Separating axis test over the 15 candidate axes (three face normals per
//! box and the nine edge-edge cross products). The axis of least overlap
//! decides the contact: a face axis clips the incident face of the other box
//! against the reference face, an edge axis yields the single closest point
//! between the two edges.

use glam::Vec3;

use super::ContactGeom;
use crate::geometry::{Frame, Shape};

#[derive(Debug, Clone, Copy)]
enum Feature {
    FaceA(usize),
    FaceB(usize),
    Edge(usize, usize),
}

struct Separation {
    depth: f32,
    normal: Vec3,
    feature: Feature,
}

fn projected_radius(frame: &Frame, half: Vec3, axis: Vec3) -> f32 {
    (0..3).map(|k| half[k] * frame.axis(k).dot(axis).abs()).sum()
}

pub(super) fn box_box(a: &Shape, fa: &Frame, b: &Shape, fb: &Frame, out: &mut Vec<ContactGeom>) {
    let (Shape::Box { half_extents: ha }, Shape::Box { half_extents: hb }) = (a, b) else {
        return;
    };
    let Some(sep) = least_overlap(fa, *ha, fb, *hb) else {
        return;
    };
    let start = out.len();
    match sep.feature {
        Feature::FaceA(i) => clip_faces(fa, *ha, i, sep.normal, fb, *hb, sep.normal, out),
        Feature::FaceB(j) => clip_faces(fb, *hb, j, -sep.normal, fa, *ha, sep.normal, out),
        Feature::Edge(i, j) => {
            out.push(edge_contact(fa, *ha, i, fb, *hb, j, sep.normal, sep.depth));
        }
    }
    if out.len() == start {
        // clipping lost every point to round-off; fall back to the centers
        let mid = (fa.position + fb.position) * 0.5;
        out.push(ContactGeom::new(mid, sep.normal, sep.depth));
    }
}

fn least_overlap(fa: &Frame, ha: Vec3, fb: &Frame, hb: Vec3) -> Option<Separation> {
    let d = fb.position - fa.position;
    let mut best: Option<Separation> = None;

    let mut consider = |axis: Vec3, feature: Feature, bias: f32| -> bool {
        let overlap = projected_radius(fa, ha, axis) + projected_radius(fb, hb, axis) - d.dot(axis).abs();
        if overlap < 0.0 {
            return false;
        }
        let normal = if d.dot(axis) < 0.0 { -axis } else { axis };
        if best.as_ref().map_or(true, |b| overlap * bias < b.depth) {
            best = Some(Separation {
                depth: overlap,
                normal,
                feature,
            });
        }
        true
    };

    for i in 0..3 {
        if !consider(fa.axis(i), Feature::FaceA(i), 1.0) {
            return None;
        }
    }
    for j in 0..3 {
        if !consider(fb.axis(j), Feature::FaceB(j), 1.0) {
            return None;
        }
    }
    for i in 0..3 {
        for j in 0..3 {
            let axis = fa.axis(i).cross(fb.axis(j));
            let len = axis.length();
            if len < 1e-5 {
                continue;
            }
            // edge axes must win clearly before they replace a face axis
            if !consider(axis / len, Feature::Edge(i, j), 1.05) {
                return None;
            }
        }
    }
    best
}

/// Clips the incident face of `inc` against the side planes of face `axis`
/// of `reference`. `outward` is the reference face normal pointing at the
/// incident box; `normal` is the reported contact normal.
#[allow(clippy::too_many_arguments)]
fn clip_faces(
    reference: &Frame,
    ref_half: Vec3,
    axis: usize,
    outward: Vec3,
    inc: &Frame,
    inc_half: Vec3,
    normal: Vec3,
    out: &mut Vec<ContactGeom>,
) {
    // incident face: the face of `inc` most anti-parallel to `outward`
    let mut inc_axis = 0;
    let mut best = f32::NEG_INFINITY;
    for k in 0..3 {
        let d = inc.axis(k).dot(outward).abs();
        if d > best {
            best = d;
            inc_axis = k;
        }
    }
    let sign = if inc.axis(inc_axis).dot(outward) > 0.0 { -1.0 } else { 1.0 };
    let face_center = inc.position + inc.axis(inc_axis) * (sign * inc_half[inc_axis]);
    let (u, v) = ((inc_axis + 1) % 3, (inc_axis + 2) % 3);
    let eu = inc.axis(u) * inc_half[u];
    let ev = inc.axis(v) * inc_half[v];
    let mut polygon = vec![
        face_center + eu + ev,
        face_center - eu + ev,
        face_center - eu - ev,
        face_center + eu - ev,
    ];

    for side in (0..3).filter(|&k| k != axis) {
        let dir = reference.axis(side);
        let limit = ref_half[side];
        let center = reference.position.dot(dir);
        polygon = clip_polygon(&polygon, dir, center + limit);
        polygon = clip_polygon(&polygon, -dir, -(center - limit));
        if polygon.is_empty() {
            return;
        }
    }

    let plane = outward.dot(reference.position) + ref_half[axis];
    for p in polygon {
        let depth = plane - outward.dot(p);
        if depth >= 0.0 {
            // halfway between the incident point and the reference face
            let on_reference = p + outward * depth;
            out.push(ContactGeom::new((p + on_reference) * 0.5, normal, depth));
        }
    }
}

/// Keeps the part of `polygon` with `dir . p <= limit`.
fn clip_polygon(polygon: &[Vec3], dir: Vec3, limit: f32) -> Vec<Vec3> {
    let mut result = Vec::with_capacity(polygon.len() + 2);
    for (k, &current) in polygon.iter().enumerate() {
        let next = polygon[(k + 1) % polygon.len()];
        let dc = dir.dot(current) - limit;
        let dn = dir.dot(next) - limit;
        if dc <= 0.0 {
            result.push(current);
        }
        if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
            let t = dc / (dc - dn);
            result.push(current + (next - current) * t);
        }
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn edge_contact(
    fa: &Frame,
    ha: Vec3,
    i: usize,
    fb: &Frame,
    hb: Vec3,
    j: usize,
    normal: Vec3,
    depth: f32,
) -> ContactGeom {
    // edge of A furthest along the normal, edge of B furthest against it
    let mut pa = fa.position;
    for k in (0..3).filter(|&k| k != i) {
        let s = if fa.axis(k).dot(normal) > 0.0 { 1.0 } else { -1.0 };
        pa += fa.axis(k) * (s * ha[k]);
    }
    let mut pb = fb.position;
    for k in (0..3).filter(|&k| k != j) {
        let s = if fb.axis(k).dot(normal) < 0.0 { 1.0 } else { -1.0 };
        pb += fb.axis(k) * (s * hb[k]);
    }
    let da = fa.axis(i);
    let db = fb.axis(j);
    let r = pa - pb;
    let b = da.dot(db);
    let denom = 1.0 - b * b;
    let (s, t) = if denom > 1e-9 {
        let c = da.dot(r);
        let f = db.dot(r);
        let s = ((b * f - c) / denom).clamp(-ha[i], ha[i]);
        let t = (b * s + f).clamp(-hb[j], hb[j]);
        (s, t)
    } else {
        (0.0, 0.0)
    };
    let on_a = pa + da * s;
    let on_b = pb + db * t;
    ContactGeom::new((on_a + on_b) * 0.5, normal, depth)
}
