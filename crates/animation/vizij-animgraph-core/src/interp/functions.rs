//! Interpolation helpers over flat value tuples:
//! - step_into (hold left)
//! - lerp_into (component-wise)
//! - nlerp_quat_into (shortest-arc quaternion NLERP)
//! - cardinal_into (four-point cardinal / Catmull-Rom spline)

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Normalize in place; zero-length tuples are left untouched.
#[inline]
pub fn normalize_in_place(q: &mut [f32]) {
    let len2 = dot(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        for c in q.iter_mut() {
            *c *= inv_len;
        }
    }
}

/// Step interpolation: copy the left sample.
#[inline]
pub fn step_into(a: &[f32], out: &mut [f32]) {
    out.copy_from_slice(a);
}

/// Component-wise linear interpolation.
#[inline]
pub fn lerp_into(a: &[f32], b: &[f32], t: f32, out: &mut [f32]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = lerp_f32(*x, *y, t);
    }
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0 the second quaternion is negated. The result is normalized.
#[inline]
pub fn nlerp_quat_into(a: &[f32], b: &[f32], t: f32, out: &mut [f32]) {
    let sign = if dot(a, b) < 0.0 { -1.0 } else { 1.0 };
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = lerp_f32(*x, *y * sign, t);
    }
    normalize_in_place(out);
}

/// Cubic Hermite basis weights (h00, h10, h01, h11) at `t`.
#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    (
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    )
}

/// Cardinal spline through p1..p2 using neighbours p0 and p3 for tangents.
///
/// `tension` 0 gives Catmull-Rom. At `t == 0` the result is exactly `p1`.
#[inline]
pub fn cardinal_into(
    p0: &[f32],
    p1: &[f32],
    p2: &[f32],
    p3: &[f32],
    tension: f32,
    t: f32,
    out: &mut [f32],
) {
    if t == 0.0 {
        out.copy_from_slice(p1);
        return;
    }
    let (h00, h10, h01, h11) = hermite_basis(t);
    let scale = (1.0 - tension) * 0.5;
    for i in 0..out.len() {
        let m1 = (p2[i] - p0[i]) * scale;
        let m2 = (p3[i] - p1[i]) * scale;
        out[i] = h00 * p1[i] + h10 * m1 + h01 * p2[i] + h11 * m2;
    }
}
