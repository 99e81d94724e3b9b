//! 2D directional (polar gradient-band) blending.
//!
//! Same min-over-pairs rule as the cartesian variant, but measured in a polar space:
//! the first axis is the relative change in magnitude, the second twice the signed
//! angle between the two directions. Points on a circle blend by angle alone.

use super::{dot2, normalize};

#[inline]
fn length(v: [f32; 2]) -> f32 {
    dot2(v, v).sqrt()
}

/// Signed angle from `a` to `b` in radians.
#[inline]
fn angle(a: [f32; 2], b: [f32; 2]) -> f32 {
    (a[0] * b[1] - a[1] * b[0]).atan2(a[0] * b[0] + a[1] * b[1])
}

#[inline]
fn polar(from: [f32; 2], from_len: f32, to: [f32; 2], to_len: f32, ref_len: f32) -> [f32; 2] {
    let avg = (ref_len + from_len) * 0.5;
    let radial = if avg > 0.0 {
        (to_len - from_len) / avg
    } else {
        0.0
    };
    [radial, angle(from, to) * 2.0]
}

/// Dense `n × n` table of polar differences from child i to child j.
pub fn pair_table(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let n = points.len();
    let lens: Vec<f32> = points.iter().map(|p| length(*p)).collect();
    let mut table = vec![[0.0; 2]; n * n];
    for i in 0..n {
        for j in 0..n {
            table[i * n + j] = polar(points[i], lens[i], points[j], lens[j], lens[j]);
        }
    }
    table
}

/// Normalized weights for parameter direction `p`. Returns the raw sum as well.
pub fn weights(points: &[[f32; 2]], pairs: &[[f32; 2]], p: [f32; 2]) -> (Vec<f32>, f32) {
    let n = points.len();
    let p_len = length(p);
    let mut out = vec![0.0; n];
    for i in 0..n {
        let li = length(points[i]);
        let mut minj = 1.0f32;
        for j in 0..n {
            if i == j {
                continue;
            }
            let pipj = pairs[i * n + j];
            let len2 = dot2(pipj, pipj);
            if len2 <= 0.0 {
                continue;
            }
            let lj = length(points[j]);
            let ip = polar(points[i], li, p, p_len, lj);
            let r = (1.0 - dot2(ip, pipj) / len2).clamp(0.0, 1.0);
            minj = minj.min(r);
        }
        out[i] = minj;
    }
    let sum = normalize(&mut out);
    (out, sum)
}
