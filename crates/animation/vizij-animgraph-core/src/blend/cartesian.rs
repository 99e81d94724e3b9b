//! 2D cartesian gradient-band blending.
//!
//! Child i's raw weight is the minimum over every other child j of
//! `clamp(1 - (p - p_i)·(p_j - p_i) / |p_j - p_i|², 0, 1)`; raw weights are then
//! normalized by their sum.

use super::{dot2, normalize};

/// Dense `n × n` table of `p_j - p_i`, indexed `i * n + j`.
pub fn pair_table(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let n = points.len();
    let mut table = vec![[0.0; 2]; n * n];
    for i in 0..n {
        for j in 0..n {
            table[i * n + j] = [points[j][0] - points[i][0], points[j][1] - points[i][1]];
        }
    }
    table
}

/// Normalized weights for parameter position `p`. Returns the raw sum as well.
pub fn weights(points: &[[f32; 2]], pairs: &[[f32; 2]], p: [f32; 2]) -> (Vec<f32>, f32) {
    let n = points.len();
    let mut out = vec![0.0; n];
    for i in 0..n {
        let pip = [p[0] - points[i][0], p[1] - points[i][1]];
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
            let r = (1.0 - dot2(pip, pipj) / len2).clamp(0.0, 1.0);
            minj = minj.min(r);
        }
        out[i] = minj;
    }
    let sum = normalize(&mut out);
    (out, sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_gets_full_weight() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let pairs = pair_table(&pts);
        let (w, _) = weights(&pts, &pairs, [1.0, 0.0]);
        assert_eq!(w, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn pair_table_is_antisymmetric() {
        let pts = [[0.0, 0.0], [2.0, 1.0]];
        let pairs = pair_table(&pts);
        assert_eq!(pairs[1], [2.0, 1.0]);
        assert_eq!(pairs[2], [-2.0, -1.0]);
    }
}
