//! 1D blending: linear interpolation between the two children bracketing the parameter.

/// Weights for children at sorted `points` given parameter `value`.
///
/// Values outside the covered range clamp to the nearest end child.
pub fn weights(points: &[f32], value: f32) -> Vec<f32> {
    let n = points.len();
    let mut out = vec![0.0; n];
    if n == 0 {
        return out;
    }
    if n == 1 || value <= points[0] {
        out[0] = 1.0;
        return out;
    }
    if value >= points[n - 1] {
        out[n - 1] = 1.0;
        return out;
    }
    for i in 0..n - 1 {
        let (a, b) = (points[i], points[i + 1]);
        if value >= a && value <= b {
            let span = b - a;
            if span <= 0.0 {
                out[i] = 1.0;
            } else {
                let t = (value - a) / span;
                out[i] = 1.0 - t;
                out[i + 1] = t;
            }
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_bracketing_pair() {
        let w = weights(&[0.0, 1.0, 3.0], 2.0);
        assert_eq!(w, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn clamps_outside_range() {
        assert_eq!(weights(&[0.0, 1.0], -4.0), vec![1.0, 0.0]);
        assert_eq!(weights(&[0.0, 1.0], 9.0), vec![0.0, 1.0]);
    }

    #[test]
    fn exact_point_selects_child() {
        assert_eq!(weights(&[0.0, 1.0, 2.0], 1.0), vec![0.0, 1.0, 0.0]);
    }
}
