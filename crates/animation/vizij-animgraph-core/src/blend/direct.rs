//! Direct blending: each child is weighted by its own parameter.

/// Negative parameter values count as zero. A zero sum yields all-zero weights.
pub fn weights(values: &[f32]) -> Vec<f32> {
    let mut out: Vec<f32> = values.iter().map(|v| v.max(0.0)).collect();
    let sum: f32 = out.iter().sum();
    if sum > 0.0 {
        out.iter_mut().for_each(|w| *w /= sum);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_by_sum() {
        let w = weights(&[1.0, 3.0]);
        assert_eq!(w, vec![0.25, 0.75]);
    }

    #[test]
    fn negative_values_are_ignored() {
        assert_eq!(weights(&[-2.0, 0.5]), vec![0.0, 1.0]);
    }

    #[test]
    fn zero_sum_stays_zero() {
        let w = weights(&[0.0, 0.0]);
        assert_eq!(w, vec![0.0, 0.0]);
        assert!(w.iter().all(|x| x.is_finite()));
    }
}
