//! Curve sampling over a track's input/output arrays.
//!
//! Model:
//! - An input array is a non-decreasing list of sample times shared by one or more curves.
//! - For a query time we find the bracketing keys [left, right] and the local fraction.
//! - `KeyCache` remembers the last bracket per input so monotonic playback only scans forward;
//!   a query before the cached left key invalidates it and falls back to a binary search.
//! - Times at or before the first key return the first sample; at or after the last key the
//!   last sample. Neither case interpolates.

use tracing::trace;

use crate::data::{AnimData, AnimTrack, CurveKind, Interpolation};
use crate::error::GraphError;
use crate::interp::functions::normalize_in_place;
use crate::interp::{cardinal_into, lerp_into, nlerp_quat_into, step_into};

/// Forward steps tried from the cached bracket before falling back to a binary search.
const MAX_FORWARD_SCAN: usize = 4;

/// Bracketing keys for one query. `left == right` means "clamped, no interpolation".
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    pub left: usize,
    pub right: usize,
    /// Local fraction in [0, 1) between `left` and `right`.
    pub t: f32,
}

impl Segment {
    #[inline]
    fn clamped(index: usize) -> Self {
        Self {
            left: index,
            right: index,
            t: 0.0,
        }
    }
}

/// Last bracket found on one input array.
#[derive(Clone, Debug, Default)]
pub struct KeyCache {
    left: usize,
    right: usize,
    left_time: f32,
    right_time: f32,
    valid: bool,
    full_searches: u64,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Cached (left, right) key indices, if any.
    #[inline]
    pub fn bracket(&self) -> Option<(usize, usize)> {
        self.valid.then_some((self.left, self.right))
    }

    /// Number of binary searches performed (cache misses).
    #[inline]
    pub fn full_searches(&self) -> u64 {
        self.full_searches
    }

    fn store(&mut self, times: &[f32], left: usize, right: usize) {
        self.left = left;
        self.right = right;
        self.left_time = times[left];
        self.right_time = times[right];
        self.valid = true;
    }

    /// Locate `time` in `times`, reusing and updating the cached bracket.
    pub fn locate(&mut self, times: &[f32], time: f32) -> Segment {
        let n = times.len();
        if n == 0 {
            self.valid = false;
            return Segment::clamped(0);
        }
        if n == 1 || time.is_nan() || time <= times[0] {
            return Segment::clamped(0);
        }
        if time >= times[n - 1] {
            return Segment::clamped(n - 1);
        }

        if self.valid && self.right < n && time >= self.left_time {
            if time < self.right_time {
                return self.segment(time);
            }
            let mut left = self.left;
            let mut right = self.right;
            let mut steps = 0;
            while right < n - 1 && times[right] <= time && steps < MAX_FORWARD_SCAN {
                left = right;
                right += 1;
                steps += 1;
            }
            if times[left] <= time && time < times[right] {
                self.store(times, left, right);
                return self.segment(time);
            }
        } else if self.valid {
            trace!(
                time,
                cached = self.left_time,
                "key cache invalidated by backward jump"
            );
        }

        // time is not NaN and strictly inside (times[0], times[n-1]), so right is in [1, n-1].
        let right = times.partition_point(|&x| x <= time);
        self.full_searches += 1;
        self.store(times, right - 1, right);
        self.segment(time)
    }

    #[inline]
    fn segment(&self, time: f32) -> Segment {
        let span = self.right_time - self.left_time;
        let t = if span > 0.0 {
            ((time - self.left_time) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Segment {
            left: self.left,
            right: self.right,
            t,
        }
    }
}

fn curve_error(track: &AnimTrack, curve: usize) -> GraphError {
    GraphError::InvalidTrack {
        track: track.name.clone(),
        reason: format!("curve {curve} does not exist"),
    }
}

/// Sample curve `curve` of `track` at `time` through `cache`, writing into `out`.
///
/// `out` must be exactly as wide as the curve's output components.
pub fn sample_curve_cached(
    track: &AnimTrack,
    curve: usize,
    time: f32,
    cache: &mut KeyCache,
    out: &mut [f32],
) -> Result<(), GraphError> {
    let desc = track.curves.get(curve).ok_or_else(|| curve_error(track, curve))?;
    let times = track
        .inputs
        .get(desc.input)
        .ok_or_else(|| curve_error(track, curve))?;
    let values = track
        .outputs
        .get(desc.output)
        .ok_or_else(|| curve_error(track, curve))?;
    if times.is_empty() || values.is_empty() {
        return Err(GraphError::EmptyCurve {
            track: track.name.clone(),
            curve,
        });
    }
    debug_assert_eq!(out.len(), values.components);

    let seg = cache.locate(times, time);
    if seg.left == seg.right || seg.t == 0.0 {
        step_into(values.tuple(seg.left), out);
        return Ok(());
    }

    let a = values.tuple(seg.left);
    let b = values.tuple(seg.right);
    match (desc.interpolation, desc.kind) {
        (Interpolation::Step, _) => step_into(a, out),
        (Interpolation::Linear, CurveKind::Vector) => lerp_into(a, b, seg.t, out),
        (Interpolation::Linear, CurveKind::Quaternion) => nlerp_quat_into(a, b, seg.t, out),
        (Interpolation::CatmullRom, kind) => {
            spline_into(values, seg, 0.0, out);
            if kind == CurveKind::Quaternion {
                normalize_in_place(out);
            }
        }
        (Interpolation::Cardinal { tension }, kind) => {
            spline_into(values, seg, tension, out);
            if kind == CurveKind::Quaternion {
                normalize_in_place(out);
            }
        }
    }
    Ok(())
}

/// Four-point spline; neighbours past either end duplicate the boundary sample.
fn spline_into(values: &AnimData, seg: Segment, tension: f32, out: &mut [f32]) {
    let last = values.len() - 1;
    let p0 = values.tuple(seg.left.saturating_sub(1));
    let p1 = values.tuple(seg.left);
    let p2 = values.tuple(seg.right);
    let p3 = values.tuple((seg.right + 1).min(last));
    cardinal_into(p0, p1, p2, p3, tension, seg.t, out);
}

/// Stateless sample of one curve (binary search, no cache reuse).
pub fn sample_curve(track: &AnimTrack, curve: usize, time: f32) -> Result<Vec<f32>, GraphError> {
    let desc = track.curves.get(curve).ok_or_else(|| curve_error(track, curve))?;
    let width = track
        .outputs
        .get(desc.output)
        .map(|o| o.components)
        .ok_or_else(|| curve_error(track, curve))?;
    let mut out = vec![0.0; width];
    let mut cache = KeyCache::new();
    sample_curve_cached(track, curve, time, &mut cache, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_clamps_at_ends() {
        let times = [0.0, 1.0, 2.0];
        let mut cache = KeyCache::new();
        assert_eq!(cache.locate(&times, -1.0), Segment::clamped(0));
        assert_eq!(cache.locate(&times, 5.0), Segment::clamped(2));
        assert!(!cache.is_valid());
    }

    #[test]
    fn forward_scan_reuses_cache() {
        let times = [0.0, 1.0, 2.0, 3.0, 4.0];
        let mut cache = KeyCache::new();
        cache.locate(&times, 0.5);
        assert_eq!(cache.full_searches(), 1);
        for step in 1..30 {
            cache.locate(&times, 0.5 + step as f32 * 0.1);
        }
        assert_eq!(cache.full_searches(), 1);
        assert_eq!(cache.bracket(), Some((3, 4)));
    }

    #[test]
    fn backward_jump_researches() {
        let times = [0.0, 1.0, 2.0, 3.0, 4.0];
        let mut cache = KeyCache::new();
        cache.locate(&times, 3.5);
        let seg = cache.locate(&times, 0.25);
        assert_eq!((seg.left, seg.right), (0, 1));
        assert!((seg.t - 0.25).abs() < 1e-6);
        assert_eq!(cache.full_searches(), 2);
    }

    #[test]
    fn large_forward_jump_falls_back_to_search() {
        let times: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let mut cache = KeyCache::new();
        cache.locate(&times, 0.5);
        let seg = cache.locate(&times, 80.5);
        assert_eq!((seg.left, seg.right), (80, 81));
        assert_eq!(cache.full_searches(), 2);
    }
}
