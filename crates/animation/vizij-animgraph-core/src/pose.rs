//! Target tables, poses and weighted accumulation.
//!
//! Target paths are resolved to dense indices once when a controller is built; the
//! per-frame path only touches flat `f32` buffers.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::data::{AnimTrack, CurveKind};
use crate::error::GraphError;
use crate::interp::functions::{dot, normalize_in_place};

/// Dense lookup from target path to index, width and buffer offset.
#[derive(Clone, Debug, Default)]
pub struct TargetTable {
    index: HashMap<String, usize>,
    names: Vec<String>,
    widths: Vec<usize>,
    kinds: Vec<CurveKind>,
    offsets: Vec<usize>,
    total: usize,
}

impl TargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target or return its existing index.
    pub fn insert(
        &mut self,
        path: &str,
        width: usize,
        kind: CurveKind,
    ) -> Result<usize, GraphError> {
        if let Some(&idx) = self.index.get(path) {
            if self.widths[idx] != width {
                return Err(GraphError::TargetMismatch {
                    target: path.to_string(),
                    expected: self.widths[idx],
                    actual: width,
                });
            }
            return Ok(idx);
        }
        let idx = self.names.len();
        self.index.insert(path.to_string(), idx);
        self.names.push(path.to_string());
        self.widths.push(width);
        self.kinds.push(kind);
        self.offsets.push(self.total);
        self.total += width;
        Ok(idx)
    }

    /// Register every curve of `track`; returns the target index of each curve.
    pub fn bind_track(&mut self, track: &AnimTrack) -> Result<Vec<usize>, GraphError> {
        track
            .curves
            .iter()
            .enumerate()
            .map(|(i, curve)| self.insert(&curve.target, track.components(i), curve.kind))
            .collect()
    }

    #[inline]
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    #[inline]
    pub fn width(&self, idx: usize) -> usize {
        self.widths[idx]
    }

    #[inline]
    pub fn kind(&self, idx: usize) -> CurveKind {
        self.kinds[idx]
    }

    #[inline]
    fn range(&self, idx: usize) -> std::ops::Range<usize> {
        self.offsets[idx]..self.offsets[idx] + self.widths[idx]
    }

    /// Total floats across all targets.
    #[inline]
    pub fn total_width(&self) -> usize {
        self.total
    }
}

/// Evaluated values per target. Targets nothing contributed to are absent.
#[derive(Clone, Debug)]
pub struct Pose {
    table: Arc<TargetTable>,
    values: Vec<f32>,
    present: Vec<bool>,
}

impl Pose {
    pub fn new(table: Arc<TargetTable>) -> Self {
        Self {
            values: vec![0.0; table.total_width()],
            present: vec![false; table.len()],
            table,
        }
    }

    #[inline]
    pub fn table(&self) -> &TargetTable {
        &self.table
    }

    pub fn get(&self, path: &str) -> Option<&[f32]> {
        self.table.index_of(path).and_then(|idx| self.value(idx))
    }

    pub fn value(&self, idx: usize) -> Option<&[f32]> {
        if *self.present.get(idx)? {
            Some(&self.values[self.table.range(idx)])
        } else {
            None
        }
    }

    /// Number of targets with a value.
    pub fn len(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.present.iter().any(|p| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> + '_ {
        (0..self.table.len())
            .filter_map(move |idx| self.value(idx).map(|v| (self.table.name(idx), v)))
    }

    /// Owned path → value map, convenient for hosts and tests.
    pub fn to_map(&self) -> HashMap<String, Vec<f32>> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect()
    }

    pub fn clear(&mut self) {
        self.present.iter_mut().for_each(|p| *p = false);
    }

    /// Write `value` into target `idx`.
    pub fn set(&mut self, idx: usize, value: &[f32]) {
        let range = self.table.range(idx);
        self.values[range].copy_from_slice(value);
        self.present[idx] = true;
    }
}

/// Weighted sums per target, reused frame to frame.
///
/// Vector targets finalize to `sum / total_weight`. Quaternion targets are sign-aligned
/// against the running sum before adding and normalized on finalize.
#[derive(Clone, Debug)]
pub struct PoseAccumulator {
    table: Arc<TargetTable>,
    sums: Vec<f32>,
    weights: Vec<f32>,
}

impl PoseAccumulator {
    pub fn new(table: Arc<TargetTable>) -> Self {
        Self {
            sums: vec![0.0; table.total_width()],
            weights: vec![0.0; table.len()],
            table,
        }
    }

    pub fn clear(&mut self) {
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.weights.iter_mut().for_each(|w| *w = 0.0);
    }

    pub fn add(&mut self, idx: usize, value: &[f32], weight: f32) {
        if weight <= 0.0 {
            return;
        }
        let range = self.table.range(idx);
        let sum = &mut self.sums[range];
        let sign = if self.table.kind(idx) == CurveKind::Quaternion && dot(sum, value) < 0.0 {
            -1.0
        } else {
            1.0
        };
        for (s, v) in sum.iter_mut().zip(value) {
            *s += v * weight * sign;
        }
        self.weights[idx] += weight;
    }

    /// Write the blended result of every touched target into `pose`.
    pub fn finalize_into(&self, pose: &mut Pose) {
        pose.clear();
        for idx in 0..self.table.len() {
            let w = self.weights[idx];
            if w <= 0.0 {
                continue;
            }
            let range = self.table.range(idx);
            let out = &mut pose.values[range.clone()];
            for (o, s) in out.iter_mut().zip(&self.sums[range]) {
                *o = s / w;
            }
            if self.table.kind(idx) == CurveKind::Quaternion {
                normalize_in_place(out);
            }
            pose.present[idx] = true;
        }
    }
}
