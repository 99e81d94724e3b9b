//! Blend trees: per-parameter weighting of clips and nested trees.
//!
//! Weight rules live in pure functions (`one_d`, `cartesian`, `directional`, `direct`).
//! A [`BlendTree`] stores the result once per frame and only recomputes it when one of the
//! parameters it reads has changed.

pub mod cartesian;
pub mod direct;
pub mod directional;
pub mod one_d;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::AnimTrack;
use crate::error::GraphError;
use crate::events::EventQueue;
use crate::parameters::Parameters;
use crate::pose::{PoseAccumulator, TargetTable};
use crate::snapshot::AnimSnapshot;

#[inline]
pub(crate) fn dot2(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

/// Divide by the sum when positive; returns the raw sum.
pub(crate) fn normalize(weights: &mut [f32]) -> f32 {
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter_mut().for_each(|w| *w /= sum);
    }
    sum
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BlendKind {
    #[serde(rename = "1d")]
    OneD,
    #[serde(rename = "2d_cartesian")]
    Cartesian2D,
    #[serde(rename = "2d_directional")]
    Directional2D,
    #[serde(rename = "direct")]
    Direct,
}

impl BlendKind {
    /// Parameters read by a tree of this kind with `children` children.
    pub fn parameter_count(self, children: usize) -> usize {
        match self {
            BlendKind::OneD => 1,
            BlendKind::Cartesian2D | BlendKind::Directional2D => 2,
            BlendKind::Direct => children,
        }
    }
}

/// Leaf playback of one track.
#[derive(Clone, Debug)]
pub struct ClipNode {
    track: Arc<AnimTrack>,
    /// Target index per curve.
    targets: Vec<usize>,
    snapshot: AnimSnapshot,
    speed: f32,
}

impl ClipNode {
    /// Bind `track`'s curves into `table`.
    pub fn new(
        track: Arc<AnimTrack>,
        speed: f32,
        table: &mut TargetTable,
    ) -> Result<Self, GraphError> {
        if !speed.is_finite() {
            return Err(GraphError::MalformedBlendTree {
                reason: format!("clip '{}' has a non-finite speed", track.name),
            });
        }
        let targets = table.bind_track(&track)?;
        let snapshot = AnimSnapshot::new(&track);
        Ok(Self {
            track,
            targets,
            snapshot,
            speed,
        })
    }

    #[inline]
    pub fn track(&self) -> &AnimTrack {
        &self.track
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.track.duration
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.snapshot.time()
    }

    pub fn set_time(&mut self, time: f32) {
        self.snapshot.set_time(time);
    }

    /// Move the playhead by `delta` seconds of clip time.
    fn step(&mut self, delta: f32, looping: bool) {
        let duration = self.duration();
        if duration <= 0.0 {
            self.snapshot.set_time(0.0);
            return;
        }
        let t = self.snapshot.time() + delta;
        let t = if looping {
            t.rem_euclid(duration)
        } else {
            t.clamp(0.0, duration)
        };
        self.snapshot.set_time(t);
    }

    fn accumulate(&mut self, weight: f32, acc: &mut PoseAccumulator) -> Result<(), GraphError> {
        self.snapshot.evaluate(&self.track)?;
        for (curve, &target) in self.targets.iter().enumerate() {
            acc.add(target, self.snapshot.result(curve), weight);
        }
        Ok(())
    }
}

/// Anything a state or a blend child can play.
#[derive(Clone, Debug)]
pub enum Motion {
    Clip(ClipNode),
    Tree(Box<BlendTree>),
}

impl Motion {
    /// Recompute blend weights throughout the motion.
    pub fn update_weights(&mut self, params: &Parameters, events: &mut EventQueue) {
        if let Motion::Tree(tree) = self {
            tree.calculate_weights(params, events);
            for child in &mut tree.children {
                child.motion.update_weights(params, events);
            }
        }
    }

    /// Wall-clock seconds for one loop at `speed`, weighted by the current blend.
    pub fn cycle_duration(&self, speed: f32) -> f32 {
        match self {
            Motion::Clip(clip) => {
                let abs = (speed * clip.speed).abs();
                if abs > 0.0 {
                    clip.duration() / abs
                } else {
                    0.0
                }
            }
            Motion::Tree(tree) => tree
                .children
                .iter()
                .zip(&tree.weights)
                .map(|(child, w)| w * child.motion.cycle_duration(speed * child.speed))
                .sum(),
        }
    }

    /// Advance every leaf by `dt` wall-clock seconds at `speed`.
    ///
    /// Leaves with zero weight still move so synced children stay in phase.
    pub fn advance(&mut self, dt: f32, speed: f32, looping: bool) {
        match self {
            Motion::Clip(clip) => clip.step(dt * speed * clip.speed, looping),
            Motion::Tree(tree) => tree.advance(dt, speed, looping),
        }
    }

    /// Put every leaf at fraction `u` of its own clip.
    pub fn set_normalized_time(&mut self, u: f32) {
        match self {
            Motion::Clip(clip) => {
                let d = clip.duration();
                clip.set_time(u.clamp(0.0, 1.0) * d);
            }
            Motion::Tree(tree) => {
                for child in &mut tree.children {
                    child.motion.set_normalized_time(u);
                }
            }
        }
    }

    /// Sample every leaf above `epsilon` effective weight into `acc`.
    pub fn accumulate(
        &mut self,
        weight: f32,
        epsilon: f32,
        acc: &mut PoseAccumulator,
    ) -> Result<(), GraphError> {
        if weight <= epsilon {
            return Ok(());
        }
        match self {
            Motion::Clip(clip) => clip.accumulate(weight, acc),
            Motion::Tree(tree) => {
                for (child, &w) in tree.children.iter_mut().zip(&tree.weights) {
                    child.motion.accumulate(weight * w, epsilon, acc)?;
                }
                Ok(())
            }
        }
    }

    /// Leaf clips in depth-first order.
    pub fn clips(&self) -> Vec<&ClipNode> {
        let mut out = Vec::new();
        self.collect_clips(&mut out);
        out
    }

    fn collect_clips<'a>(&'a self, out: &mut Vec<&'a ClipNode>) {
        match self {
            Motion::Clip(clip) => out.push(clip),
            Motion::Tree(tree) => {
                for child in &tree.children {
                    child.motion.collect_clips(out);
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlendChild {
    pub motion: Motion,
    /// Position in parameter space; 1D trees use `point[0]`.
    pub point: [f32; 2],
    /// Playback speed multiplier.
    pub speed: f32,
}

#[derive(Copy, Clone, Debug)]
struct LeafTiming {
    weight: f32,
    duration: f32,
    speed: f32,
}

#[derive(Clone, Debug)]
pub struct BlendTree {
    kind: BlendKind,
    parameters: Vec<String>,
    children: Vec<BlendChild>,
    sync_durations: bool,
    /// Dense `n × n` pair table for the 2D kinds, empty otherwise.
    pairs: Vec<[f32; 2]>,
    weights: Vec<f32>,
    weighted_speeds: Vec<f32>,
    seen_generations: Vec<Option<u64>>,
    seen_values: Vec<f32>,
    evaluated: bool,
    evaluations: u64,
}

impl BlendTree {
    /// Validate and build a tree. 1D children are reordered by point.
    pub fn new(
        kind: BlendKind,
        parameters: Vec<String>,
        mut children: Vec<BlendChild>,
        sync_durations: bool,
    ) -> Result<Self, GraphError> {
        if children.is_empty() {
            return Err(GraphError::MalformedBlendTree {
                reason: "blend tree has no children".into(),
            });
        }
        let expected = kind.parameter_count(children.len());
        if parameters.len() != expected {
            return Err(GraphError::MalformedBlendTree {
                reason: format!(
                    "{kind:?} tree with {} children needs {expected} parameters, got {}",
                    children.len(),
                    parameters.len()
                ),
            });
        }
        for (i, child) in children.iter().enumerate() {
            if !child.point.iter().all(|c| c.is_finite()) || !child.speed.is_finite() {
                return Err(GraphError::MalformedBlendTree {
                    reason: format!("child {i} has a non-finite point or speed"),
                });
            }
        }
        if kind == BlendKind::OneD {
            children.sort_by(|a, b| a.point[0].total_cmp(&b.point[0]));
        }
        let n = children.len();
        let mut tree = Self {
            kind,
            seen_generations: vec![None; parameters.len()],
            seen_values: vec![0.0; parameters.len()],
            parameters,
            children,
            sync_durations,
            pairs: Vec::new(),
            weights: vec![0.0; n],
            weighted_speeds: Vec::new(),
            evaluated: false,
            evaluations: 0,
        };
        tree.rebuild_pairs();
        Ok(tree)
    }

    fn rebuild_pairs(&mut self) {
        let points: Vec<[f32; 2]> = self.children.iter().map(|c| c.point).collect();
        self.pairs = match self.kind {
            BlendKind::Cartesian2D => cartesian::pair_table(&points),
            BlendKind::Directional2D => directional::pair_table(&points),
            BlendKind::OneD | BlendKind::Direct => Vec::new(),
        };
    }

    #[inline]
    pub fn kind(&self) -> BlendKind {
        self.kind
    }

    #[inline]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    #[inline]
    pub fn children(&self) -> &[BlendChild] {
        &self.children
    }

    #[inline]
    pub fn sync_durations(&self) -> bool {
        self.sync_durations
    }

    /// Weights from the last evaluation, aligned with `children()`.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Per-leaf clip-seconds per wall-clock second from the last synced advance,
    /// in depth-first leaf order. Empty unless `sync_durations` is set.
    ///
    /// Each factor is `sign(a) * d / T` with `T = sum(w * d / |a|)`, so every leaf finishes
    /// a loop in `T` seconds. This is the rate time advances at, not the cycle-length ratio
    /// `(d / |a|) / T`; the two only agree for leaves whose absolute speed is 1.
    #[inline]
    pub fn weighted_speeds(&self) -> &[f32] {
        &self.weighted_speeds
    }

    /// Number of times weights were actually recomputed.
    #[inline]
    pub fn weight_evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Append a child and drop cached pair data and weights.
    pub fn push_child(&mut self, child: BlendChild) -> Result<(), GraphError> {
        if self.kind == BlendKind::Direct {
            return Err(GraphError::MalformedBlendTree {
                reason: "direct trees need one parameter per child".into(),
            });
        }
        self.children.push(child);
        if self.kind == BlendKind::OneD {
            self.children
                .sort_by(|a, b| a.point[0].total_cmp(&b.point[0]));
        }
        self.weights = vec![0.0; self.children.len()];
        self.evaluated = false;
        self.rebuild_pairs();
        Ok(())
    }

    /// Refresh weights if any parameter the tree reads changed since the last call.
    pub fn calculate_weights(&mut self, params: &Parameters, events: &mut EventQueue) -> &[f32] {
        let mut changed = !self.evaluated;
        for (seen, name) in self.seen_generations.iter_mut().zip(&self.parameters) {
            let generation = params.generation(name);
            if *seen != generation {
                *seen = generation;
                changed = true;
            }
        }
        if !changed {
            return &self.weights;
        }

        let mut values = Vec::with_capacity(self.parameters.len());
        for name in &self.parameters {
            match params.numeric(name) {
                Some(v) => values.push(v),
                None => {
                    events.diagnostic(GraphError::MissingParameter { name: name.clone() });
                    values.push(0.0);
                }
            }
        }
        if self.evaluated && values == self.seen_values {
            return &self.weights;
        }
        self.seen_values = values;
        self.evaluated = true;
        self.evaluations += 1;

        let v = &self.seen_values;
        self.weights = match self.kind {
            BlendKind::OneD => {
                let points: Vec<f32> = self.children.iter().map(|c| c.point[0]).collect();
                one_d::weights(&points, v[0])
            }
            BlendKind::Cartesian2D | BlendKind::Directional2D => {
                let points: Vec<[f32; 2]> = self.children.iter().map(|c| c.point).collect();
                let p = [v[0], v[1]];
                let (weights, sum) = if self.kind == BlendKind::Cartesian2D {
                    cartesian::weights(&points, &self.pairs, p)
                } else {
                    directional::weights(&points, &self.pairs, p)
                };
                if sum <= 0.0 {
                    events.diagnostic(GraphError::DegenerateBlend {
                        reason: format!(
                            "no child of {:?} tree covers ({}, {})",
                            self.kind, p[0], p[1]
                        ),
                    });
                }
                weights
            }
            BlendKind::Direct => direct::weights(v),
        };
        &self.weights
    }

    fn advance(&mut self, dt: f32, speed: f32, looping: bool) {
        if !self.sync_durations {
            for child in &mut self.children {
                child.motion.advance(dt, speed * child.speed, looping);
            }
            return;
        }

        let mut leaves = Vec::new();
        self.collect_leaves(1.0, speed, &mut leaves);
        let total: f32 = leaves
            .iter()
            .filter(|l| l.speed != 0.0)
            .map(|l| l.weight * l.duration / l.speed.abs())
            .sum();
        self.weighted_speeds.clear();
        self.weighted_speeds.extend(leaves.iter().map(|l| {
            if total > 0.0 {
                if l.speed == 0.0 {
                    0.0
                } else {
                    l.speed.signum() * l.duration / total
                }
            } else {
                l.speed
            }
        }));
        let factors = std::mem::take(&mut self.weighted_speeds);
        let mut cursor = 0;
        self.step_leaves(dt, &factors, &mut cursor, looping);
        self.weighted_speeds = factors;
    }

    fn collect_leaves(&self, weight: f32, speed: f32, out: &mut Vec<LeafTiming>) {
        for (child, &w) in self.children.iter().zip(&self.weights) {
            let s = speed * child.speed;
            match &child.motion {
                Motion::Clip(clip) => out.push(LeafTiming {
                    weight: weight * w,
                    duration: clip.duration(),
                    speed: s * clip.speed,
                }),
                Motion::Tree(tree) => tree.collect_leaves(weight * w, s, out),
            }
        }
    }

    fn step_leaves(&mut self, dt: f32, factors: &[f32], cursor: &mut usize, looping: bool) {
        for child in &mut self.children {
            match &mut child.motion {
                Motion::Clip(clip) => {
                    let factor = factors.get(*cursor).copied().unwrap_or(0.0);
                    clip.step(dt * factor, looping);
                    *cursor += 1;
                }
                Motion::Tree(tree) => tree.step_leaves(dt, factors, cursor, looping),
            }
        }
    }
}
