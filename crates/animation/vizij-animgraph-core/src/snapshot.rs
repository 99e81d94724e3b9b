//! Per-playback scratch state for one track.
//!
//! A snapshot keeps the current playback time, one `KeyCache` per input array and one
//! result buffer per curve. Buffers are sized once from the track and never resized, so
//! evaluating a frame does not allocate.

use crate::data::AnimTrack;
use crate::error::GraphError;
use crate::sampling::{sample_curve_cached, KeyCache};

#[derive(Clone, Debug)]
pub struct AnimSnapshot {
    time: f32,
    caches: Vec<KeyCache>,
    results: Vec<Vec<f32>>,
}

impl AnimSnapshot {
    pub fn new(track: &AnimTrack) -> Self {
        let results = track
            .curves
            .iter()
            .map(|c| {
                let width = track.outputs.get(c.output).map_or(0, |o| o.components);
                vec![0.0; width]
            })
            .collect();
        Self {
            time: 0.0,
            caches: vec![KeyCache::new(); track.inputs.len()],
            results,
        }
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Sample one curve at `time`, updating that curve's input cache and result buffer.
    pub fn sample(
        &mut self,
        track: &AnimTrack,
        curve: usize,
        time: f32,
    ) -> Result<&[f32], GraphError> {
        let (input, out) = match (track.curves.get(curve), self.results.get_mut(curve)) {
            (Some(desc), Some(out)) => (desc.input, out),
            _ => {
                return Err(GraphError::InvalidTrack {
                    track: track.name.clone(),
                    reason: format!("snapshot has no curve {curve}"),
                })
            }
        };
        let cache = self
            .caches
            .get_mut(input)
            .ok_or_else(|| GraphError::InvalidTrack {
                track: track.name.clone(),
                reason: format!("snapshot has no cache for input {input}"),
            })?;
        sample_curve_cached(track, curve, time, cache, out)?;
        Ok(out.as_slice())
    }

    /// Sample every curve at the snapshot's current time.
    pub fn evaluate(&mut self, track: &AnimTrack) -> Result<(), GraphError> {
        let time = self.time;
        for curve in 0..track.curves.len() {
            self.sample(track, curve, time)?;
        }
        Ok(())
    }

    /// Last sampled value of `curve`.
    #[inline]
    pub fn result(&self, curve: usize) -> &[f32] {
        &self.results[curve]
    }

    #[inline]
    pub fn results(&self) -> &[Vec<f32>] {
        &self.results
    }

    #[inline]
    pub fn cache(&self, input: usize) -> Option<&KeyCache> {
        self.caches.get(input)
    }

    /// Drop every cached bracket; the next sample re-searches.
    pub fn invalidate(&mut self) {
        for cache in &mut self.caches {
            cache.invalidate();
        }
    }
}
