//! Animation states: motions plus playback progress.

use crate::blend::Motion;
use crate::error::GraphError;
use crate::events::EventQueue;
use crate::parameters::Parameters;
use crate::pose::PoseAccumulator;

/// A named node of the state graph.
///
/// `progress` is unbounded normalized time: the integer part counts completed loops and
/// the fractional part is the position inside the current loop. Non-looping states stop
/// at 1.0.
#[derive(Clone, Debug)]
pub struct AnimState {
    name: String,
    speed: f32,
    looping: bool,
    motions: Vec<Motion>,
    progress: f32,
    prev_progress: f32,
}

impl AnimState {
    pub fn new(name: impl Into<String>, speed: f32, looping: bool, motions: Vec<Motion>) -> Self {
        Self {
            name: name.into(),
            speed,
            looping,
            motions,
            progress: 0.0,
            prev_progress: 0.0,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn motions(&self) -> &[Motion] {
        &self.motions
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress before the most recent `advance`.
    #[inline]
    pub fn prev_progress(&self) -> f32 {
        self.prev_progress
    }

    /// Wall-clock seconds per loop, taken from the first motion.
    pub fn duration(&self) -> f32 {
        self.motions
            .first()
            .map_or(0.0, |m| m.cycle_duration(self.speed))
    }

    pub fn update_weights(&mut self, params: &Parameters, events: &mut EventQueue) {
        for motion in &mut self.motions {
            motion.update_weights(params, events);
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.prev_progress = self.progress;
        let duration = self.duration();
        if duration > 0.0 {
            self.progress += dt / duration;
        }
        if !self.looping {
            self.progress = self.progress.min(1.0);
        }
        for motion in &mut self.motions {
            motion.advance(dt, self.speed, self.looping);
        }
    }

    /// Restart playback at normalized time `u` of every clip.
    pub fn start_at(&mut self, u: f32) {
        self.progress = u;
        self.prev_progress = u;
        for motion in &mut self.motions {
            motion.set_normalized_time(u);
        }
    }

    pub fn accumulate(
        &mut self,
        weight: f32,
        epsilon: f32,
        acc: &mut PoseAccumulator,
    ) -> Result<(), GraphError> {
        for motion in &mut self.motions {
            motion.accumulate(weight, epsilon, acc)?;
        }
        Ok(())
    }
}
