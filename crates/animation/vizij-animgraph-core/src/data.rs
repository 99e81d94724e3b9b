//! Immutable keyframe data for one animation clip.
//!
//! A track owns a set of input arrays (sample times) and output arrays (flattened value
//! tuples). Curves tie one input to one output and name the target they animate, so several
//! curves can share the same input timeline.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Keyframe interpolation between two samples.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interpolation {
    /// Hold the left sample.
    Step,
    #[default]
    Linear,
    /// Uniform Catmull-Rom through the four neighbouring samples.
    CatmullRom,
    /// Cardinal spline; `tension` 0 equals Catmull-Rom, 1 flattens tangents.
    Cardinal { tension: f32 },
}

/// How a curve's values combine when interpolated or blended.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Component-wise.
    #[default]
    Vector,
    /// Unit quaternion (x, y, z, w); shortest-arc and renormalized.
    Quaternion,
}

/// Flattened output samples, `components` floats per input sample.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimData {
    pub components: usize,
    pub data: Vec<f32>,
}

impl AnimData {
    pub fn new(components: usize, data: Vec<f32>) -> Self {
        Self { components, data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.data.len() / self.components
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Output tuple for sample `index`.
    #[inline]
    pub fn tuple(&self, index: usize) -> &[f32] {
        let start = index * self.components;
        &self.data[start..start + self.components]
    }
}

/// One animated target inside a track.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimCurve {
    /// Target path, e.g. "hips/rotation".
    pub target: String,
    /// Index into `AnimTrack::inputs`.
    pub input: usize,
    /// Index into `AnimTrack::outputs`.
    pub output: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub kind: CurveKind,
}

/// Immutable clip data shared by every state that plays it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnimTrack {
    pub name: String,
    /// Clip length in seconds.
    pub duration: f32,
    pub inputs: Vec<Vec<f32>>,
    pub outputs: Vec<AnimData>,
    pub curves: Vec<AnimCurve>,
}

impl AnimTrack {
    /// Build a track, validating it.
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        inputs: Vec<Vec<f32>>,
        outputs: Vec<AnimData>,
        curves: Vec<AnimCurve>,
    ) -> Result<Self, GraphError> {
        let track = Self {
            name: name.into(),
            duration,
            inputs,
            outputs,
            curves,
        };
        track.validate()?;
        Ok(track)
    }

    fn invalid(&self, reason: String) -> GraphError {
        GraphError::InvalidTrack {
            track: self.name.clone(),
            reason,
        }
    }

    /// Check duration, monotonic inputs, output sizes and curve references.
    pub fn validate(&self) -> Result<(), GraphError> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(self.invalid(format!(
                "duration must be finite and >= 0, got {}",
                self.duration
            )));
        }
        for (i, input) in self.inputs.iter().enumerate() {
            let mut last = f32::NEG_INFINITY;
            for &t in input {
                if !t.is_finite() {
                    return Err(self.invalid(format!("input {i} contains a non-finite time")));
                }
                if t < last {
                    return Err(self.invalid(format!("input {i} times must be non-decreasing")));
                }
                last = t;
            }
        }
        for (i, output) in self.outputs.iter().enumerate() {
            if output.components == 0 {
                return Err(self.invalid(format!("output {i} has zero components")));
            }
            if output.data.len() % output.components != 0 {
                return Err(self.invalid(format!(
                    "output {i} length {} is not a multiple of {}",
                    output.data.len(),
                    output.components
                )));
            }
        }
        for (c, curve) in self.curves.iter().enumerate() {
            let input = self.inputs.get(curve.input).ok_or_else(|| {
                self.invalid(format!("curve {c} references missing input {}", curve.input))
            })?;
            let output = self.outputs.get(curve.output).ok_or_else(|| {
                self.invalid(format!("curve {c} references missing output {}", curve.output))
            })?;
            if input.is_empty() || output.is_empty() {
                return Err(GraphError::EmptyCurve {
                    track: self.name.clone(),
                    curve: c,
                });
            }
            if output.len() != input.len() {
                return Err(self.invalid(format!(
                    "curve {c} has {} inputs but {} output tuples",
                    input.len(),
                    output.len()
                )));
            }
            if curve.kind == CurveKind::Quaternion && output.components != 4 {
                return Err(self.invalid(format!(
                    "quaternion curve {c} needs 4 components, got {}",
                    output.components
                )));
            }
            if let Interpolation::Cardinal { tension } = curve.interpolation {
                if !tension.is_finite() {
                    return Err(self.invalid(format!("curve {c} has a non-finite tension")));
                }
            }
        }
        Ok(())
    }

    /// Component width of curve `index`.
    #[inline]
    pub fn components(&self, curve: usize) -> usize {
        self.outputs[self.curves[curve].output].components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(input: usize, output: usize) -> AnimCurve {
        AnimCurve {
            target: "root/x".into(),
            input,
            output,
            interpolation: Interpolation::Linear,
            kind: CurveKind::Vector,
        }
    }

    #[test]
    fn empty_curve_is_rejected() {
        let err = AnimTrack::new(
            "empty",
            1.0,
            vec![vec![]],
            vec![AnimData::new(1, vec![])],
            vec![curve(0, 0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GraphError::EmptyCurve {
                track: "empty".into(),
                curve: 0
            }
        );
    }

    #[test]
    fn decreasing_inputs_are_rejected() {
        let err = AnimTrack::new(
            "bad",
            1.0,
            vec![vec![0.0, 0.5, 0.25]],
            vec![AnimData::new(1, vec![0.0, 1.0, 2.0])],
            vec![curve(0, 0)],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidTrack { .. }));
    }

    #[test]
    fn mismatched_output_count_is_rejected() {
        let err = AnimTrack::new(
            "bad",
            1.0,
            vec![vec![0.0, 1.0]],
            vec![AnimData::new(2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])],
            vec![curve(0, 0)],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidTrack { .. }));
    }

    #[test]
    fn tuple_slices_by_components() {
        let data = AnimData::new(3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.tuple(1), &[3.0, 4.0, 5.0]);
    }
}
