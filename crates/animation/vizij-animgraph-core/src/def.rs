//! Serializable controller graph definitions.
//!
//! These mirror authored data one-to-one. `Controller::new` resolves names, binds tracks and
//! validates everything before the first frame.

use serde::{Deserialize, Serialize};

use crate::blend::BlendKind;
use crate::parameters::ParamValue;
use crate::transition::{Comparison, InterruptionSource};

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ControllerDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

/// Declared parameter and its initial value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub name: String,
    pub value: ParamValue,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StateDef {
    pub name: String,
    #[serde(default = "one")]
    pub speed: f32,
    #[serde(default = "yes")]
    pub looping: bool,
    /// One motion per layer component; the first drives the state's duration.
    pub motions: Vec<MotionDef>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionDef {
    Clip {
        /// Key passed to the track provider.
        track: String,
        #[serde(default = "one")]
        speed: f32,
    },
    BlendTree(BlendTreeDef),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendTreeDef {
    pub blend: BlendKind,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub children: Vec<BlendChildDef>,
    #[serde(default)]
    pub sync_durations: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendChildDef {
    pub motion: MotionDef,
    #[serde(default)]
    pub point: Option<PointDef>,
    #[serde(default = "one")]
    pub speed: f32,
}

/// A 1D threshold or a 2D position.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PointDef {
    Scalar(f32),
    Planar([f32; 2]),
}

impl PointDef {
    pub fn to_array(self) -> [f32; 2] {
        match self {
            PointDef::Scalar(x) => [x, 0.0],
            PointDef::Planar(p) => p,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionDef {
    /// State name, `START` or `ANY`.
    pub from: String,
    /// State name or `END`.
    pub to: String,
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
    #[serde(default)]
    pub exit_time: Option<f32>,
    #[serde(default)]
    pub transition_offset: Option<f32>,
    #[serde(default)]
    pub interruption_source: InterruptionSource,
}

impl TransitionDef {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            time: 0.0,
            priority: 0,
            conditions: Vec::new(),
            exit_time: None,
            transition_offset: None,
            interruption_source: InterruptionSource::None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConditionDef {
    pub parameter: String,
    pub predicate: Comparison,
    #[serde(default)]
    pub value: ConditionValue,
}

/// Threshold; booleans compare as 1.0 / 0.0.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f32),
    Bool(bool),
}

impl Default for ConditionValue {
    fn default() -> Self {
        ConditionValue::Number(0.0)
    }
}

impl ConditionValue {
    pub fn as_f32(self) -> f32 {
        match self {
            ConditionValue::Number(v) => v,
            ConditionValue::Bool(true) => 1.0,
            ConditionValue::Bool(false) => 0.0,
        }
    }
}
