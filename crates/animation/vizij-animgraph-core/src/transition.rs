//! Transitions between states: conditions, exit-time gates and interruption policy.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::events::EventQueue;
use crate::ids::StateRef;
use crate::parameters::Parameters;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Comparison {
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparison {
    #[inline]
    pub fn evaluate(self, lhs: f32, rhs: f32) -> bool {
        match self {
            Comparison::Greater => lhs > rhs,
            Comparison::Less => lhs < rhs,
            Comparison::GreaterEqual => lhs >= rhs,
            Comparison::LessEqual => lhs <= rhs,
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
        }
    }
}

/// Which states' transitions may interrupt a cross-fade started by this transition.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionSource {
    #[default]
    None,
    PrevState,
    NextState,
    PrevStateNextState,
    NextStatePrevState,
}

/// Side of a running cross-fade.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FadeSide {
    /// The state being faded out.
    Prev,
    /// The state being faded in.
    Next,
}

impl InterruptionSource {
    /// Sides whose transitions are checked, in order.
    pub fn sides(self) -> &'static [FadeSide] {
        match self {
            InterruptionSource::None => &[],
            InterruptionSource::PrevState => &[FadeSide::Prev],
            InterruptionSource::NextState => &[FadeSide::Next],
            InterruptionSource::PrevStateNextState => &[FadeSide::Prev, FadeSide::Next],
            InterruptionSource::NextStatePrevState => &[FadeSide::Next, FadeSide::Prev],
        }
    }
}

/// `parameter <predicate> value`, compared numerically.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub parameter: String,
    pub predicate: Comparison,
    pub value: f32,
}

impl Condition {
    /// A missing parameter reads as false and is reported.
    pub fn evaluate(&self, params: &Parameters, events: &mut EventQueue) -> bool {
        match params.numeric(&self.parameter) {
            Some(v) => self.predicate.evaluate(v, self.value),
            None => {
                events.diagnostic(GraphError::MissingParameter {
                    name: self.parameter.clone(),
                });
                false
            }
        }
    }
}

/// Whether normalized progress crossed `exit` between `prev` and `cur`.
///
/// Values below 1 fire once per loop at that fraction; values of 1 or more fire once,
/// when progress first reaches them.
pub fn exit_time_crossed(exit: f32, prev: f32, cur: f32) -> bool {
    if exit < 1.0 {
        let threshold = (cur - exit).floor() + exit;
        threshold >= 0.0 && threshold > prev && threshold <= cur
    } else {
        prev < exit && exit <= cur
    }
}

#[derive(Clone, Debug)]
pub struct AnimTransition {
    pub from: StateRef,
    to: StateRef,
    /// Cross-fade duration in seconds.
    pub time: f32,
    /// Lower fires first; ties keep declaration order.
    pub priority: i32,
    pub conditions: Vec<Condition>,
    pub exit_time: Option<f32>,
    /// Normalized start time of the destination.
    pub transition_offset: Option<f32>,
    pub interruption_source: InterruptionSource,
}

impl AnimTransition {
    pub fn new(from: StateRef, to: StateRef) -> Self {
        Self {
            from,
            to,
            time: 0.0,
            priority: 0,
            conditions: Vec::new(),
            exit_time: None,
            transition_offset: None,
            interruption_source: InterruptionSource::None,
        }
    }

    #[inline]
    pub fn to(&self) -> StateRef {
        self.to
    }

    /// Only the controller may retarget, after validating the destination.
    pub(crate) fn set_to(&mut self, to: StateRef) {
        self.to = to;
    }

    /// Exit-time gate against source progress. Ungated transitions always pass.
    #[inline]
    pub fn exit_gate_open(&self, prev: f32, cur: f32) -> bool {
        self.exit_time
            .map_or(true, |exit| exit_time_crossed(exit, prev, cur))
    }

    /// Every condition holds. Evaluation stops at the first false condition.
    pub fn conditions_met(&self, params: &Parameters, events: &mut EventQueue) -> bool {
        self.conditions.iter().all(|c| c.evaluate(params, events))
    }
}
