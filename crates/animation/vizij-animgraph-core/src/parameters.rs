//! Named, typed parameters driving blend weights and transition conditions.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    /// Boolean that resets to false once a condition has read it as true.
    Trigger(bool),
}

impl ParamValue {
    #[inline]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::Trigger(_) => "trigger",
        }
    }

    /// Numeric view; booleans and triggers map to 0.0 / 1.0.
    #[inline]
    pub fn as_f32(&self) -> f32 {
        match *self {
            ParamValue::Int(v) => v as f32,
            ParamValue::Float(v) => v,
            ParamValue::Bool(b) | ParamValue::Trigger(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    #[inline]
    fn same_kind(&self, other: &ParamValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    value: ParamValue,
    generation: u64,
}

/// Parameter set owned by a controller.
///
/// `revision` increases whenever any value changes and each parameter remembers the
/// revision of its last change, letting blend trees skip weight recomputation on frames
/// where none of their inputs moved.
#[derive(Clone, Debug, Default)]
pub struct Parameters {
    values: HashMap<String, Slot>,
    consumed: Vec<String>,
    revision: u64,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or create a parameter. An existing parameter keeps its type.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), GraphError> {
        match self.values.get_mut(name) {
            Some(slot) => {
                if !slot.value.same_kind(&value) {
                    return Err(GraphError::ParameterTypeMismatch {
                        name: name.to_string(),
                        expected: slot.value.kind_name().to_string(),
                        actual: value.kind_name().to_string(),
                    });
                }
                if slot.value != value {
                    self.revision += 1;
                    slot.value = value;
                    slot.generation = self.revision;
                }
            }
            None => {
                self.revision += 1;
                self.values.insert(
                    name.to_string(),
                    Slot {
                        value,
                        generation: self.revision,
                    },
                );
            }
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).map(|slot| slot.value)
    }

    #[inline]
    pub fn numeric(&self, name: &str) -> Option<f32> {
        self.values.get(name).map(|slot| slot.value.as_f32())
    }

    /// Revision at which `name` last changed.
    #[inline]
    pub fn generation(&self, name: &str) -> Option<u64> {
        self.values.get(name).map(|slot| slot.generation)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.values.iter().map(|(k, slot)| (k.as_str(), slot.value))
    }

    /// Replace every value with those of `initial`.
    ///
    /// All restored parameters get a generation newer than any handed out so far, so
    /// caches keyed on generations see the reset as a change.
    pub fn restore(&mut self, initial: &Parameters) {
        self.revision = self.revision.max(initial.revision) + 1;
        let generation = self.revision;
        self.values = initial
            .values
            .iter()
            .map(|(name, slot)| {
                (
                    name.clone(),
                    Slot {
                        value: slot.value,
                        generation,
                    },
                )
            })
            .collect();
        self.consumed.clear();
    }

    /// Record that a condition read trigger `name` as true this frame.
    pub fn mark_consumed(&mut self, name: &str) {
        if matches!(self.get(name), Some(ParamValue::Trigger(true)))
            && !self.consumed.iter().any(|c| c == name)
        {
            self.consumed.push(name.to_string());
        }
    }

    /// Reset every trigger consumed this frame. Called once at the end of an update.
    pub fn reset_consumed_triggers(&mut self) {
        for name in self.consumed.drain(..) {
            if let Some(slot) = self.values.get_mut(&name) {
                if slot.value == ParamValue::Trigger(true) {
                    self.revision += 1;
                    slot.value = ParamValue::Trigger(false);
                    slot.generation = self.revision;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_type_change() {
        let mut params = Parameters::new();
        params.set("speed", ParamValue::Float(1.0)).unwrap();
        let err = params.set("speed", ParamValue::Bool(true)).unwrap_err();
        assert!(matches!(err, GraphError::ParameterTypeMismatch { .. }));
        assert_eq!(params.get("speed"), Some(ParamValue::Float(1.0)));
    }

    #[test]
    fn revision_tracks_real_changes() {
        let mut params = Parameters::new();
        params.set("x", ParamValue::Float(1.0)).unwrap();
        let rev = params.revision();
        params.set("x", ParamValue::Float(1.0)).unwrap();
        assert_eq!(params.revision(), rev);
        params.set("x", ParamValue::Float(2.0)).unwrap();
        assert!(params.revision() > rev);
    }

    #[test]
    fn restore_moves_generations_forward() {
        let mut params = Parameters::new();
        params.set("x", ParamValue::Float(0.0)).unwrap();
        let initial = params.clone();
        params.set("x", ParamValue::Float(1.0)).unwrap();
        params.set("extra", ParamValue::Int(3)).unwrap();
        let before = params.generation("x").unwrap();

        params.restore(&initial);
        assert_eq!(params.get("x"), Some(ParamValue::Float(0.0)));
        assert_eq!(params.get("extra"), None);
        assert!(params.generation("x").unwrap() > before);

        params.set("x", ParamValue::Float(0.5)).unwrap();
        assert!(params.generation("x").unwrap() > before + 1);
    }

    #[test]
    fn generation_is_per_parameter() {
        let mut params = Parameters::new();
        params.set("x", ParamValue::Float(1.0)).unwrap();
        params.set("y", ParamValue::Float(1.0)).unwrap();
        let gx = params.generation("x");
        params.set("y", ParamValue::Float(2.0)).unwrap();
        assert_eq!(params.generation("x"), gx);
        assert!(params.generation("y") > gx);
        assert_eq!(params.generation("z"), None);
    }

    #[test]
    fn consumed_triggers_reset() {
        let mut params = Parameters::new();
        params.set("jump", ParamValue::Trigger(true)).unwrap();
        params.mark_consumed("jump");
        assert_eq!(params.get("jump"), Some(ParamValue::Trigger(true)));
        params.reset_consumed_triggers();
        assert_eq!(params.get("jump"), Some(ParamValue::Trigger(false)));
    }

    #[test]
    fn numeric_view() {
        assert_eq!(ParamValue::Int(3).as_f32(), 3.0);
        assert_eq!(ParamValue::Bool(true).as_f32(), 1.0);
        assert_eq!(ParamValue::Trigger(false).as_f32(), 0.0);
    }
}
