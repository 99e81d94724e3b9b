//! Identifiers for graph entities.

use serde::{Deserialize, Serialize};

/// Dense index of a named state inside one controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a layer inside a `LayerStack`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u32);

/// Reserved control-state names.
pub const START_STATE: &str = "START";
pub const END_STATE: &str = "END";
pub const ANY_STATE: &str = "ANY";

/// Endpoint of a transition: a named state or one of the control states.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StateRef {
    Start,
    End,
    Any,
    Named(StateId),
}

impl StateRef {
    #[inline]
    pub fn named(self) -> Option<StateId> {
        match self {
            StateRef::Named(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_ref_exposes_id() {
        assert_eq!(StateRef::Named(StateId(3)).named(), Some(StateId(3)));
        assert_eq!(StateRef::Any.named(), None);
        assert_eq!(StateId(7).index(), 7);
    }
}
