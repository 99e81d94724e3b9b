//! Controller configuration.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// What happens when a transition lands on the END control state.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndBehavior {
    /// END is a sink: evaluation stops and the last pose is kept.
    #[default]
    Hold,
    /// Re-enter the graph through the START entry transition.
    Restart,
}

/// Configuration for controller evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum events held until the host drains them; further events are counted and dropped.
    pub max_queued_events: usize,

    /// Leaves at or below this effective weight are not sampled (they still advance).
    pub weight_epsilon: f32,

    pub end_behavior: EndBehavior,

    /// Take the START entry transition during construction.
    pub enter_on_build: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_queued_events: 1024,
            weight_epsilon: 1e-5,
            end_behavior: EndBehavior::Hold,
            enter_on_build: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.max_queued_events == 0 {
            return Err(GraphError::InvalidConfig {
                reason: "max_queued_events must be > 0".into(),
            });
        }
        if !self.weight_epsilon.is_finite() || self.weight_epsilon < 0.0 {
            return Err(GraphError::InvalidConfig {
                reason: format!(
                    "weight_epsilon must be finite and >= 0, got {}",
                    self.weight_epsilon
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_event_budget() {
        let cfg = Config {
            max_queued_events: 0,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(GraphError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "end_behavior": "restart" }"#).unwrap();
        assert_eq!(cfg.end_behavior, EndBehavior::Restart);
        assert_eq!(cfg.max_queued_events, 1024);
        assert!(cfg.enter_on_build);
    }
}
