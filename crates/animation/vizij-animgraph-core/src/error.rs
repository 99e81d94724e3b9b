//! Error types for graph construction and per-frame diagnostics.

use serde::{Deserialize, Serialize};

/// Errors raised while building a controller or reported while evaluating one.
///
/// Build-time variants abort construction. Recoverable variants are never returned from
/// `Controller::update`; they are queued as diagnostics instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GraphError {
    /// A curve has no samples.
    #[error("Curve {curve} of track '{track}' has no samples")]
    EmptyCurve { track: String, curve: usize },

    /// Track input/output arrays are inconsistent.
    #[error("Invalid track '{track}': {reason}")]
    InvalidTrack { track: String, reason: String },

    /// A clip references a track the provider does not know.
    #[error("Unknown track: {key}")]
    UnknownTrack { key: String },

    /// A transition or request references a state that is not in the graph.
    #[error("Unknown state: {state}")]
    UnknownState { state: String },

    /// Two states share a name.
    #[error("Duplicate state: {state}")]
    DuplicateState { state: String },

    /// A transition carries an out-of-range timing value.
    #[error("Invalid transition {from} -> {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Blend tree children/parameters do not match its dimensionality.
    #[error("Malformed blend tree: {reason}")]
    MalformedBlendTree { reason: String },

    /// Two curves animate the same target with different widths.
    #[error("Target '{target}' expects {expected} components, got {actual}")]
    TargetMismatch {
        target: String,
        expected: usize,
        actual: usize,
    },

    /// A condition or blend tree reads a parameter that is not set.
    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    /// A parameter was written with a different type than it holds.
    #[error("Parameter '{name}' holds {expected}, got {actual}")]
    ParameterTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Numeric edge case in a blend tree (e.g. all weights collapsed to zero).
    #[error("Degenerate blend: {reason}")]
    DegenerateBlend { reason: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl GraphError {
    /// Recoverable errors degrade the frame instead of stopping the controller.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::DegenerateBlend { .. }
        )
    }

    /// Coarse category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyCurve { .. } | Self::InvalidTrack { .. } | Self::UnknownTrack { .. } => {
                "track"
            }
            Self::UnknownState { .. }
            | Self::DuplicateState { .. }
            | Self::InvalidTransition { .. }
            | Self::MalformedBlendTree { .. }
            | Self::TargetMismatch { .. } => "graph",
            Self::MissingParameter { .. } | Self::ParameterTypeMismatch { .. } => "parameter",
            Self::DegenerateBlend { .. } => "numeric",
            Self::InvalidConfig { .. } => "config",
            Self::Parse { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
