//! Vizij AnimGraph Core (engine-agnostic)
//!
//! Blend-tree and state-machine evaluation for keyframed animation. The host supplies parsed
//! tracks and a graph definition, writes parameters, calls `Controller::update(dt)` once per
//! frame and reads the resulting pose. Asset loading and rendering live outside this crate.

pub mod blend;
pub mod config;
pub mod controller;
pub mod data;
pub mod def;
pub mod error;
pub mod events;
pub mod ids;
pub mod interp;
pub mod layers;
pub mod library;
pub mod loader;
pub mod parameters;
pub mod pose;
pub mod sampling;
pub mod snapshot;
pub mod state;
pub mod transition;

// Re-exports for hosts
pub use blend::{BlendChild, BlendKind, BlendTree, ClipNode, Motion};
pub use config::{Config, EndBehavior};
pub use controller::Controller;
pub use data::{AnimCurve, AnimData, AnimTrack, CurveKind, Interpolation};
pub use def::{
    BlendChildDef, BlendTreeDef, ConditionDef, ConditionValue, ControllerDef, MotionDef,
    ParameterDef, PointDef, StateDef, TransitionDef,
};
pub use error::GraphError;
pub use events::{ControllerEvent, EventQueue};
pub use ids::{LayerId, StateId, StateRef, ANY_STATE, END_STATE, START_STATE};
pub use layers::{AnimLayer, LayerStack};
pub use library::{TrackLibrary, TrackProvider};
pub use loader::{parse_controller_json, parse_library_json, parse_track_json};
pub use parameters::{ParamValue, Parameters};
pub use pose::{Pose, PoseAccumulator, TargetTable};
pub use sampling::{sample_curve, KeyCache};
pub use snapshot::AnimSnapshot;
pub use state::AnimState;
pub use transition::{AnimTransition, Comparison, Condition, InterruptionSource};
