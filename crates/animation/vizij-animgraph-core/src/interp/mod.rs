//! Keyframe interpolation.
//!
//! Step, linear, shortest-arc quaternion NLERP and four-point cardinal splines, all
//! operating on flat `f32` tuples so curve widths are not fixed at compile time.

pub mod functions;

pub use functions::{cardinal_into, lerp_into, nlerp_quat_into, step_into};
