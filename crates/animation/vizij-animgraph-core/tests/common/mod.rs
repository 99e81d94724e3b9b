#![allow(dead_code)]
//! Track and graph builders shared by the integration tests.

use vizij_animgraph_core::{
    AnimCurve, AnimData, AnimTrack, Comparison, ConditionDef, ConditionValue, CurveKind,
    Interpolation, MotionDef, StateDef, TrackLibrary,
};

pub fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

/// One scalar curve on `target` through `keys` (time, value).
pub fn scalar_track(
    name: &str,
    target: &str,
    keys: &[(f32, f32)],
    interp: Interpolation,
) -> AnimTrack {
    let duration = keys.last().map_or(0.0, |k| k.0);
    AnimTrack::new(
        name,
        duration,
        vec![keys.iter().map(|k| k.0).collect()],
        vec![AnimData::new(1, keys.iter().map(|k| k.1).collect())],
        vec![AnimCurve {
            target: target.into(),
            input: 0,
            output: 0,
            interpolation: interp,
            kind: CurveKind::Vector,
        }],
    )
    .unwrap()
}

/// `x` equals the playback time.
pub fn ramp(name: &str, duration: f32) -> AnimTrack {
    scalar_track(name, "x", &[(0.0, 0.0), (duration, duration)], Interpolation::Linear)
}

/// `x` holds `value` for `duration` seconds.
pub fn constant(name: &str, duration: f32, value: f32) -> AnimTrack {
    scalar_track(name, "x", &[(0.0, value), (duration, value)], Interpolation::Linear)
}

pub fn library(tracks: Vec<AnimTrack>) -> TrackLibrary {
    let mut lib = TrackLibrary::new();
    for track in tracks {
        lib.insert(track).unwrap();
    }
    lib
}

pub fn clip(track: &str) -> MotionDef {
    MotionDef::Clip {
        track: track.into(),
        speed: 1.0,
    }
}

pub fn clip_state(name: &str, track: &str) -> StateDef {
    StateDef {
        name: name.into(),
        speed: 1.0,
        looping: true,
        motions: vec![clip(track)],
    }
}

pub fn cond(parameter: &str, predicate: Comparison, value: f32) -> ConditionDef {
    ConditionDef {
        parameter: parameter.into(),
        predicate,
        value: ConditionValue::Number(value),
    }
}

pub fn is_true(parameter: &str) -> ConditionDef {
    ConditionDef {
        parameter: parameter.into(),
        predicate: Comparison::Equal,
        value: ConditionValue::Bool(true),
    }
}
