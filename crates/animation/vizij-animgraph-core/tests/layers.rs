mod common;

use common::{approx, clip_state, constant, library, scalar_track};
use vizij_animgraph_core::{
    AnimData, AnimCurve, AnimTrack, Config, Controller, ControllerDef, CurveKind, GraphError,
    Interpolation, LayerStack, ParamValue, ParameterDef,
};

fn single_state(track: &str, lib: &vizij_animgraph_core::TrackLibrary) -> Controller {
    let def = ControllerDef {
        parameters: vec![ParameterDef {
            name: "mood".into(),
            value: ParamValue::Float(0.0),
        }],
        states: vec![clip_state("Only", track)],
        ..ControllerDef::default()
    };
    Controller::new(&def, lib, Config::default()).unwrap()
}

fn two_target(name: &str, x: f32, y: f32) -> AnimTrack {
    AnimTrack::new(
        name,
        1.0,
        vec![vec![0.0, 1.0]],
        vec![AnimData::new(1, vec![x, x]), AnimData::new(1, vec![y, y])],
        vec![
            AnimCurve {
                target: "x".into(),
                input: 0,
                output: 0,
                interpolation: Interpolation::Linear,
                kind: CurveKind::Vector,
            },
            AnimCurve {
                target: "y".into(),
                input: 0,
                output: 1,
                interpolation: Interpolation::Linear,
                kind: CurveKind::Vector,
            },
        ],
    )
    .unwrap()
}

#[test]
fn upper_layer_overwrites_by_weight() {
    let lib = library(vec![two_target("base", 2.0, 4.0), constant("over", 1.0, 10.0)]);
    let mut stack = LayerStack::new();
    stack.push_layer("base", single_state("base", &lib), 1.0).unwrap();
    let over = stack.push_layer("over", single_state("over", &lib), 0.5).unwrap();

    stack.update(0.1);
    let pose = stack.pose();
    approx(pose.get("x").unwrap()[0], 6.0, 1e-6);
    approx(pose.get("y").unwrap()[0], 4.0, 1e-6);

    assert!(stack.set_weight(over, 1.0));
    stack.update(0.1);
    approx(stack.pose().get("x").unwrap()[0], 10.0, 1e-6);
}

#[test]
fn masked_targets_pass_through() {
    let lib = library(vec![two_target("base", 2.0, 4.0), two_target("over", 8.0, 8.0)]);
    let mut stack = LayerStack::new();
    stack.push_layer("base", single_state("base", &lib), 1.0).unwrap();
    let over = stack.push_layer("over", single_state("over", &lib), 1.0).unwrap();
    assert!(stack.set_mask(over, Some(["y"])));

    stack.update(0.1);
    approx(stack.pose().get("x").unwrap()[0], 2.0, 1e-6);
    approx(stack.pose().get("y").unwrap()[0], 8.0, 1e-6);

    assert!(stack.set_mask(over, None::<Vec<String>>));
    stack.update(0.1);
    approx(stack.pose().get("x").unwrap()[0], 8.0, 1e-6);
}

#[test]
fn lone_layer_value_is_kept_regardless_of_weight() {
    let lib = library(vec![two_target("base", 2.0, 4.0), constant("over", 1.0, 10.0)]);
    let mut stack = LayerStack::new();
    stack.push_layer("over", single_state("over", &lib), 0.25).unwrap();
    stack.update(0.1);
    approx(stack.pose().get("x").unwrap()[0], 10.0, 1e-6);
    assert_eq!(stack.pose().get("y"), None);
}

#[test]
fn parameters_fan_out_to_every_layer() {
    let lib = library(vec![two_target("base", 2.0, 4.0), constant("over", 1.0, 10.0)]);
    let mut stack = LayerStack::new();
    let a = stack.push_layer("a", single_state("base", &lib), 1.0).unwrap();
    let b = stack.push_layer("b", single_state("over", &lib), 1.0).unwrap();
    stack.set_parameter("mood", ParamValue::Float(0.7)).unwrap();
    for id in [a, b] {
        assert_eq!(
            stack.layer(id).unwrap().controller().get_parameter("mood"),
            Some(ParamValue::Float(0.7))
        );
    }
    assert!(matches!(
        stack.set_parameter("mood", ParamValue::Bool(true)),
        Err(GraphError::ParameterTypeMismatch { .. })
    ));
}

#[test]
fn conflicting_widths_are_rejected() {
    let wide = AnimTrack::new(
        "wide",
        1.0,
        vec![vec![0.0, 1.0]],
        vec![AnimData::new(2, vec![0.0, 0.0, 1.0, 1.0])],
        vec![AnimCurve {
            target: "x".into(),
            input: 0,
            output: 0,
            interpolation: Interpolation::Linear,
            kind: CurveKind::Vector,
        }],
    )
    .unwrap();
    let thin = scalar_track("thin", "x", &[(0.0, 0.0), (1.0, 1.0)], Interpolation::Step);
    let lib = library(vec![wide, thin]);
    let mut stack = LayerStack::new();
    stack.push_layer("wide", single_state("wide", &lib), 1.0).unwrap();
    let err = stack
        .push_layer("thin", single_state("thin", &lib), 1.0)
        .unwrap_err();
    assert!(matches!(err, GraphError::TargetMismatch { .. }));
    assert_eq!(stack.len(), 1);
}
