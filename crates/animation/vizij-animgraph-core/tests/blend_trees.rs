mod common;

use std::sync::Arc;

use common::{approx, constant};
use vizij_animgraph_core::blend::{cartesian, one_d};
use vizij_animgraph_core::{
    BlendChild, BlendKind, BlendTree, ClipNode, ControllerEvent, EventQueue, GraphError, Motion,
    ParamValue, Parameters, TargetTable,
};

fn leaf(value: f32, table: &mut TargetTable) -> Motion {
    let track = Arc::new(constant(&format!("c{value}"), 1.0, value));
    Motion::Clip(ClipNode::new(track, 1.0, table).unwrap())
}

fn tree(kind: BlendKind, params: &[&str], points: &[[f32; 2]]) -> BlendTree {
    let mut table = TargetTable::new();
    let children = points
        .iter()
        .enumerate()
        .map(|(i, &point)| BlendChild {
            motion: leaf(i as f32, &mut table),
            point,
            speed: 1.0,
        })
        .collect();
    BlendTree::new(
        kind,
        params.iter().map(|p| p.to_string()).collect(),
        children,
        false,
    )
    .unwrap()
}

fn params(values: &[(&str, f32)]) -> Parameters {
    let mut p = Parameters::new();
    for &(name, v) in values {
        p.set(name, ParamValue::Float(v)).unwrap();
    }
    p
}

#[test]
fn cartesian_weights_sum_to_one_inside_hull() {
    let points = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0], [0.0, 0.0]];
    let pairs = cartesian::pair_table(&points);
    for xi in 0..=8 {
        for yi in 0..=8 {
            let p = [-1.0 + xi as f32 * 0.25, -1.0 + yi as f32 * 0.25];
            let (w, _) = cartesian::weights(&points, &pairs, p);
            let sum: f32 = w.iter().sum();
            approx(sum, 1.0, 1e-5);
            assert!(w.iter().all(|x| (0.0..=1.0).contains(x)), "{p:?} -> {w:?}");
        }
    }
}

#[test]
fn cartesian_triangle_interior() {
    let points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let pairs = cartesian::pair_table(&points);
    let (w, _) = cartesian::weights(&points, &pairs, [0.25, 0.25]);
    approx(w.iter().sum(), 1.0, 1e-6);
    assert!(w[0] > w[1] && w[0] > w[2]);
    approx(w[1], w[2], 1e-6);
}

#[test]
fn one_d_only_bracketing_pair_is_weighted() {
    let points = [0.0, 1.0, 2.5, 4.0];
    let mut v = -0.5;
    while v <= 4.5 {
        let w = one_d::weights(&points, v);
        let active: Vec<usize> = (0..w.len()).filter(|&i| w[i] > 0.0).collect();
        assert!(!active.is_empty() && active.len() <= 2, "{v}: {w:?}");
        if active.len() == 2 {
            assert_eq!(active[1], active[0] + 1);
        }
        approx(w.iter().sum(), 1.0, 1e-6);
        v += 0.125;
    }
}

#[test]
fn one_d_tree_interpolates_by_position() {
    let mut t = tree(BlendKind::OneD, &["speed"], &[[0.0, 0.0], [2.0, 0.0]]);
    let mut events = EventQueue::new(8);
    let w = t.calculate_weights(&params(&[("speed", 0.5)]), &mut events);
    approx(w[0], 0.75, 1e-6);
    approx(w[1], 0.25, 1e-6);
}

#[test]
fn unchanged_parameters_hit_the_weight_cache() {
    let mut t = tree(
        BlendKind::Cartesian2D,
        &["x", "y"],
        &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
    );
    let mut p = params(&[("x", 0.3), ("y", 0.6)]);
    let mut events = EventQueue::new(8);

    let first = t.calculate_weights(&p, &mut events).to_vec();
    let second = t.calculate_weights(&p, &mut events).to_vec();
    assert_eq!(first, second);
    assert_eq!(t.weight_evaluations(), 1);

    // Same value written back: generation moves but the values match.
    p.set("x", ParamValue::Float(0.9)).unwrap();
    p.set("x", ParamValue::Float(0.3)).unwrap();
    t.calculate_weights(&p, &mut events);
    assert_eq!(t.weight_evaluations(), 1);

    // Unrelated parameter.
    p.set("other", ParamValue::Float(1.0)).unwrap();
    t.calculate_weights(&p, &mut events);
    assert_eq!(t.weight_evaluations(), 1);

    p.set("x", ParamValue::Float(0.8)).unwrap();
    let third = t.calculate_weights(&p, &mut events).to_vec();
    assert_eq!(t.weight_evaluations(), 2);
    assert_ne!(first, third);
}

#[test]
fn direct_weights_follow_parameters() {
    let mut t = tree(BlendKind::Direct, &["a", "b"], &[[0.0, 0.0], [0.0, 0.0]]);
    let mut events = EventQueue::new(8);
    let w = t
        .calculate_weights(&params(&[("a", 0.3), ("b", 0.7)]), &mut events)
        .to_vec();
    approx(w[0], 0.3, 1e-6);
    approx(w[1], 0.7, 1e-6);

    let w = t
        .calculate_weights(&params(&[("a", 0.0), ("b", 0.0)]), &mut events)
        .to_vec();
    assert_eq!(w, vec![0.0, 0.0]);
    assert!(w.iter().all(|x| !x.is_nan()));
}

#[test]
fn directional_weights_follow_angle() {
    let mut t = tree(
        BlendKind::Directional2D,
        &["x", "y"],
        &[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, -1.0], [-1.0, 0.0]],
    );
    let mut events = EventQueue::new(8);
    let w = t
        .calculate_weights(&params(&[("x", 1.0), ("y", 0.0)]), &mut events)
        .to_vec();
    approx(w[2], 1.0, 1e-5);
    approx(w.iter().sum(), 1.0, 1e-5);
}

#[test]
fn missing_parameter_reads_as_zero() {
    let mut t = tree(BlendKind::OneD, &["speed"], &[[0.0, 0.0], [1.0, 0.0]]);
    let mut events = EventQueue::new(8);
    let w = t.calculate_weights(&Parameters::new(), &mut events).to_vec();
    assert_eq!(w, vec![1.0, 0.0]);
    assert!(events.events().iter().any(|e| matches!(
        e,
        ControllerEvent::Diagnostic {
            error: GraphError::MissingParameter { .. }
        }
    )));
}

#[test]
fn direct_tree_needs_one_parameter_per_child() {
    let mut table = TargetTable::new();
    let children = vec![
        BlendChild {
            motion: leaf(0.0, &mut table),
            point: [0.0; 2],
            speed: 1.0,
        },
        BlendChild {
            motion: leaf(1.0, &mut table),
            point: [0.0; 2],
            speed: 1.0,
        },
    ];
    let err = BlendTree::new(BlendKind::Direct, vec!["a".into()], children, false).unwrap_err();
    assert!(matches!(err, GraphError::MalformedBlendTree { .. }));
}

#[test]
fn adding_a_child_rebuilds_pairs() {
    let mut t = tree(BlendKind::Cartesian2D, &["x", "y"], &[[0.0, 0.0], [1.0, 0.0]]);
    let mut table = TargetTable::new();
    let p = params(&[("x", 0.0), ("y", 1.0)]);
    let mut events = EventQueue::new(8);
    t.calculate_weights(&p, &mut events);
    t.push_child(BlendChild {
        motion: leaf(2.0, &mut table),
        point: [0.0, 1.0],
        speed: 1.0,
    })
    .unwrap();
    let w = t.calculate_weights(&p, &mut events).to_vec();
    assert_eq!(w.len(), 3);
    approx(w[2], 1.0, 1e-6);
    assert_eq!(t.weight_evaluations(), 2);
}

#[test]
fn synced_speeds_are_clip_rates_for_non_unit_speeds() {
    let mut table = TargetTable::new();
    let short = Arc::new(constant("short", 1.0, 0.0));
    let long = Arc::new(constant("long", 2.0, 1.0));
    let children = vec![
        BlendChild {
            motion: Motion::Clip(ClipNode::new(short, 1.0, &mut table).unwrap()),
            point: [0.0, 0.0],
            speed: 2.0,
        },
        BlendChild {
            motion: Motion::Clip(ClipNode::new(long, 1.0, &mut table).unwrap()),
            point: [1.0, 0.0],
            speed: 1.0,
        },
    ];
    let tree = BlendTree::new(BlendKind::OneD, vec!["x".into()], children, true).unwrap();
    let mut motion = Motion::Tree(Box::new(tree));
    let mut events = EventQueue::new(8);
    motion.update_weights(&params(&[("x", 0.5)]), &mut events);
    motion.advance(0.5, 1.0, true);

    // T = 0.5 * 1 / 2 + 0.5 * 2 / 1 = 1.25; each rate is d / T.
    let Motion::Tree(tree) = &motion else {
        unreachable!()
    };
    approx(tree.weighted_speeds()[0], 0.8, 1e-6);
    approx(tree.weighted_speeds()[1], 1.6, 1e-6);
    let clips = motion.clips();
    approx(clips[0].time() / clips[0].duration(), 0.4, 1e-6);
    approx(clips[1].time() / clips[1].duration(), 0.4, 1e-6);
}
