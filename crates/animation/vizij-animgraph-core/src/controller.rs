//! Controller: owns the state graph, parameters and output pose.
//!
//! One `update(dt)` per frame runs, in order: blend weights, time advance, cross-fade
//! progress, transition selection, pose composition and trigger reset. Build-time problems
//! are returned from [`Controller::new`]; per-frame problems become diagnostics.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::debug;

use crate::blend::{BlendChild, BlendTree, ClipNode, Motion};
use crate::config::{Config, EndBehavior};
use crate::def::{ControllerDef, MotionDef, StateDef, TransitionDef};
use crate::error::GraphError;
use crate::events::{ControllerEvent, EventQueue};
use crate::ids::{StateId, StateRef, ANY_STATE, END_STATE, START_STATE};
use crate::library::TrackProvider;
use crate::parameters::{ParamValue, Parameters};
use crate::pose::{Pose, PoseAccumulator, TargetTable};
use crate::state::AnimState;
use crate::transition::{AnimTransition, Condition, FadeSide, InterruptionSource};

/// A running cross-fade into the active state.
#[derive(Copy, Clone, Debug)]
struct Fade {
    duration: f32,
    elapsed: f32,
    interruption: InterruptionSource,
}

impl Fade {
    #[inline]
    fn fraction(&self) -> f32 {
        if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[derive(Debug)]
pub struct Controller {
    config: Config,
    table: Arc<TargetTable>,
    states: Vec<AnimState>,
    names: HashMap<String, StateId>,
    transitions: Vec<AnimTransition>,
    /// Transition indices by source state, priority-sorted.
    from_state: Vec<Vec<usize>>,
    from_any: Vec<usize>,
    from_start: Vec<usize>,
    initial_params: Parameters,
    params: Parameters,
    current: StateRef,
    previous: Option<StateId>,
    /// States still fading out with their frozen contribution.
    fading: Vec<(StateId, f32)>,
    fade: Option<Fade>,
    candidates: Vec<usize>,
    acc: PoseAccumulator,
    pose: Pose,
    events: EventQueue,
}

impl Controller {
    /// Resolve, bind and validate `def`. Tracks come from `provider`.
    pub fn new(
        def: &ControllerDef,
        provider: &dyn TrackProvider,
        config: Config,
    ) -> Result<Self, GraphError> {
        config.validate()?;

        let mut params = Parameters::new();
        for p in &def.parameters {
            params.set(&p.name, p.value)?;
        }

        let mut names = HashMap::new();
        for (i, state) in def.states.iter().enumerate() {
            if [START_STATE, END_STATE, ANY_STATE].contains(&state.name.as_str())
                || names.insert(state.name.clone(), StateId(i as u32)).is_some()
            {
                return Err(GraphError::DuplicateState {
                    state: state.name.clone(),
                });
            }
        }

        let mut table = TargetTable::new();
        let states = def
            .states
            .iter()
            .map(|s| build_state(s, provider, &mut table))
            .collect::<Result<Vec<_>, _>>()?;

        let transitions = def
            .transitions
            .iter()
            .map(|t| build_transition(t, &names))
            .collect::<Result<Vec<_>, _>>()?;

        let mut from_state = vec![Vec::new(); states.len()];
        let mut from_any = Vec::new();
        let mut from_start = Vec::new();
        for (i, t) in transitions.iter().enumerate() {
            match t.from {
                StateRef::Named(id) => from_state[id.index()].push(i),
                StateRef::Any => from_any.push(i),
                StateRef::Start => from_start.push(i),
                StateRef::End => {}
            }
        }
        let by_priority = |list: &mut Vec<usize>| list.sort_by_key(|&i| transitions[i].priority);
        from_state.iter_mut().for_each(by_priority);
        by_priority(&mut from_any);
        by_priority(&mut from_start);

        let table = Arc::new(table);
        let mut controller = Self {
            events: EventQueue::new(config.max_queued_events),
            config,
            acc: PoseAccumulator::new(table.clone()),
            pose: Pose::new(table.clone()),
            table,
            states,
            names,
            transitions,
            from_state,
            from_any,
            from_start,
            initial_params: params.clone(),
            params,
            current: StateRef::Start,
            previous: None,
            fading: Vec::new(),
            fade: None,
            candidates: Vec::new(),
        };
        debug!(
            name = def.name.as_str(),
            states = controller.states.len(),
            transitions = controller.transitions.len(),
            targets = controller.table.len(),
            "controller built"
        );
        if controller.config.enter_on_build {
            controller.enter();
            controller.compose();
        }
        Ok(controller)
    }

    /// Advance the graph by `dt` seconds. Never fails; problems are queued as diagnostics.
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        match self.current {
            StateRef::Start => {
                self.enter();
                if self.current == StateRef::Start {
                    self.params.reset_consumed_triggers();
                    return;
                }
            }
            StateRef::End => match self.config.end_behavior {
                EndBehavior::Hold => return,
                EndBehavior::Restart => self.enter(),
            },
            StateRef::Named(_) | StateRef::Any => {}
        }
        let StateRef::Named(active) = self.current else {
            return;
        };

        self.states[active.index()].update_weights(&self.params, &mut self.events);
        for &(id, _) in &self.fading {
            self.states[id.index()].update_weights(&self.params, &mut self.events);
        }
        self.states[active.index()].advance(dt);
        for &(id, _) in &self.fading {
            self.states[id.index()].advance(dt);
        }

        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            if fade.elapsed >= fade.duration {
                self.fade = None;
                self.fading.clear();
                let state = self.states[active.index()].name().to_string();
                debug!(state = state.as_str(), "transition finished");
                self.events
                    .push(ControllerEvent::TransitionFinished { state });
            }
        }

        if let Some(idx) = self.find_transition(active) {
            self.fire(idx);
        }

        self.compose();
        self.params.reset_consumed_triggers();
    }

    /// Pose from the most recent update.
    #[inline]
    pub fn current_pose(&self) -> &Pose {
        &self.pose
    }

    /// Set a parameter. Changing the type of an existing parameter is rejected.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), GraphError> {
        self.params.set(name, value)
    }

    #[inline]
    pub fn get_parameter(&self, name: &str) -> Option<ParamValue> {
        self.params.get(name)
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Switch to state `name`, cross-fading over `time` seconds from the current state and
    /// starting the destination at normalized `offset`. Returns the new active state.
    pub fn transition_to(
        &mut self,
        name: &str,
        time: f32,
        offset: Option<f32>,
    ) -> Result<StateId, GraphError> {
        let id = self.state_id(name)?;
        let from = self.active_state().to_string();
        check_timing(&from, name, time, None, offset)?;
        match self.switch_state(StateRef::Named(id), time, offset, InterruptionSource::None) {
            StateRef::Named(id) => Ok(id),
            _ => Err(GraphError::UnknownState {
                state: name.to_string(),
            }),
        }
    }

    /// Back to the build-time state: initial parameters, every state rewound.
    pub fn reset(&mut self) {
        self.params.restore(&self.initial_params);
        for state in &mut self.states {
            state.start_at(0.0);
        }
        self.current = StateRef::Start;
        self.previous = None;
        self.fading.clear();
        self.fade = None;
        self.pose.clear();
        if self.config.enter_on_build {
            self.enter();
            self.compose();
        }
    }

    /// Name of the active state, or `START` / `END`.
    pub fn active_state(&self) -> &str {
        self.ref_name(self.current)
    }

    /// Source of the most recent transition.
    pub fn previous_state(&self) -> Option<&str> {
        self.previous.map(|id| self.states[id.index()].name())
    }

    #[inline]
    pub fn is_transitioning(&self) -> bool {
        self.fade.is_some()
    }

    /// Cross-fade fraction in [0, 1] while transitioning.
    pub fn transition_progress(&self) -> Option<f32> {
        self.fade.map(|f| f.fraction())
    }

    /// Unbounded normalized progress of state `name`.
    pub fn state_progress(&self, name: &str) -> Option<f32> {
        self.names
            .get(name)
            .map(|id| self.states[id.index()].progress())
    }

    pub fn state(&self, name: &str) -> Option<&AnimState> {
        self.names.get(name).map(|id| &self.states[id.index()])
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(AnimState::name)
    }

    #[inline]
    pub fn transitions(&self) -> &[AnimTransition] {
        &self.transitions
    }

    /// Point transition `index` (declaration order) at another state or `END`.
    pub fn retarget_transition(&mut self, index: usize, to: &str) -> Result<(), GraphError> {
        let Some(from) = self.transitions.get(index).map(|t| t.from) else {
            return Err(GraphError::InvalidTransition {
                from: "?".into(),
                to: to.to_string(),
                reason: format!("no transition at index {index}"),
            });
        };
        let target = resolve_destination(self.ref_name(from), to, &self.names)?;
        self.transitions[index].set_to(target);
        Ok(())
    }

    #[inline]
    pub fn target_table(&self) -> &Arc<TargetTable> {
        &self.table
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn events(&self) -> &[ControllerEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        self.events.drain()
    }

    /// Events lost to the queue cap since construction.
    #[inline]
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    fn state_id(&self, name: &str) -> Result<StateId, GraphError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownState {
                state: name.to_string(),
            })
    }

    fn ref_name(&self, r: StateRef) -> &str {
        match r {
            StateRef::Start => START_STATE,
            StateRef::End => END_STATE,
            StateRef::Any => ANY_STATE,
            StateRef::Named(id) => self.states[id.index()].name(),
        }
    }

    /// Take the first START transition whose conditions hold, or the first declared state
    /// when START has no transitions.
    fn enter(&mut self) {
        let chosen = if self.from_start.is_empty() {
            if self.states.is_empty() {
                return;
            }
            Some((StateRef::Named(StateId(0)), None))
        } else {
            self.from_start.iter().find_map(|&i| {
                let t = &self.transitions[i];
                if t.conditions_met(&self.params, &mut self.events) {
                    for c in &t.conditions {
                        self.params.mark_consumed(&c.parameter);
                    }
                    Some((t.to(), t.transition_offset))
                } else {
                    None
                }
            })
        };
        if let Some((to, offset)) = chosen {
            self.current = StateRef::Start;
            self.switch_state(to, 0.0, offset, InterruptionSource::None);
        }
    }

    /// First transition, in priority order, whose exit gate and conditions pass.
    fn find_transition(&mut self, active: StateId) -> Option<usize> {
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        match self.fade {
            Some(fade) => {
                for side in fade.interruption.sides() {
                    match side {
                        FadeSide::Prev => {
                            if let Some(prev) = self.previous {
                                candidates.extend(&self.from_state[prev.index()]);
                            }
                        }
                        FadeSide::Next => candidates.extend(&self.from_state[active.index()]),
                    }
                }
                if !candidates.is_empty() {
                    candidates.extend(&self.from_any);
                }
            }
            None => {
                candidates.extend(&self.from_state[active.index()]);
                candidates.extend(&self.from_any);
                candidates.sort_by_key(|&i| self.transitions[i].priority);
            }
        }

        let mut winner = None;
        for &idx in &candidates {
            let t = &self.transitions[idx];
            if t.to() == StateRef::Named(active) && t.from != StateRef::Named(active) {
                continue;
            }
            let source = t.from.named().unwrap_or(active);
            let s = &self.states[source.index()];
            if !t.exit_gate_open(s.prev_progress(), s.progress()) {
                continue;
            }
            if t.conditions_met(&self.params, &mut self.events) {
                winner = Some(idx);
                break;
            }
        }
        self.candidates = candidates;
        winner
    }

    fn fire(&mut self, idx: usize) {
        let t = &self.transitions[idx];
        let (to, time, offset, interruption) =
            (t.to(), t.time, t.transition_offset, t.interruption_source);
        for c in &t.conditions {
            self.params.mark_consumed(&c.parameter);
        }
        self.switch_state(to, time, offset, interruption);
    }

    /// The only place the active state changes.
    fn switch_state(
        &mut self,
        to: StateRef,
        time: f32,
        offset: Option<f32>,
        interruption: InterruptionSource,
    ) -> StateRef {
        let from = self.current.named();
        let (dest, offset) = match to {
            StateRef::Named(id) => (id, offset),
            StateRef::End => {
                let restart = match self.config.end_behavior {
                    EndBehavior::Restart => self.restart_target(),
                    EndBehavior::Hold => None,
                };
                match restart {
                    Some(target) => target,
                    None => {
                        debug!(from = self.active_state(), "entered END");
                        self.previous = from.or(self.previous);
                        self.current = StateRef::End;
                        self.fading.clear();
                        self.fade = None;
                        self.events.push(ControllerEvent::StateEntered {
                            state: END_STATE.to_string(),
                        });
                        return StateRef::End;
                    }
                }
            }
            StateRef::Start | StateRef::Any => return self.current,
        };

        match from {
            Some(src) if time > 0.0 => {
                match self.fade {
                    Some(fade) => {
                        let f = fade.fraction();
                        for (_, w) in &mut self.fading {
                            *w *= 1.0 - f;
                        }
                        self.fading.push((src, f));
                    }
                    None => {
                        self.fading.clear();
                        self.fading.push((src, 1.0));
                    }
                }
                self.fading.retain(|&(id, _)| id != dest);
                self.fade = Some(Fade {
                    duration: time,
                    elapsed: 0.0,
                    interruption,
                });
            }
            _ => {
                self.fading.clear();
                self.fade = None;
            }
        }

        if from.is_some() {
            self.previous = from;
        }
        self.current = StateRef::Named(dest);
        let state = &mut self.states[dest.index()];
        state.start_at(offset.unwrap_or(0.0));
        state.update_weights(&self.params, &mut self.events);

        let to_name = self.states[dest.index()].name().to_string();
        if let (Some(src), Some(_)) = (from, self.fade) {
            let from_name = self.states[src.index()].name().to_string();
            debug!(
                from = from_name.as_str(),
                to = to_name.as_str(),
                duration = time,
                "transition started"
            );
            self.events.push(ControllerEvent::TransitionStarted {
                from: Some(from_name),
                to: to_name.clone(),
                duration: time,
            });
        }
        debug!(state = to_name.as_str(), "state entered");
        self.events
            .push(ControllerEvent::StateEntered { state: to_name });
        StateRef::Named(dest)
    }

    /// Entry state and offset used when END restarts the graph.
    fn restart_target(&self) -> Option<(StateId, Option<f32>)> {
        match self.from_start.first() {
            Some(&i) => {
                let t = &self.transitions[i];
                t.to().named().map(|id| (id, t.transition_offset))
            }
            None => (!self.states.is_empty()).then_some((StateId(0), None)),
        }
    }

    fn compose(&mut self) {
        let StateRef::Named(active) = self.current else {
            return;
        };
        let f = self.fade.map_or(1.0, |fade| fade.fraction());
        let eps = self.config.weight_epsilon;
        self.acc.clear();
        if let Err(err) = self.states[active.index()].accumulate(f, eps, &mut self.acc) {
            self.events.diagnostic(err);
        }
        for &(id, w) in &self.fading {
            let state = &mut self.states[id.index()];
            if let Err(err) = state.accumulate(w * (1.0 - f), eps, &mut self.acc) {
                self.events.diagnostic(err);
            }
        }
        self.acc.finalize_into(&mut self.pose);
    }
}

fn build_state(
    def: &StateDef,
    provider: &dyn TrackProvider,
    table: &mut TargetTable,
) -> Result<AnimState, GraphError> {
    if !def.speed.is_finite() {
        return Err(GraphError::MalformedBlendTree {
            reason: format!("state '{}' has a non-finite speed", def.name),
        });
    }
    let motions = def
        .motions
        .iter()
        .map(|m| build_motion(m, provider, table))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AnimState::new(&def.name, def.speed, def.looping, motions))
}

fn build_motion(
    def: &MotionDef,
    provider: &dyn TrackProvider,
    table: &mut TargetTable,
) -> Result<Motion, GraphError> {
    match def {
        MotionDef::Clip { track, speed } => {
            let data = provider
                .track(track)
                .ok_or_else(|| GraphError::UnknownTrack { key: track.clone() })?;
            data.validate()?;
            Ok(Motion::Clip(ClipNode::new(data, *speed, table)?))
        }
        MotionDef::BlendTree(tree) => {
            let children = tree
                .children
                .iter()
                .map(|c| {
                    Ok(BlendChild {
                        motion: build_motion(&c.motion, provider, table)?,
                        point: c.point.map_or([0.0; 2], |p| p.to_array()),
                        speed: c.speed,
                    })
                })
                .collect::<Result<Vec<_>, GraphError>>()?;
            let tree = BlendTree::new(
                tree.blend,
                tree.parameters.clone(),
                children,
                tree.sync_durations,
            )?;
            Ok(Motion::Tree(Box::new(tree)))
        }
    }
}

fn resolve_source(name: &str, names: &HashMap<String, StateId>) -> Result<StateRef, GraphError> {
    match name {
        START_STATE => Ok(StateRef::Start),
        ANY_STATE => Ok(StateRef::Any),
        END_STATE => Err(GraphError::InvalidTransition {
            from: name.to_string(),
            to: "?".into(),
            reason: "END has no outgoing transitions".into(),
        }),
        _ => names
            .get(name)
            .map(|&id| StateRef::Named(id))
            .ok_or_else(|| GraphError::UnknownState {
                state: name.to_string(),
            }),
    }
}

fn resolve_destination(
    from: &str,
    to: &str,
    names: &HashMap<String, StateId>,
) -> Result<StateRef, GraphError> {
    match to {
        END_STATE => Ok(StateRef::End),
        START_STATE | ANY_STATE => Err(GraphError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: format!("{to} cannot be a destination"),
        }),
        _ => names
            .get(to)
            .map(|&id| StateRef::Named(id))
            .ok_or_else(|| GraphError::UnknownState {
                state: to.to_string(),
            }),
    }
}

fn check_timing(
    from: &str,
    to: &str,
    time: f32,
    exit_time: Option<f32>,
    offset: Option<f32>,
) -> Result<(), GraphError> {
    let invalid = |reason: String| GraphError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    };
    if !time.is_finite() || time < 0.0 {
        return Err(invalid(format!("fade time must be finite and >= 0, got {time}")));
    }
    if let Some(exit) = exit_time {
        if !exit.is_finite() || exit <= 0.0 {
            return Err(invalid(format!("exit time must be > 0, got {exit}")));
        }
    }
    if let Some(offset) = offset {
        if !(0.0..=1.0).contains(&offset) {
            return Err(invalid(format!("offset must be in [0, 1], got {offset}")));
        }
    }
    Ok(())
}

fn build_transition(
    def: &TransitionDef,
    names: &HashMap<String, StateId>,
) -> Result<AnimTransition, GraphError> {
    let from = resolve_source(&def.from, names)?;
    let to = resolve_destination(&def.from, &def.to, names)?;
    check_timing(
        &def.from,
        &def.to,
        def.time,
        def.exit_time,
        def.transition_offset,
    )?;
    let mut t = AnimTransition::new(from, to);
    t.time = def.time;
    t.priority = def.priority;
    t.exit_time = def.exit_time;
    t.transition_offset = def.transition_offset;
    t.interruption_source = def.interruption_source;
    t.conditions = def
        .conditions
        .iter()
        .map(|c| Condition {
            parameter: c.parameter.clone(),
            predicate: c.predicate,
            value: c.value.as_f32(),
        })
        .collect();
    Ok(t)
}
