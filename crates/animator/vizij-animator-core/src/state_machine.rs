//! One animator layer: a state arena plus the per-frame transition and
//! crossfade algorithm.
//!
//! Every machine carries three bookkeeping states created in [`StateMachine::new`]:
//! Enter (the starting point, no clip), Exit (reaching it idles the layer) and
//! Any (its transitions are evaluated after the current state's every tick).
//!
//! Per tick ([`StateMachine::update`]):
//! 1. idle layers do nothing; a layer sitting on Exit goes idle;
//! 2. while blending, advance the crossfade and commit once it completes;
//! 3. otherwise pick the first passing transition of `current ++ any` and either
//!    start a blend or switch immediately.
//!
//! A running blend is never interrupted by another transition.

use std::path::{Path, PathBuf};

use crate::clip::{ClipProvider, MotionClip};
use crate::config::MAX_LAYERS;
use crate::error::AnimatorError;
use crate::figure::AnimatorSlot;
use crate::ids::{IdAllocator, StateId, TransitionId};
use crate::outputs::{FigureCommand, Outputs, StateEvent};
use crate::parameter::{ParameterTable, ParameterType};
use crate::state::{State, StateType};
use crate::stored::StoredLayer;
use crate::transition::Transition;

#[derive(Clone, Debug)]
pub struct StateMachine {
    layer: usize,
    name: String,
    ids: IdAllocator,
    states: Vec<State>,
    enter_state: StateId,
    exit_state: StateId,
    any_state: StateId,
    current: Option<StateId>,
    next: Option<StateId>,
    transition_time: f32,
    transition_duration: f32,
}

impl StateMachine {
    /// Create a layer with its Enter, Exit and Any states. The layer index is
    /// clamped into the figure's slot range.
    pub fn new(layer: usize) -> Self {
        let mut ids = IdAllocator::new();
        let mut states = Vec::with_capacity(3);
        let enter_state = ids.alloc_state();
        let exit_state = ids.alloc_state();
        let any_state = ids.alloc_state();
        for (id, name, ty, pos) in [
            (enter_state, "Entry", StateType::Enter, [100.0, 100.0]),
            (exit_state, "Exit", StateType::Exit, [500.0, 100.0]),
            (any_state, "Any", StateType::Any, [100.0, 200.0]),
        ] {
            let mut state = State::new(id, name, ty);
            state.set_position(pos);
            states.push(state);
        }
        Self {
            layer: layer.min(MAX_LAYERS - 1),
            name: String::new(),
            ids,
            states,
            enter_state,
            exit_state,
            any_state,
            current: Some(enter_state),
            next: None,
            transition_time: 0.0,
            transition_duration: 0.0,
        }
    }

    /// Reset to a fresh machine on the same layer.
    pub fn clear(&mut self) {
        let name = std::mem::take(&mut self.name);
        *self = Self::new(self.layer);
        self.name = name;
    }

    #[inline]
    pub fn layer(&self) -> usize {
        self.layer
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    // ----- states -----

    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.iter().find(|s| s.id() == id)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.states.iter_mut().find(|s| s.id() == id)
    }

    #[inline]
    pub fn has_state(&self, id: StateId) -> bool {
        self.state(id).is_some()
    }

    pub fn has_state_name(&self, name: &str) -> bool {
        self.find_state_by_name(name).is_some()
    }

    pub fn find_state_by_name(&self, name: &str) -> Option<StateId> {
        self.states.iter().find(|s| s.name() == name).map(State::id)
    }

    pub fn find_state_by_uuid(&self, uuid: &str) -> Option<StateId> {
        self.states
            .iter()
            .find(|s| s.uuid().to_string() == uuid)
            .map(State::id)
    }

    #[inline]
    pub fn enter_state(&self) -> StateId {
        self.enter_state
    }

    #[inline]
    pub fn exit_state(&self) -> StateId {
        self.exit_state
    }

    #[inline]
    pub fn any_state(&self) -> StateId {
        self.any_state
    }

    /// Add a normal state named `name`.
    pub fn add_state(&mut self, name: &str) -> StateId {
        let id = self.ids.alloc_state();
        self.states.push(State::new(id, name, StateType::Normal));
        id
    }

    /// Convenience: add a state and bind its clip in one go.
    pub fn add_state_with_clip(
        &mut self,
        name: &str,
        clip_path: &str,
        clips: &mut dyn ClipProvider,
    ) -> StateId {
        let id = self.add_state(name);
        if let Some(state) = self.state_mut(id) {
            state.set_path(clip_path, clips);
        }
        id
    }

    /// Remove a normal state and every transition that targeted it.
    /// Enter/Exit/Any cannot be removed. If the removed state was active the
    /// layer falls back to Enter; a blend towards it is cancelled. Slot changes
    /// for the figure are written to `out`.
    pub fn remove_state(&mut self, id: StateId, out: &mut Outputs) -> bool {
        if id == self.enter_state || id == self.exit_state || id == self.any_state {
            return false;
        }
        let Some(idx) = self.states.iter().position(|s| s.id() == id) else {
            return false;
        };
        self.states.remove(idx);
        for state in &mut self.states {
            state.remove_transitions_to(id);
        }
        if self.current == Some(id) {
            let enter = self.enter_state;
            self.set_current_state(Some(enter), out);
        } else if self.next == Some(id) {
            self.next = None;
            self.transition_time = 0.0;
            self.transition_duration = 0.0;
            out.push_command(FigureCommand::BindAnimator {
                layer: self.layer,
                slot: AnimatorSlot::Secondary,
                clip: None,
            });
            out.push_command(FigureCommand::SetBlendingWeight {
                layer: self.layer,
                weight: 0.0,
            });
        }
        true
    }

    /// Commands that empty both figure slots of this layer.
    pub fn unbind_commands(&self) -> [FigureCommand; 3] {
        [
            FigureCommand::BindAnimator {
                layer: self.layer,
                slot: AnimatorSlot::Primary,
                clip: None,
            },
            FigureCommand::BindAnimator {
                layer: self.layer,
                slot: AnimatorSlot::Secondary,
                clip: None,
            },
            FigureCommand::SetBlendingWeight {
                layer: self.layer,
                weight: 0.0,
            },
        ]
    }

    // ----- transitions -----

    /// Add a transition `from -> to`. Both states must belong to this machine.
    pub fn add_transition(
        &mut self,
        from: StateId,
        to: StateId,
        with_exit_time: bool,
    ) -> Option<&mut Transition> {
        if !self.has_state(to) {
            return None;
        }
        let id = self.ids.alloc_transition();
        let state = self.states.iter_mut().find(|s| s.id() == from)?;
        Some(state.add_transition(id, to, with_exit_time))
    }

    /// Add a transition from `from` to this machine's Exit state.
    pub fn add_exit_transition(
        &mut self,
        from: StateId,
        with_exit_time: bool,
    ) -> Option<&mut Transition> {
        let exit = self.exit_state;
        self.add_transition(from, exit, with_exit_time)
    }

    /// Add a global transition (owned by the Any state) towards `to`.
    pub fn add_any_state_transition(&mut self, to: StateId) -> Option<&mut Transition> {
        let any = self.any_state;
        let t = self.add_transition(any, to, false)?;
        t.has_fixed_duration = true;
        t.duration = 0.25;
        t.exit_time = 0.75;
        Some(t)
    }

    pub fn remove_transition(&mut self, from: StateId, id: TransitionId) -> bool {
        self.state_mut(from)
            .map(|s| s.remove_transition(id))
            .unwrap_or(false)
    }

    pub fn transition(&self, from: StateId, id: TransitionId) -> Option<&Transition> {
        self.state(from).and_then(|s| s.transition(id))
    }

    pub fn transition_mut(&mut self, from: StateId, id: TransitionId) -> Option<&mut Transition> {
        self.state_mut(from).and_then(|s| s.transition_mut(id))
    }

    /// True when either `a -> b` or `b -> a` exists.
    pub fn has_transition(&self, a: StateId, b: StateId) -> bool {
        let links = |from: StateId, to: StateId| {
            self.state(from)
                .map(|s| s.find_transition(to).is_some())
                .unwrap_or(false)
        };
        links(a, b) || links(b, a)
    }

    // ----- runtime -----

    #[inline]
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    /// Blend target while a crossfade is running.
    #[inline]
    pub fn next_state(&self) -> Option<StateId> {
        self.next
    }

    #[inline]
    pub fn transition_time(&self) -> f32 {
        self.transition_time
    }

    #[inline]
    pub fn transition_duration(&self) -> f32 {
        self.transition_duration
    }

    #[inline]
    pub fn is_blending(&self) -> bool {
        matches!((self.current, self.next), (Some(c), Some(n)) if c != n)
    }

    /// Switch the active state. Fires exit/enter, binds the new clip into the
    /// primary slot and clears the secondary. Blend counters are reset even
    /// when `state` is already current. Unknown ids are rejected.
    pub fn set_current_state(&mut self, state: Option<StateId>, out: &mut Outputs) -> bool {
        if let Some(id) = state {
            if !self.has_state(id) {
                log::warn!("layer {}: set_current_state with unknown {id:?}", self.layer);
                return false;
            }
        }
        if self.current != state {
            let layer = self.layer;
            let from_blend = self.next.is_some() && self.next == state;
            if let Some(old) = self.current.and_then(|id| self.state(id)) {
                old.exit(layer, out);
            }
            self.current = state;
            let new_state = state.and_then(|id| self.state(id));
            if let Some(new_state) = new_state {
                if !from_blend {
                    new_state.rewind_clip();
                }
                new_state.enter(layer, out);
                log::debug!("layer {layer}: entered '{}'", new_state.name());
            }
            out.push_command(FigureCommand::BindAnimator {
                layer,
                slot: AnimatorSlot::Primary,
                clip: new_state.and_then(|s| s.clip().cloned()),
            });
            out.push_command(FigureCommand::BindAnimator {
                layer,
                slot: AnimatorSlot::Secondary,
                clip: None,
            });
        }
        self.transition_time = 0.0;
        self.transition_duration = 0.0;
        self.next = None;
        true
    }

    /// Advance this layer by `dt` seconds.
    ///
    /// Trigger parameters read by a passing condition are reset to 0 as soon as
    /// that condition is checked, even if the transition owning it is not taken.
    pub fn update(&mut self, dt: f32, params: &mut ParameterTable, out: &mut Outputs) {
        let Some(current) = self.current else {
            return;
        };
        if current == self.exit_state {
            self.current = None;
            out.push_event(StateEvent::LayerIdle { layer: self.layer });
            log::debug!("layer {}: reached Exit, idling", self.layer);
            return;
        }

        if let Some(next) = self.next.filter(|n| *n != current) {
            if self.transition_duration <= 0.0 || self.transition_time >= self.transition_duration {
                self.set_current_state(Some(next), out);
                return;
            }
            self.transition_time = (self.transition_time + dt).min(self.transition_duration);
            out.push_command(FigureCommand::SetBlendingWeight {
                layer: self.layer,
                weight: self.transition_time / self.transition_duration,
            });
            return;
        }

        let Some((dest, duration)) = self.select_transition(current, params) else {
            return;
        };
        if dest == current {
            return;
        }

        if duration > 0.0 {
            self.next = Some(dest);
            self.transition_time = 0.0;
            self.transition_duration = duration;
            let layer = self.layer;
            let clip = self.state(dest).and_then(|s| {
                s.rewind_clip();
                s.clip().cloned()
            });
            out.push_command(FigureCommand::BindAnimator {
                layer,
                slot: AnimatorSlot::Secondary,
                clip,
            });
            out.push_event(StateEvent::TransitionStarted {
                layer,
                from: current,
                to: dest,
                duration,
            });
            log::debug!("layer {layer}: blending {current:?} -> {dest:?} over {duration}s");
        } else {
            self.set_current_state(Some(dest), out);
        }
    }

    /// First passing transition of the current state, then of the Any state.
    /// Returns its destination and the blend duration it asks for.
    fn select_transition(
        &self,
        current: StateId,
        params: &mut ParameterTable,
    ) -> Option<(StateId, f32)> {
        let state = self.state(current)?;
        let clip = state.clip().cloned();
        let any = self.state(self.any_state).map(State::transitions).unwrap_or(&[]);

        let selected = state.transitions().iter().chain(any.iter()).find(|t| {
            let Some(dest) = t.destination else {
                return false;
            };
            if t.is_mute || !self.has_state(dest) {
                return false;
            }
            passes(t, clip.as_deref(), params, self.layer)
        })?;

        let dest = selected.destination?;
        let blend = if selected.has_exit_time {
            if selected.has_fixed_duration {
                selected.duration
            } else {
                let dest_end = self
                    .state(dest)
                    .and_then(State::clip)
                    .map(|c| c.end_time())
                    .unwrap_or(0.0);
                selected.exit_time * dest_end
            }
        } else {
            0.0
        };
        log::debug!(
            "layer {}: transition {:?} selected towards {dest:?}",
            self.layer,
            selected.id
        );
        Some((dest, selected.offset + blend))
    }

    // ----- persistence -----

    /// Write this layer as a standalone `.anim` document. Returns `false` when
    /// the path is empty or the file cannot be written.
    pub fn save(&self, path: &str) -> bool {
        match self.try_save(path) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("layer {}: save failed: {err}", self.layer);
                false
            }
        }
    }

    pub fn try_save(&self, path: &str) -> Result<PathBuf, AnimatorError> {
        if path.is_empty() {
            return Err(AnimatorError::EmptyPath);
        }
        let fs_path = Path::new(path).with_extension("anim");
        let json = serde_json::to_string_pretty(&self.to_stored())?;
        std::fs::write(&fs_path, json).map_err(|e| AnimatorError::io(&fs_path, e))?;
        Ok(fs_path)
    }

    /// Read a standalone layer document written by [`StateMachine::save`].
    pub fn load_file(path: &str, clips: &mut dyn ClipProvider) -> Result<Self, AnimatorError> {
        let fs_path = Path::new(path);
        let text = std::fs::read_to_string(fs_path).map_err(|e| AnimatorError::io(fs_path, e))?;
        let stored: StoredLayer =
            serde_json::from_str(&text).map_err(|e| AnimatorError::parse(fs_path, e))?;
        Ok(Self::from_stored(&stored, 0, clips))
    }

    pub fn to_json(&self) -> Result<String, AnimatorError> {
        Ok(serde_json::to_string(&self.to_stored())?)
    }

    pub fn from_json(
        json: &str,
        clips: &mut dyn ClipProvider,
    ) -> Result<Self, AnimatorError> {
        let stored: StoredLayer = serde_json::from_str(json)?;
        Ok(Self::from_stored(&stored, 0, clips))
    }

    pub(crate) fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// Install deserialized states. The first Enter/Exit/Any states found become
    /// the bookkeeping states; missing ones are synthesized.
    pub(crate) fn install_states(&mut self, states: Vec<State>) {
        self.states = states;
        for (ty, name) in [
            (StateType::Enter, "Entry"),
            (StateType::Exit, "Exit"),
            (StateType::Any, "Any"),
        ] {
            let id = match self.states.iter().find(|s| s.ty() == ty) {
                Some(s) => s.id(),
                None => {
                    log::warn!("layer {}: document lacks a {name} state", self.layer);
                    let id = self.ids.alloc_state();
                    self.states.push(State::new(id, name, ty));
                    id
                }
            };
            match ty {
                StateType::Enter => self.enter_state = id,
                StateType::Exit => self.exit_state = id,
                _ => self.any_state = id,
            }
        }
        self.current = Some(self.enter_state);
        self.next = None;
        self.transition_time = 0.0;
        self.transition_duration = 0.0;
    }
}

/// Guard check for one transition.
///
/// Passes when the transition is unconditional, when its exit-time gate has
/// been crossed, or when every condition holds. Conditions on parameters the
/// table does not know fail.
fn passes(
    t: &Transition,
    clip: Option<&dyn MotionClip>,
    params: &mut ParameterTable,
    layer: usize,
) -> bool {
    if t.is_unconditional() {
        return true;
    }

    if let (Some(clip), true) = (clip, t.has_exit_time) {
        let reached = if t.has_fixed_duration {
            clip.eval_time() > t.exit_time
        } else {
            let end = clip.end_time();
            end > 0.0 && clip.eval_time() / end > t.exit_time
        };
        if reached {
            return true;
        }
    }

    for cond in &t.conditions {
        let Some(param) = params.lookup(&cond.parameter) else {
            return false;
        };
        if !cond.evaluate(param.value) {
            return false;
        }
        if param.ty == ParameterType::Trigger {
            params.set(&cond.parameter, ParameterType::Trigger, 0.0);
            log::trace!("layer {layer}: consumed trigger '{}'", cond.parameter);
        }
    }
    true
}
