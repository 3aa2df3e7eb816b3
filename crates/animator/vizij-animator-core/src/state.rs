//! Animator states.
//!
//! A state wraps one motion clip and owns its outgoing transitions. The three
//! bookkeeping states every machine carries (Enter, Exit, Any) are ordinary
//! states distinguished by [`StateType`]; the state machine branches on the tag.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::{ClipHandle, ClipProvider};
use crate::ids::{StateId, TransitionId};
use crate::outputs::{Outputs, StateEvent};
use crate::path;
use crate::transition::Transition;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum StateType {
    Enter = 0,
    Exit = 1,
    Any = 2,
    #[default]
    Normal = 3,
}

impl From<i32> for StateType {
    fn from(index: i32) -> Self {
        match index {
            0 => Self::Enter,
            1 => Self::Exit,
            2 => Self::Any,
            _ => Self::Normal,
        }
    }
}

impl From<StateType> for i32 {
    fn from(ty: StateType) -> Self {
        ty as i32
    }
}

#[derive(Clone, Debug)]
pub struct State {
    id: StateId,
    uuid: Uuid,
    name: String,
    ty: StateType,
    path: String,
    clip: Option<ClipHandle>,
    speed: f32,
    start_time: f32,
    looping: bool,
    /// Editor graph position; no runtime meaning.
    position: [f32; 2],
    transitions: Vec<Transition>,
}

impl State {
    pub fn new(id: StateId, name: &str, ty: StateType) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            ty,
            path: String::new(),
            clip: None,
            speed: 1.0,
            start_time: 0.0,
            looping: true,
            position: [0.0, 0.0],
            transitions: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> StateId {
        self.id
    }

    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub(crate) fn set_uuid(&mut self, uuid: Uuid) {
        self.uuid = uuid;
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[inline]
    pub fn ty(&self) -> StateType {
        self.ty
    }

    #[inline]
    pub fn is_enter(&self) -> bool {
        self.ty == StateType::Enter
    }

    #[inline]
    pub fn is_exit(&self) -> bool {
        self.ty == StateType::Exit
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        self.ty == StateType::Any
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bound playback handle, if the path resolved.
    #[inline]
    pub fn clip(&self) -> Option<&ClipHandle> {
        self.clip.as_ref()
    }

    /// Rebind the motion clip. The path is normalized first; nothing happens when
    /// it is unchanged. The previous handle is released and the cached speed is
    /// applied to the new one. Unnamed states take the clip's file stem as name.
    /// Returns whether the path changed.
    pub fn set_path(&mut self, clip_path: &str, clips: &mut dyn ClipProvider) -> bool {
        let rel = path::normalize(clip_path);
        if rel == self.path {
            return false;
        }
        self.clip = None;
        self.path = rel;
        if self.name.is_empty() {
            self.name = path::stem(&self.path);
        }
        if !self.path.is_empty() {
            self.clip = clips.acquire(&self.path);
            match &self.clip {
                Some(clip) => clip.set_speed(self.speed),
                None => log::warn!("state '{}': clip '{}' not found", self.name, self.path),
            }
        }
        true
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if let Some(clip) = &self.clip {
            clip.set_speed(speed);
        }
    }

    #[inline]
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    pub fn set_start_time(&mut self, start_time: f32) {
        self.start_time = start_time;
    }

    #[inline]
    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    #[inline]
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    pub fn set_position(&mut self, position: [f32; 2]) {
        self.position = position;
    }

    #[inline]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    #[inline]
    pub fn transitions_mut(&mut self) -> &mut [Transition] {
        &mut self.transitions
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.transitions.iter_mut().find(|t| t.id == id)
    }

    /// First transition whose destination is `dst`.
    pub fn find_transition(&self, dst: StateId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.destination == Some(dst))
    }

    /// Build and append a transition to `dst`. With `with_exit_time` the exit
    /// gate and duration are taken from the bound clip (1s defaults without one).
    pub(crate) fn add_transition(
        &mut self,
        id: TransitionId,
        dst: StateId,
        with_exit_time: bool,
    ) -> &mut Transition {
        let mut transition = Transition::with_destination(id, dst);
        if with_exit_time {
            transition.has_exit_time = true;
            transition.exit_time = 1.0;
            transition.duration = 1.0;
            if let Some(clip) = &self.clip {
                transition.exit_time = clip.end_time();
                transition.duration = clip.total_eval_time();
            }
        }
        self.push_transition(transition)
    }

    pub(crate) fn push_transition(&mut self, transition: Transition) -> &mut Transition {
        self.transitions.push(transition);
        let last = self.transitions.len() - 1;
        &mut self.transitions[last]
    }

    pub fn remove_transition(&mut self, id: TransitionId) -> bool {
        let before = self.transitions.len();
        self.transitions.retain(|t| t.id != id);
        before != self.transitions.len()
    }

    /// Drop every transition pointing at `dst`; returns how many were removed.
    pub(crate) fn remove_transitions_to(&mut self, dst: StateId) -> usize {
        let before = self.transitions.len();
        self.transitions.retain(|t| t.destination != Some(dst));
        before - self.transitions.len()
    }

    /// Rewind the clip to this state's start time and apply its loop flag.
    pub(crate) fn rewind_clip(&self) {
        if let Some(clip) = &self.clip {
            clip.set_looping(self.looping);
            clip.seek(self.start_time);
        }
    }

    pub fn enter(&self, layer: usize, out: &mut Outputs) {
        out.push_event(StateEvent::Entered {
            layer,
            state: self.id,
            name: self.name.clone(),
        });
    }

    pub fn exit(&self, layer: usize, out: &mut Outputs) {
        out.push_event(StateEvent::Exited {
            layer,
            state: self.id,
            name: self.name.clone(),
        });
    }
}
