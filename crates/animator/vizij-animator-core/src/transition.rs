//! Guarded edges between states.
//!
//! A transition stores its destination as a [`StateId`] into the owning state
//! machine's arena, never as a reference, so the state graph has no ownership
//! cycles. Guard evaluation lives in [`crate::StateMachine::update`].

use crate::condition::{Condition, ConditionMode};
use crate::ids::{ConditionId, StateId, TransitionId};

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub id: TransitionId,
    pub name: String,
    /// Muted transitions are never evaluated.
    pub is_mute: bool,
    /// Gate on clip progress in addition to the conditions.
    pub has_exit_time: bool,
    /// Normalized progress (or seconds with `has_fixed_duration`) that opens the gate.
    pub exit_time: f32,
    /// Interpret `exit_time` in seconds and use `duration` as the blend length.
    pub has_fixed_duration: bool,
    /// Crossfade length in seconds; used only with `has_exit_time`.
    pub duration: f32,
    /// Extra seconds added to the blend.
    pub offset: f32,
    pub destination: Option<StateId>,
    pub conditions: Vec<Condition>,
    next_condition_id: u64,
}

impl Transition {
    pub fn new(id: TransitionId) -> Self {
        Self {
            id,
            name: String::new(),
            is_mute: false,
            has_exit_time: false,
            exit_time: 1.0,
            has_fixed_duration: false,
            duration: 0.0,
            offset: 0.0,
            destination: None,
            conditions: Vec::new(),
            next_condition_id: 0,
        }
    }

    pub fn with_destination(id: TransitionId, destination: StateId) -> Self {
        Self {
            destination: Some(destination),
            ..Self::new(id)
        }
    }

    /// Append a condition unless an identical (parameter, mode, threshold) one exists.
    /// Returns the existing or new condition.
    pub fn add_condition(
        &mut self,
        parameter: &str,
        mode: ConditionMode,
        threshold: f32,
    ) -> &mut Condition {
        let existing = self
            .conditions
            .iter()
            .position(|c| c.matches(parameter, mode, threshold));
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let id = self.alloc_condition_id();
                self.conditions
                    .push(Condition::new(id, parameter, mode, threshold));
                self.conditions.len() - 1
            }
        };
        &mut self.conditions[idx]
    }

    /// Push a deserialized condition, assigning it a fresh id.
    pub(crate) fn push_condition(&mut self, mut condition: Condition) {
        condition.id = self.alloc_condition_id();
        self.conditions.push(condition);
    }

    pub fn condition(&self, id: ConditionId) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id == id)
    }

    /// Remove by identity (the condition's id).
    pub fn remove_condition(&mut self, condition: &Condition) -> bool {
        self.remove_condition_by_id(condition.id)
    }

    pub fn remove_condition_by_id(&mut self, id: ConditionId) -> bool {
        match self.conditions.iter().position(|c| c.id == id) {
            Some(idx) => {
                self.conditions.remove(idx);
                true
            }
            None => false,
        }
    }

    /// True when no conditions guard this transition.
    #[inline]
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }

    fn alloc_condition_id(&mut self) -> ConditionId {
        let id = ConditionId(self.next_condition_id);
        self.next_condition_id = self.next_condition_id.wrapping_add(1);
        id
    }
}
