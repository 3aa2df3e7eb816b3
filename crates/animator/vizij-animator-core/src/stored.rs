//! `.anim` document schema and conversion into live state machines.
//!
//! Transitions reference their destination by state UUID string. Destinations
//! may appear later in the `states` array, so loading runs in two passes: build
//! every state first, then resolve transition destinations against the full
//! UUID table.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::ClipProvider;
use crate::condition::Condition;
use crate::ids::StateId;
use crate::parameter::Parameter;
use crate::state::{State, StateType};
use crate::state_machine::StateMachine;
use crate::transition::Transition;

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn default_layer() -> i32 {
    -1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTransition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mute: bool,
    #[serde(default = "default_true")]
    pub has_exit_time: bool,
    #[serde(default = "default_one")]
    pub exit_time: f32,
    #[serde(default)]
    pub has_fixed_duration: bool,
    #[serde(default = "default_one")]
    pub duration: f32,
    #[serde(default)]
    pub offset: f32,
    /// UUID of the destination state; resolved after all states are built.
    #[serde(default)]
    pub dest_state: String,
    #[serde(default)]
    pub conds: Vec<Condition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: StateType,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_one")]
    pub speed: f32,
    #[serde(default)]
    pub start_time: f32,
    #[serde(rename = "loop", default = "default_true")]
    pub looping: bool,
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub transitions: Vec<StoredTransition>,
}

/// One layer: `{layer, states[]}`. Also the standalone state machine document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredLayer {
    #[serde(default = "default_layer")]
    pub layer: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub states: Vec<StoredState>,
}

/// Whole controller document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredController {
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_one")]
    pub time_scale: f32,
    #[serde(default)]
    pub params: BTreeMap<String, Parameter>,
    /// Absent means "one default layer"; an explicit empty list means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<StoredLayer>>,
}

impl Default for StoredController {
    fn default() -> Self {
        Self {
            model: String::new(),
            time_scale: 1.0,
            params: BTreeMap::new(),
            layers: None,
        }
    }
}

impl StateMachine {
    pub fn to_stored(&self) -> StoredLayer {
        let uuid_of: HashMap<StateId, String> = self
            .states()
            .iter()
            .map(|s| (s.id(), s.uuid().to_string()))
            .collect();

        let states = self
            .states()
            .iter()
            .map(|s| StoredState {
                uuid: s.uuid().to_string(),
                name: s.name().to_string(),
                ty: s.ty(),
                path: s.path().to_string(),
                speed: s.speed(),
                start_time: s.start_time(),
                looping: s.looping(),
                position: s.position(),
                transitions: s
                    .transitions()
                    .iter()
                    .map(|t| StoredTransition {
                        name: t.name.clone(),
                        mute: t.is_mute,
                        has_exit_time: t.has_exit_time,
                        exit_time: t.exit_time,
                        has_fixed_duration: t.has_fixed_duration,
                        duration: t.duration,
                        offset: t.offset,
                        dest_state: t
                            .destination
                            .and_then(|d| uuid_of.get(&d).cloned())
                            .unwrap_or_default(),
                        conds: t.conditions.clone(),
                    })
                    .collect(),
            })
            .collect();

        StoredLayer {
            layer: self.layer() as i32,
            name: self.name().to_string(),
            states,
        }
    }

    /// Build a machine from a stored layer. A negative `layer` field falls back
    /// to `fallback_layer`. Clip paths are acquired through `clips`.
    pub fn from_stored(
        stored: &StoredLayer,
        fallback_layer: usize,
        clips: &mut dyn ClipProvider,
    ) -> Self {
        let layer = usize::try_from(stored.layer).unwrap_or(fallback_layer);
        let mut sm = StateMachine::new(layer);
        sm.set_name(&stored.name);

        // Pass 1: states.
        let mut by_uuid: HashMap<String, StateId> = HashMap::with_capacity(stored.states.len());
        let mut states = Vec::with_capacity(stored.states.len());
        for ss in &stored.states {
            let id = sm.ids_mut().alloc_state();
            let mut state = State::new(id, &ss.name, ss.ty);
            let uuid = match Uuid::parse_str(&ss.uuid) {
                Ok(uuid) => uuid,
                Err(_) => {
                    if !ss.uuid.is_empty() {
                        log::warn!("state '{}': malformed uuid '{}'", ss.name, ss.uuid);
                    }
                    Uuid::new_v4()
                }
            };
            state.set_uuid(uuid);
            state.set_speed(ss.speed);
            state.set_start_time(ss.start_time);
            state.set_looping(ss.looping);
            state.set_position(ss.position);
            if !ss.path.is_empty() {
                state.set_path(&ss.path, clips);
            }
            if !ss.uuid.is_empty() {
                by_uuid.insert(ss.uuid.clone(), id);
            }
            by_uuid.insert(uuid.to_string(), id);
            states.push(state);
        }

        // Pass 2: transitions, now that every destination exists.
        for (ss, state) in stored.states.iter().zip(states.iter_mut()) {
            for st in &ss.transitions {
                let id = sm.ids_mut().alloc_transition();
                let mut t = Transition::new(id);
                t.name = st.name.clone();
                t.is_mute = st.mute;
                t.has_exit_time = st.has_exit_time;
                t.exit_time = st.exit_time;
                t.has_fixed_duration = st.has_fixed_duration;
                t.duration = st.duration;
                t.offset = st.offset;
                t.destination = by_uuid.get(&st.dest_state).copied();
                if t.destination.is_none() && !st.dest_state.is_empty() {
                    log::warn!(
                        "state '{}': unresolved transition destination {}",
                        ss.name,
                        st.dest_state
                    );
                }
                for cond in &st.conds {
                    t.push_condition(cond.clone());
                }
                state.push_transition(t);
            }
        }

        sm.install_states(states);
        sm
    }
}
