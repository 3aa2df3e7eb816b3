//! Vizij Animator Core (engine-agnostic)
//!
//! Layered animator state machines: a [`Controller`] owns up to four
//! [`StateMachine`] layers and a typed parameter table. Each layer evaluates
//! guarded transitions between [`State`]s once per frame and drives an external
//! [`Figure`] binding to crossfade between motion clips.
//!
//! Clip playback and pose evaluation stay with the host: the core only reads
//! clip time through [`MotionClip`] and writes slot bindings and blend weights
//! through [`Figure`]. Controllers persist to `.anim` JSON documents
//! (see [`stored`]).

pub mod clip;
pub mod component;
pub mod condition;
pub mod config;
pub mod controller;
pub mod error;
pub mod figure;
pub mod ids;
pub mod outputs;
pub mod parameter;
pub mod path;
pub mod state;
pub mod state_machine;
pub mod stored;
pub mod transition;

// Re-exports for consumers (hosts and scripting glue)
pub use clip::{ClipCache, ClipHandle, ClipProvider, ClipTimeline, MotionClip};
pub use component::{AnimatorComponent, UpdateMode};
pub use condition::{Condition, ConditionMode};
pub use config::{Config, MAX_LAYERS};
pub use controller::Controller;
pub use error::AnimatorError;
pub use figure::{AnimatorSlot, Figure, SlotTable};
pub use ids::{ConditionId, IdAllocator, StateId, TransitionId};
pub use outputs::{FigureCommand, Outputs, StateEvent};
pub use parameter::{Parameter, ParameterTable, ParameterType, ParameterValue};
pub use state::{State, StateType};
pub use state_machine::StateMachine;
pub use stored::{StoredController, StoredLayer};
pub use transition::Transition;
