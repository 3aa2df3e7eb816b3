//! Output contracts from the animator.
//!
//! State machines record figure commands and lifecycle events for the tick.
//! The controller applies commands to its bound figure; hosts read events to
//! drive gameplay hooks (state enter/exit listeners).

use crate::clip::ClipHandle;
use crate::figure::{AnimatorSlot, Figure};
use crate::ids::StateId;

/// One write into the figure binding facade.
#[derive(Clone, Debug)]
pub enum FigureCommand {
    BindAnimator {
        layer: usize,
        slot: AnimatorSlot,
        clip: Option<ClipHandle>,
    },
    SetBlendingWeight {
        layer: usize,
        weight: f32,
    },
}

impl FigureCommand {
    pub fn apply(&self, figure: &mut dyn Figure) {
        match self {
            Self::BindAnimator { layer, slot, clip } => {
                figure.bind_animator(*layer, *slot, clip.clone())
            }
            Self::SetBlendingWeight { layer, weight } => {
                figure.set_blending_weight(*layer, *weight)
            }
        }
    }
}

/// Discrete lifecycle signals emitted during stepping.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum StateEvent {
    Exited {
        layer: usize,
        state: StateId,
        name: String,
    },
    Entered {
        layer: usize,
        state: StateId,
        name: String,
    },
    /// A crossfade towards `to` began and will last `duration` seconds.
    TransitionStarted {
        layer: usize,
        from: StateId,
        to: StateId,
        duration: f32,
    },
    /// The layer reached its Exit state and stopped evaluating.
    LayerIdle {
        layer: usize,
    },
}

/// Outputs produced by one controller or state machine tick.
#[derive(Clone, Debug, Default)]
pub struct Outputs {
    pub commands: Vec<FigureCommand>,
    pub events: Vec<StateEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_command(&mut self, command: FigureCommand) {
        self.commands.push(command);
    }

    #[inline]
    pub fn push_event(&mut self, event: StateEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }

    /// Forward all recorded commands, in order, to `figure`.
    pub fn apply_to(&self, figure: &mut dyn Figure) {
        for cmd in &self.commands {
            cmd.apply(figure);
        }
    }

    /// Last blend weight written for `layer` this tick.
    pub fn blend_weight(&self, layer: usize) -> Option<f32> {
        self.commands.iter().rev().find_map(|c| match c {
            FigureCommand::SetBlendingWeight { layer: l, weight } if *l == layer => Some(*weight),
            _ => None,
        })
    }
}
