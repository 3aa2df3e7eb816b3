//! Identifiers and simple allocators for animator entities.

use serde::{Deserialize, Serialize};

/// Arena key of a state inside its owning state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StateId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TransitionId(pub u32);

/// Numeric condition id, unique within its transition.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ConditionId(pub u64);

/// Monotonic allocator for StateId and TransitionId.
/// Ids are never reused within one state machine, so removed states cannot alias new ones.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_state: u32,
    next_transition: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_state(&mut self) -> StateId {
        let id = StateId(self.next_state);
        self.next_state = self.next_state.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_transition(&mut self) -> TransitionId {
        let id = TransitionId(self.next_transition);
        self.next_transition = self.next_transition.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_state(), StateId(0));
        assert_eq!(alloc.alloc_state(), StateId(1));
        assert_eq!(alloc.alloc_transition(), TransitionId(0));
        assert_eq!(alloc.alloc_transition(), TransitionId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_state(), StateId(0));
    }
}
