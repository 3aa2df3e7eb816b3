//! Figure binding facade.
//!
//! A figure evaluates skeletal poses from up to two clips per layer and blends
//! them. The animator only binds clips into slots and sets the per-layer weight.

use std::cell::RefCell;
use std::rc::Rc;

use crate::clip::ClipHandle;
use crate::config::MAX_LAYERS;

/// Per-layer clip slot: `Primary` plays the active state, `Secondary` the blend target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AnimatorSlot {
    Primary,
    Secondary,
}

impl AnimatorSlot {
    /// Engine-wide slot index: slot 0 is the base pose, then two slots per layer.
    #[inline]
    pub fn raw_index(&self, layer: usize) -> usize {
        match self {
            Self::Primary => layer * 2 + 1,
            Self::Secondary => layer * 2 + 2,
        }
    }
}

pub trait Figure {
    fn bind_animator(&mut self, layer: usize, slot: AnimatorSlot, clip: Option<ClipHandle>);

    /// Blend weight of the secondary slot in `[0, 1]`.
    fn set_blending_weight(&mut self, layer: usize, weight: f32);
}

#[derive(Clone, Debug, Default)]
pub struct LayerSlots {
    pub primary: Option<ClipHandle>,
    pub secondary: Option<ClipHandle>,
    pub weight: f32,
}

/// In-memory figure that records what the animator bound. Hosts can read it
/// back each frame and forward to their renderer.
#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    layers: [LayerSlots; MAX_LAYERS],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, layer: usize) -> Option<&LayerSlots> {
        self.layers.get(layer)
    }

    pub fn primary(&self, layer: usize) -> Option<&ClipHandle> {
        self.layers.get(layer).and_then(|l| l.primary.as_ref())
    }

    pub fn secondary(&self, layer: usize) -> Option<&ClipHandle> {
        self.layers.get(layer).and_then(|l| l.secondary.as_ref())
    }

    pub fn weight(&self, layer: usize) -> f32 {
        self.layers.get(layer).map(|l| l.weight).unwrap_or(0.0)
    }
}

impl Figure for SlotTable {
    fn bind_animator(&mut self, layer: usize, slot: AnimatorSlot, clip: Option<ClipHandle>) {
        let Some(entry) = self.layers.get_mut(layer) else {
            log::warn!("bind_animator: layer {layer} out of range");
            return;
        };
        match slot {
            AnimatorSlot::Primary => entry.primary = clip,
            AnimatorSlot::Secondary => {
                if clip.is_none() {
                    entry.weight = 0.0;
                }
                entry.secondary = clip;
            }
        }
    }

    fn set_blending_weight(&mut self, layer: usize, weight: f32) {
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.weight = weight.clamp(0.0, 1.0);
        }
    }
}

/// Shared figure: the host keeps one handle to read poses while the
/// controller owns another.
impl<F: Figure> Figure for Rc<RefCell<F>> {
    fn bind_animator(&mut self, layer: usize, slot: AnimatorSlot, clip: Option<ClipHandle>) {
        self.borrow_mut().bind_animator(layer, slot, clip);
    }

    fn set_blending_weight(&mut self, layer: usize, weight: f32) {
        self.borrow_mut().set_blending_weight(layer, weight);
    }
}
