//! Scene-object glue: owns a [`Controller`] and steps it from the host's
//! update or fixed-update pass depending on [`UpdateMode`].

use serde::{Deserialize, Serialize};

use crate::clip::ClipProvider;
use crate::controller::Controller;
use crate::figure::Figure;
use crate::outputs::Outputs;

/// Which host pass drives the animator.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Regular update with game-scaled time.
    #[default]
    Normal,
    /// Fixed (physics) update.
    AnimatePhysic,
    /// Regular update with wall-clock time.
    UnscaledTime,
}

#[derive(Debug, Default)]
pub struct AnimatorComponent {
    controller_path: String,
    update_mode: UpdateMode,
    controller: Option<Controller>,
}

impl AnimatorComponent {
    pub fn new(controller_path: &str) -> Self {
        Self {
            controller_path: controller_path.to_string(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn controller_path(&self) -> &str {
        &self.controller_path
    }

    /// Change the controller document. A live controller reloads from it.
    pub fn set_controller_path(&mut self, path: &str, clips: &mut dyn ClipProvider) {
        if self.controller_path == path {
            return;
        }
        self.controller_path = path.to_string();
        if let Some(controller) = self.controller.as_mut() {
            controller.set_path(path, clips);
        }
    }

    #[inline]
    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub fn set_update_mode(&mut self, mode: UpdateMode) {
        self.update_mode = mode;
    }

    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut Controller> {
        self.controller.as_mut()
    }

    /// Build the controller for `figure` from the controller path. Without a
    /// figure nothing is created. Returns whether a controller is now live.
    pub fn initialize(
        &mut self,
        figure: Option<Box<dyn Figure>>,
        clips: &mut dyn ClipProvider,
    ) -> bool {
        self.clear();
        let Some(figure) = figure else {
            log::debug!("animator component: no figure, controller not created");
            return false;
        };
        let mut controller = Controller::new();
        if !self.controller_path.is_empty() {
            controller.set_path(&self.controller_path, clips);
        }
        controller.set_figure(figure);
        self.controller = Some(controller);
        true
    }

    /// Unbind the figure and drop the controller; returns the figure.
    pub fn clear(&mut self) -> Option<Box<dyn Figure>> {
        self.controller.take().and_then(|mut c| c.take_figure())
    }

    /// Per-frame hook. `dt` is game-scaled, `unscaled_dt` wall-clock.
    pub fn on_update(&mut self, dt: f32, unscaled_dt: f32) -> Option<&Outputs> {
        let dt = match self.update_mode {
            UpdateMode::Normal => dt,
            UpdateMode::UnscaledTime => unscaled_dt,
            UpdateMode::AnimatePhysic => return None,
        };
        self.controller.as_mut().map(|c| c.update(dt))
    }

    /// Fixed-step hook.
    pub fn on_fixed_update(&mut self, dt: f32) -> Option<&Outputs> {
        if self.update_mode != UpdateMode::AnimatePhysic {
            return None;
        }
        self.controller.as_mut().map(|c| c.update(dt))
    }
}
