//! Controller: parameter table, up to four layers and the bound figure.
//!
//! Methods:
//! - new/with_config, set_path (reload from `.anim`), save
//! - add_layer/remove_layer, parameter get/set, update (layers in order → figure)

use std::fmt;
use std::path::{Path, PathBuf};

use crate::clip::ClipProvider;
use crate::config::Config;
use crate::error::AnimatorError;
use crate::figure::{AnimatorSlot, Figure};
use crate::ids::StateId;
use crate::outputs::{FigureCommand, Outputs};
use crate::parameter::{Parameter, ParameterTable, ParameterType, ParameterValue};
use crate::path;
use crate::state_machine::StateMachine;
use crate::stored::StoredController;

pub struct Controller {
    config: Config,
    path: String,
    model: String,
    time_scale: f32,
    params: ParameterTable,
    layers: Vec<StateMachine>,
    figure: Option<Box<dyn Figure>>,
    outputs: Outputs,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("path", &self.path)
            .field("model", &self.model)
            .field("time_scale", &self.time_scale)
            .field("params", &self.params)
            .field("layers", &self.layers.len())
            .field("has_figure", &self.figure.is_some())
            .finish()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Controller with the default config and one empty layer.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut controller = Self {
            config,
            path: String::new(),
            model: String::new(),
            time_scale: 1.0,
            params: ParameterTable::new(),
            layers: Vec::new(),
            figure: None,
            outputs: Outputs::default(),
        };
        controller.add_layer();
        controller
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drop all layers and parameters, leaving one empty layer. The bound
    /// figure is kept with every slot of the dropped layers emptied.
    pub fn clear(&mut self) {
        self.reset();
        self.add_layer();
    }

    /// Empty the figure slots of every layer, then drop layers and parameters.
    fn reset(&mut self) {
        if let Some(figure) = self.figure.as_deref_mut() {
            for layer in &self.layers {
                for cmd in layer.unbind_commands() {
                    cmd.apply(figure);
                }
            }
        }
        self.layers.clear();
        self.params.clear();
        self.model.clear();
        self.time_scale = 1.0;
        self.outputs.clear();
    }

    // ----- paths & persistence -----

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Point the controller at a `.anim` document and reload from it.
    ///
    /// Returns `true` when the document was loaded. Any failure leaves the
    /// controller cleared with one default layer.
    pub fn set_path(&mut self, path: &str, clips: &mut dyn ClipProvider) -> bool {
        match self.try_set_path(path, clips) {
            Ok(loaded) => loaded,
            Err(err) => {
                log::warn!("animator controller: {err}");
                false
            }
        }
    }

    /// `Ok(false)` when `path` normalizes to the current path (nothing reloaded).
    pub fn try_set_path(
        &mut self,
        path: &str,
        clips: &mut dyn ClipProvider,
    ) -> Result<bool, AnimatorError> {
        let normalized = path::normalize(path);
        if normalized == self.path {
            return Ok(false);
        }
        self.path = normalized;
        self.clear();
        if self.path.is_empty() {
            return Ok(false);
        }
        let result = if path::has_extension(&self.path, &self.config.file_extension) {
            let file = self.path.clone();
            self.load_file(&file, clips)
        } else {
            Err(AnimatorError::InvalidExtension {
                path: PathBuf::from(&self.path),
                expected: self.config.file_extension.clone(),
            })
        };
        if let Err(err) = result {
            self.clear();
            return Err(err);
        }
        Ok(true)
    }

    /// Replace layers, parameters, model and time scale from a document on disk.
    /// Does not change [`Controller::path`].
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        clips: &mut dyn ClipProvider,
    ) -> Result<(), AnimatorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AnimatorError::io(path, e))?;
        let stored: StoredController =
            serde_json::from_str(&text).map_err(|e| AnimatorError::parse(path, e))?;
        self.restore(&stored, clips);
        Ok(())
    }

    /// Save to `path` with its extension forced to `.anim`, creating parent
    /// directories as needed. Returns `false` on any failure.
    pub fn save(&mut self, path: &str) -> bool {
        match self.try_save(path) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("animator controller: save failed: {err}");
                false
            }
        }
    }

    /// On success the controller's path becomes the saved document.
    pub fn try_save(&mut self, path: &str) -> Result<PathBuf, AnimatorError> {
        if path.is_empty() {
            return Err(AnimatorError::EmptyPath);
        }
        let fs_path = Path::new(path).with_extension(&self.config.file_extension);
        let json = if self.config.pretty {
            serde_json::to_string_pretty(&self.to_stored())?
        } else {
            serde_json::to_string(&self.to_stored())?
        };
        if self.config.create_parent_dirs {
            if let Some(parent) = fs_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| AnimatorError::io(parent, e))?;
            }
        }
        std::fs::write(&fs_path, json).map_err(|e| AnimatorError::io(&fs_path, e))?;
        self.path = path::normalize(&fs_path.to_string_lossy());
        log::debug!("animator controller saved to {}", fs_path.display());
        Ok(fs_path)
    }

    pub fn to_stored(&self) -> StoredController {
        StoredController {
            model: self.model.clone(),
            time_scale: self.time_scale,
            params: self
                .params
                .iter()
                .map(|(name, p)| (name.to_string(), *p))
                .collect(),
            layers: Some(self.layers.iter().map(StateMachine::to_stored).collect()),
        }
    }

    /// Replace everything but the path and figure with `stored`. A document
    /// without layers gets one default layer. A bound figure is rebound to the
    /// new layers.
    pub fn restore(&mut self, stored: &StoredController, clips: &mut dyn ClipProvider) {
        self.reset();
        self.set_model(&stored.model);
        self.time_scale = stored.time_scale;
        for (name, p) in &stored.params {
            self.params.set(name, p.ty, p.value);
        }
        match &stored.layers {
            None => {
                self.add_layer();
            }
            Some(layers) if layers.is_empty() => {
                log::debug!("animator controller: document has no layers, adding one");
                self.add_layer();
            }
            Some(layers) => {
                let limit = self.config.layer_limit();
                if layers.len() > limit {
                    log::warn!(
                        "animator controller: {} layers stored, keeping the first {limit}",
                        layers.len()
                    );
                }
                for (index, layer) in layers.iter().take(limit).enumerate() {
                    self.layers.push(StateMachine::from_stored(layer, index, clips));
                }
            }
        }
        self.rebind_figure();
    }

    pub fn to_json(&self) -> Result<String, AnimatorError> {
        Ok(serde_json::to_string(&self.to_stored())?)
    }

    pub fn from_json(json: &str, clips: &mut dyn ClipProvider) -> Result<Self, AnimatorError> {
        let stored: StoredController = serde_json::from_str(json)?;
        let mut controller = Self::new();
        controller.restore(&stored, clips);
        Ok(controller)
    }

    // ----- model, time scale, figure -----

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base model asset; the extension is forced to the configured model extension.
    pub fn set_model(&mut self, model: &str) {
        self.model = path::normalize_with_extension(model, &self.config.model_extension);
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
    }

    #[inline]
    pub fn has_figure(&self) -> bool {
        self.figure.is_some()
    }

    /// Bind a figure and push every layer's clips and blend weight into it.
    pub fn set_figure(&mut self, figure: Box<dyn Figure>) {
        self.figure = Some(figure);
        self.rebind_figure();
    }

    fn rebind_figure(&mut self) {
        let Some(figure) = self.figure.as_deref_mut() else {
            return;
        };
        for layer in &self.layers {
            let clip_of = |id: Option<StateId>| {
                id.and_then(|id| layer.state(id))
                    .and_then(|s| s.clip().cloned())
            };
            let (secondary, weight) = if layer.is_blending() && layer.transition_duration() > 0.0 {
                (
                    clip_of(layer.next_state()),
                    layer.transition_time() / layer.transition_duration(),
                )
            } else {
                (None, 0.0)
            };
            figure.bind_animator(layer.layer(), AnimatorSlot::Primary, clip_of(layer.current_state()));
            figure.bind_animator(layer.layer(), AnimatorSlot::Secondary, secondary);
            figure.set_blending_weight(layer.layer(), weight);
        }
    }

    pub fn take_figure(&mut self) -> Option<Box<dyn Figure>> {
        self.figure.take()
    }

    // ----- layers -----

    #[inline]
    pub fn layers(&self) -> &[StateMachine] {
        &self.layers
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer at position `index` (not by layer number).
    pub fn layer(&self, index: usize) -> Option<&StateMachine> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut StateMachine> {
        self.layers.get_mut(index)
    }

    /// Append a layer. Fails once the layer limit is reached.
    pub fn add_layer(&mut self) -> bool {
        match self.try_add_layer() {
            Ok(_) => true,
            Err(err) => {
                log::warn!("animator controller: {err}");
                false
            }
        }
    }

    /// Append a layer bound to the lowest free figure layer; returns its position.
    pub fn try_add_layer(&mut self) -> Result<usize, AnimatorError> {
        let max = self.config.layer_limit();
        if self.layers.len() >= max {
            return Err(AnimatorError::LayerLimit { max });
        }
        let number = (0..max)
            .find(|n| self.layers.iter().all(|l| l.layer() != *n))
            .ok_or(AnimatorError::LayerLimit { max })?;
        self.layers.push(StateMachine::new(number));
        Ok(self.layers.len() - 1)
    }

    /// Remove the layer at `index` and empty its figure slots. The last
    /// remaining layer cannot be removed.
    pub fn remove_layer(&mut self, index: usize) -> bool {
        if index >= self.layers.len() || self.layers.len() == 1 {
            return false;
        }
        let removed = self.layers.remove(index);
        let mut out = Outputs::default();
        for cmd in removed.unbind_commands() {
            out.push_command(cmd);
        }
        self.emit(out);
        true
    }

    /// Remove a state from the layer at `index`, rebinding the figure when the
    /// layer falls back to Enter.
    pub fn remove_state(&mut self, index: usize, id: StateId) -> bool {
        let Some(layer) = self.layers.get_mut(index) else {
            return false;
        };
        let mut out = Outputs::default();
        if !layer.remove_state(id, &mut out) {
            return false;
        }
        self.emit(out);
        true
    }

    // ----- parameters -----

    #[inline]
    pub fn parameters(&self) -> &ParameterTable {
        &self.params
    }

    #[inline]
    pub fn parameters_mut(&mut self) -> &mut ParameterTable {
        &mut self.params
    }

    pub fn set_parameter(&mut self, name: &str, ty: ParameterType, value: f32) {
        self.params.set(name, ty, value);
    }

    /// Raw form used by scripting glue; `ty` is clamped into the valid range.
    pub fn set_parameter_raw(&mut self, name: &str, ty: i32, value: f32) {
        self.params.set_raw(name, ty, value);
    }

    /// `(Float, 0)` for unknown names.
    pub fn parameter(&self, name: &str) -> Parameter {
        self.params.get(name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.params.has(name)
    }

    pub fn remove_parameter(&mut self, name: &str) -> bool {
        self.params.remove(name)
    }

    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn value(&self, name: &str) -> Option<ParameterValue> {
        self.params.value(name)
    }

    pub fn set_value(&mut self, name: &str, value: ParameterValue) {
        self.params.set_value(name, value);
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.params.set_trigger(name);
    }

    pub fn reset_trigger(&mut self, name: &str) {
        self.params.reset_trigger(name);
    }

    // ----- scripting helpers (layer 0) -----

    pub fn has_state(&self, name: &str) -> bool {
        self.layers
            .first()
            .map(|l| l.has_state_name(name))
            .unwrap_or(false)
    }

    /// Jump layer 0 straight to the state named `name`, without blending.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(layer) = self.layers.first_mut() else {
            return false;
        };
        let Some(id) = layer.find_state_by_name(name) else {
            log::warn!("animator controller: no state '{name}' on the base layer");
            return false;
        };
        let mut out = Outputs::default();
        if !layer.set_current_state(Some(id), &mut out) {
            return false;
        }
        self.emit(out);
        true
    }

    /// Apply out-of-tick commands to the figure and keep them as pending outputs.
    fn emit(&mut self, out: Outputs) {
        if let Some(figure) = self.figure.as_deref_mut() {
            out.apply_to(figure);
        }
        self.outputs.commands.extend(out.commands);
        self.outputs.events.extend(out.events);
    }

    // ----- stepping -----

    /// Step every layer by `dt * time_scale` and apply the resulting figure
    /// commands. Does nothing while no figure is bound.
    pub fn update(&mut self, dt: f32) -> &Outputs {
        self.outputs.clear();
        let Some(figure) = self.figure.as_deref_mut() else {
            return &self.outputs;
        };
        let scaled = dt * self.time_scale;
        for layer in &mut self.layers {
            layer.update(scaled, &mut self.params, &mut self.outputs);
        }
        self.outputs.apply_to(figure);
        &self.outputs
    }

    /// Outputs of the last [`Controller::update`].
    #[inline]
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Figure commands recorded since the last update (e.g. by [`Controller::play`]).
    pub fn pending_commands(&self) -> &[FigureCommand] {
        &self.outputs.commands
    }
}
