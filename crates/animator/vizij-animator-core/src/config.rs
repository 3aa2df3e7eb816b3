//! Core configuration for vizij-animator-core.

use serde::{Deserialize, Serialize};

/// Number of animator layers a figure can blend (two slots per layer).
pub const MAX_LAYERS: usize = 4;

/// Configuration for controller persistence and layer limits.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum layers per controller. Values above [`MAX_LAYERS`] are clamped.
    pub max_layers: usize,
    /// Extension (without dot) of controller and layer documents.
    pub file_extension: String,
    /// Extension (without dot) forced onto the base model path.
    pub model_extension: String,
    /// Create missing parent directories when saving a controller.
    pub create_parent_dirs: bool,
    /// Pretty-print saved JSON.
    pub pretty: bool,
}

impl Config {
    /// Effective layer limit after clamping to the figure slot budget.
    #[inline]
    pub fn layer_limit(&self) -> usize {
        self.max_layers.clamp(1, MAX_LAYERS)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_layers: MAX_LAYERS,
            file_extension: "anim".to_string(),
            model_extension: "pyxf".to_string(),
            create_parent_dirs: true,
            pretty: true,
        }
    }
}
