//! Typed animator parameters.
//!
//! Values are stored as `f32` regardless of type; Bool and Trigger use 0/non-zero.
//! Trigger parameters are consumed (reset to 0) by the state machine when a
//! condition reading them passes.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ParameterType {
    Bool = 0,
    #[default]
    Float = 1,
    Int = 2,
    Trigger = 3,
}

impl ParameterType {
    /// Convert a raw integer, clamping out-of-range values into the valid range.
    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, 3) {
            0 => Self::Bool,
            1 => Self::Float,
            2 => Self::Int,
            _ => Self::Trigger,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Float => "Float",
            Self::Int => "Int",
            Self::Trigger => "Trigger",
        }
    }
}

impl From<i32> for ParameterType {
    fn from(index: i32) -> Self {
        Self::from_index(index)
    }
}

impl From<ParameterType> for i32 {
    fn from(ty: ParameterType) -> Self {
        ty as i32
    }
}

/// One parameter entry: serialized as `[type, value]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "(ParameterType, f32)", into = "(ParameterType, f32)")]
pub struct Parameter {
    pub ty: ParameterType,
    pub value: f32,
}

impl Parameter {
    pub fn new(ty: ParameterType, value: f32) -> Self {
        Self { ty, value }
    }

    /// Typed view of the raw value.
    pub fn typed(&self) -> ParameterValue {
        match self.ty {
            ParameterType::Bool | ParameterType::Trigger => ParameterValue::Bool(self.value != 0.0),
            ParameterType::Float => ParameterValue::Float(self.value),
            ParameterType::Int => ParameterValue::Int(self.value as i32),
        }
    }
}

impl From<(ParameterType, f32)> for Parameter {
    fn from((ty, value): (ParameterType, f32)) -> Self {
        Self { ty, value }
    }
}

impl From<Parameter> for (ParameterType, f32) {
    fn from(p: Parameter) -> Self {
        (p.ty, p.value)
    }
}

/// Typed parameter value as read and written by gameplay scripts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Float(f32),
    Int(i32),
}

impl ParameterValue {
    pub fn ty(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Float(_) => ParameterType::Float,
            Self::Int(_) => ParameterType::Int,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Self::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Float(f) => f,
            Self::Int(i) => i as f32,
        }
    }
}

/// Named parameter table shared by all layers of a controller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterTable {
    entries: HashMap<String, Parameter>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name` with the given type and raw value.
    pub fn set(&mut self, name: &str, ty: ParameterType, value: f32) {
        match self.entries.get_mut(name) {
            Some(entry) => *entry = Parameter::new(ty, value),
            None => {
                self.entries.insert(name.to_string(), Parameter::new(ty, value));
            }
        }
    }

    /// Raw-index variant used by untyped callers; the type index is clamped.
    #[inline]
    pub fn set_raw(&mut self, name: &str, ty: i32, value: f32) {
        self.set(name, ParameterType::from_index(ty), value);
    }

    /// Returns `(Float, 0)` for unknown names.
    pub fn get(&self, name: &str) -> Parameter {
        self.entries.get(name).copied().unwrap_or_default()
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<Parameter> {
        self.entries.get(name).copied()
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove `name`, returning whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn set_value(&mut self, name: &str, value: ParameterValue) {
        self.set(name, value.ty(), value.as_f32());
    }

    pub fn value(&self, name: &str) -> Option<ParameterValue> {
        self.entries.get(name).map(Parameter::typed)
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.set(name, ParameterType::Trigger, 1.0);
    }

    pub fn reset_trigger(&mut self, name: &str) {
        self.set(name, ParameterType::Trigger, 0.0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Parameter)> for ParameterTable {
    fn from_iter<I: IntoIterator<Item = (String, Parameter)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
