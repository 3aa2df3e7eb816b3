//! Transition guards.
//!
//! A condition compares one named parameter against a threshold. Conditions are
//! plain values owned by their transition; evaluation happens in the state machine.

use serde::{Deserialize, Serialize};

use crate::ids::ConditionId;
use crate::parameter::ParameterType;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ConditionMode {
    #[default]
    If = 0,
    IfNot = 1,
    Equal = 2,
    NotEqual = 3,
    Greater = 4,
    GreaterOrEqual = 5,
    Less = 6,
    LessOrEqual = 7,
}

impl ConditionMode {
    pub const ALL: [ConditionMode; 8] = [
        Self::If,
        Self::IfNot,
        Self::Equal,
        Self::NotEqual,
        Self::Greater,
        Self::GreaterOrEqual,
        Self::Less,
        Self::LessOrEqual,
    ];

    pub fn from_index(index: i32) -> Self {
        let i = index.clamp(0, 7) as usize;
        Self::ALL[i]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::If => "If",
            Self::IfNot => "IfNot",
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Greater => "Greater",
            Self::GreaterOrEqual => "GreaterOrEqual",
            Self::Less => "Less",
            Self::LessOrEqual => "LessOrEqual",
        }
    }

    /// Modes an editor should offer for a parameter of type `ty`.
    pub fn valid_modes(ty: ParameterType) -> &'static [ConditionMode] {
        match ty {
            ParameterType::Trigger => &Self::ALL[..1],
            ParameterType::Bool => &Self::ALL[..4],
            ParameterType::Float | ParameterType::Int => &Self::ALL,
        }
    }

    /// `If`/`IfNot` test truthiness; the rest compare `value OP threshold`.
    #[inline]
    pub fn evaluate(&self, value: f32, threshold: f32) -> bool {
        match self {
            Self::If => value != 0.0,
            Self::IfNot => value == 0.0,
            Self::Equal => value == threshold,
            Self::NotEqual => value != threshold,
            Self::Greater => value > threshold,
            Self::GreaterOrEqual => value >= threshold,
            Self::Less => value < threshold,
            Self::LessOrEqual => value <= threshold,
        }
    }
}

impl From<i32> for ConditionMode {
    fn from(index: i32) -> Self {
        Self::from_index(index)
    }
}

impl From<ConditionMode> for i32 {
    fn from(mode: ConditionMode) -> Self {
        mode as i32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    #[serde(skip)]
    pub id: ConditionId,
    pub mode: ConditionMode,
    pub parameter: String,
    pub threshold: f32,
}

impl Condition {
    pub fn new(id: ConditionId, parameter: &str, mode: ConditionMode, threshold: f32) -> Self {
        Self {
            id,
            mode,
            parameter: parameter.to_string(),
            threshold,
        }
    }

    /// Structural match used for deduplication (id is ignored).
    #[inline]
    pub fn matches(&self, parameter: &str, mode: ConditionMode, threshold: f32) -> bool {
        self.parameter == parameter && self.mode == mode && self.threshold == threshold
    }

    #[inline]
    pub fn evaluate(&self, value: f32) -> bool {
        self.mode.evaluate(value, self.threshold)
    }
}
