//! Calling convention of synthesized methods

use persona_core::Value;

/// Result of invoking a composite method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No value, e.g. a void setter
    Unit,
    /// Single-valued result, possibly absent
    Single(Option<Value>),
    /// Multi-valued result
    Multi(Vec<Value>),
    /// The composite itself, returned by fluent setters
    This,
}

impl Payload {
    /// Single present value
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Single(Some(value.into()))
    }

    /// Single value, if this is a present single value
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => value.as_ref(),
            _ => None,
        }
    }

    /// Values carried by this payload; empty for `Unit` and `This`
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Single(value) => value.into_iter().collect(),
            Self::Multi(values) => values,
            Self::Unit | Self::This => Vec::new(),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Single(Some(value))
    }
}

impl From<Option<Value>> for Payload {
    fn from(value: Option<Value>) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<Value>> for Payload {
    fn from(values: Vec<Value>) -> Self {
        Self::Multi(values)
    }
}
