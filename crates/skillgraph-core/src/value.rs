//! Values that travel along graph links.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value produced by a condition output port.
///
/// Each output port produces exactly one variant, fixed when the node type
/// is defined. Links are validated against [`ValueType`] when the graph is
/// built, so at evaluation time a mismatch only happens if a node breaks its
/// own port contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Bool(bool),
    Float(f64),
    Str(String),
}

/// Type tag of a [`TypedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Float,
    Str,
}

/// Zero-payload marker carried along execution-flow links.
///
/// Flow links only sequence event nodes; they never carry a [`TypedValue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionFlow;

impl TypedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::Bool(_) => ValueType::Bool,
            TypedValue::Float(_) => ValueType::Float,
            TypedValue::Str(_) => ValueType::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// The neutral value of a type: `false`, `0.0`, or the empty string.
    pub fn neutral(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => TypedValue::Bool(false),
            ValueType::Float => TypedValue::Float(0.0),
            ValueType::Str => TypedValue::Str(String::new()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::Float => write!(f, "float"),
            ValueType::Str => write!(f, "string"),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Bool(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Str(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Bool(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        TypedValue::Float(v)
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::Str(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::Str(v.to_string())
    }
}
