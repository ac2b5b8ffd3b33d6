//! Typed scalar operands
//!
//! Filter operands are decoded into typed scalars so dialects can pick the
//! right JSON cast and so bind parameters keep their database types.

use serde_json::Value;

use crate::error::EngineError;

/// A scalar operand from a filter document
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FilterValue {
    /// Decode a scalar operand. Arrays and objects are rejected; array
    /// operands are only legal under the operators that expect them and are
    /// unpacked before reaching this point.
    pub fn from_json(value: &Value) -> Result<Self, EngineError> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(EngineError::invalid_filter(format!(
                        "numeric operand out of range: {}",
                        n
                    )))
                }
            }
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(EngineError::invalid_filter(
                "expected a scalar operand, got an array or object",
            )),
        }
    }

    /// JSON extraction cast this operand's host type implies
    pub fn cast_kind(&self) -> CastKind {
        match self {
            Self::Int(_) | Self::Float(_) => CastKind::Numeric,
            Self::Bool(_) => CastKind::Boolean,
            Self::Null | Self::Str(_) => CastKind::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render back to a JSON value, for operators that compare against
    /// serialized JSON.
    pub fn as_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Str(s) => Value::String(s.clone()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Cast applied to a JSON extraction before comparison, derived from the
/// operand's host type (numbers compare numerically, booleans as booleans,
/// everything else as text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Numeric,
    Boolean,
    Text,
}
