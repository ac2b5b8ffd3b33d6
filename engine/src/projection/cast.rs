//! Cast application
//!
//! Primitive casts are best-effort in the same way the storage layer's
//! text-to-number coercion is: numeric casts take the longest numeric
//! prefix of a string and bottom out at zero. Only temporal casts can
//! fail, when the value is not a recognizable date at all.

use chrono::DateTime;
use serde_json::Value;

use crate::core::constants::{DATE_FORMAT, DATETIME_FORMAT};
use crate::error::EngineError;
use crate::filter::predicate::numeric_prefix;
use crate::filter::spec::timestamp_epoch;
use crate::projection::field::{CastDirective, PrimitiveCast};

/// Apply one cast directive to a resolved value.
pub fn apply(cast: &CastDirective, value: Value) -> Result<Value, EngineError> {
    match cast {
        // shape options are consumed by the container fields themselves
        CastDirective::None | CastDirective::Shape(_) => Ok(value),
        CastDirective::Primitive(primitive) => coerce(*primitive, value),
        CastDirective::Transform(transform) => Ok(transform(value)),
    }
}

fn coerce(cast: PrimitiveCast, value: Value) -> Result<Value, EngineError> {
    Ok(match cast {
        PrimitiveCast::Int => Value::from(as_int(&value)),
        PrimitiveCast::Float => Value::from(as_float(&value)),
        PrimitiveCast::Bool => Value::Bool(as_bool(&value)),
        PrimitiveCast::Text => Value::String(as_text(&value)),
        PrimitiveCast::Array => as_array(value),
        PrimitiveCast::Date => Value::String(format_temporal(&value, DATE_FORMAT)?),
        PrimitiveCast::DateTime => Value::String(format_temporal(&value, DATETIME_FORMAT)?),
    })
}

fn as_int(value: &Value) -> i64 {
    match value {
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().map_or(0, |f| f as i64),
        },
        Value::String(s) => numeric_prefix(s) as i64,
        _ => 0,
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => numeric_prefix(s),
        _ => 0.0,
    }
}

/// `true`/`false` strings are recognized case-insensitively; `"1"` counts
/// as true, every other string is false.
fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Arrays pass through, strings split on commas, any other scalar wraps.
fn as_array(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => value,
        Value::String(s) => Value::Array(
            s.split(',')
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        other => Value::Array(vec![other]),
    }
}

fn format_temporal(value: &Value, format: &str) -> Result<String, EngineError> {
    let epoch = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n.as_f64().map(|f| f as i64),
        },
        Value::String(s) => timestamp_epoch(s),
        _ => None,
    };
    let Some(epoch) = epoch else {
        return Err(EngineError::cast(format!("not a date or datetime: {value}")));
    };
    let Some(dt) = DateTime::from_timestamp(epoch, 0) else {
        return Err(EngineError::cast(format!("timestamp out of range: {epoch}")));
    };
    Ok(dt.format(format).to_string())
}
