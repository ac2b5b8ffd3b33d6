//! Field selection decoding
//!
//! A selection is an ordered list of `"path"` strings or `["path", cast]`
//! pairs. Casts come in three forms: a primitive token, an options map
//! (meaningful on `meta` and image paths), or a programmatic transform
//! closure that never appears on the wire.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::EngineError;

pub type TransformFn = dyn Fn(Value) -> Value + Send + Sync;

/// Primitive cast tokens, with the spellings clients actually send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveCast {
    Int,
    Float,
    Bool,
    Text,
    Array,
    Date,
    DateTime,
}

impl PrimitiveCast {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "int" | "integer" => Some(Self::Int),
            "float" | "double" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "string" => Some(Self::Text),
            "array" => Some(Self::Array),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
pub enum CastDirective {
    #[default]
    None,
    Primitive(PrimitiveCast),
    /// Options map; interpreted per field (image render options, meta
    /// sub-selection), inert on ordinary columns.
    Shape(Map<String, Value>),
    Transform(Arc<TransformFn>),
}

impl fmt::Debug for CastDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Primitive(cast) => f.debug_tuple("Primitive").field(cast).finish(),
            Self::Shape(map) => f.debug_tuple("Shape").field(map).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSelection {
    pub path: String,
    pub cast: CastDirective,
}

/// An ordered field selection, empty until populated.
#[derive(Debug, Clone, Default)]
pub struct FieldSelectionSpec {
    pub fields: Vec<FieldSelection>,
}

const SUMMARY_FIELDS: &[&str] = &[
    "id",
    "type",
    "title",
    "slug",
    "excerpt",
    "published_at",
    "tags",
    "images",
];

const DETAIL_FIELDS: &[&str] = &[
    "id",
    "type",
    "title",
    "slug",
    "content",
    "excerpt",
    "published_at",
    "meta",
    "tags",
    "images",
];

impl FieldSelectionSpec {
    /// Listing default: everything but the heavy body fields.
    pub fn summary() -> Self {
        Self::bare(SUMMARY_FIELDS)
    }

    /// Single-entry default: the summary set plus content and meta.
    pub fn detail() -> Self {
        Self::bare(DETAIL_FIELDS)
    }

    pub fn bare(paths: &[&str]) -> Self {
        Self {
            fields: paths
                .iter()
                .map(|path| FieldSelection {
                    path: (*path).to_string(),
                    cast: CastDirective::None,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn with_field(mut self, path: impl Into<String>) -> Self {
        self.fields.push(FieldSelection {
            path: path.into(),
            cast: CastDirective::None,
        });
        self
    }

    pub fn with_cast(mut self, path: impl Into<String>, cast: PrimitiveCast) -> Self {
        self.fields.push(FieldSelection {
            path: path.into(),
            cast: CastDirective::Primitive(cast),
        });
        self
    }

    pub fn with_transform(
        mut self,
        path: impl Into<String>,
        transform: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.fields.push(FieldSelection {
            path: path.into(),
            cast: CastDirective::Transform(Arc::new(transform)),
        });
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            EngineError::invalid_filter(format!("malformed field selection JSON: {e}"))
        })?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let Value::Array(items) = value else {
            return Err(EngineError::invalid_filter(
                "field selection must be a JSON array",
            ));
        };
        let fields = items
            .iter()
            .map(Self::element)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    fn element(item: &Value) -> Result<FieldSelection, EngineError> {
        match item {
            Value::String(path) => Ok(FieldSelection {
                path: valid_path(path)?,
                cast: CastDirective::None,
            }),
            Value::Array(pair) => {
                let [path, directive] = pair.as_slice() else {
                    return Err(EngineError::invalid_filter(
                        "field selections must be a string or [path, cast] pair",
                    ));
                };
                let Value::String(path) = path else {
                    return Err(EngineError::invalid_filter(
                        "selection paths must be strings",
                    ));
                };
                Ok(FieldSelection {
                    path: valid_path(path)?,
                    cast: Self::directive(path, directive)?,
                })
            }
            _ => Err(EngineError::invalid_filter(
                "field selections must be a string or [path, cast] pair",
            )),
        }
    }

    pub(crate) fn directive(path: &str, value: &Value) -> Result<CastDirective, EngineError> {
        match value {
            Value::Null => Ok(CastDirective::None),
            Value::String(token) => PrimitiveCast::parse(token)
                .map(CastDirective::Primitive)
                .ok_or_else(|| {
                    EngineError::invalid_cast(format!("unrecognized cast directive: {token}"))
                }),
            Value::Object(map) => Ok(CastDirective::Shape(map.clone())),
            _ => Err(EngineError::invalid_filter(format!(
                "invalid cast directive for {path}"
            ))),
        }
    }
}

fn valid_path(path: &str) -> Result<String, EngineError> {
    if path.is_empty() || path.split('.').any(|segment| segment.is_empty()) {
        return Err(EngineError::invalid_filter(format!(
            "malformed selection path: {path:?}"
        )));
    }
    Ok(path.to_string())
}
