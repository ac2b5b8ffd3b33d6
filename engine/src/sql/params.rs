//! Bind parameter accumulation
//!
//! Dialect fragments reference parameters positionally; `SqlParams` collects
//! the values in the same order so stores can bind them one by one without
//! re-parsing the SQL.

use crate::filter::value::FilterValue;

/// One bind parameter, typed so each backend binds it natively instead of
/// funnelling everything through text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&FilterValue> for SqlValue {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Null => Self::Null,
            FilterValue::Bool(b) => Self::Bool(*b),
            FilterValue::Int(i) => Self::Int(*i),
            FilterValue::Float(f) => Self::Float(*f),
            FilterValue::Str(s) => Self::Text(s.clone()),
        }
    }
}

/// Ordered bind parameters for one statement
#[derive(Debug, Clone, Default)]
pub struct SqlParams {
    pub values: Vec<SqlValue>,
}

impl SqlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a value and return its 1-based position.
    pub fn push(&mut self, value: SqlValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
