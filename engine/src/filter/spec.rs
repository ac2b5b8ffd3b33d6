//! Wire filter decoding
//!
//! A raw filter document becomes an explicit predicate tree in one pass:
//! `$search` and `$order` come off the top level, `$and`/`$or` groups
//! recurse, field keys dispatch on operator maps. Anything malformed fails
//! here, before any SQL exists; a bad filter never degrades to "no filter".

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::core::config::FilterLimits;
use crate::core::constants::{DATE_FORMAT, DATETIME_FORMAT};
use crate::error::EngineError;
use crate::filter::columns::{self, ColumnKind};
use crate::filter::op::{self, CompareOp, FilterOp};
use crate::filter::predicate::{Compare, FieldPredicate, FieldTarget, Predicate, TagFilter};
use crate::filter::value::FilterValue;
use crate::query::builder::{OrderBy, OrderDirection};

/// A decoded filter document: the side-channel directives plus the
/// predicate tree for everything else.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub search: Option<String>,
    pub order: Vec<OrderBy>,
    pub root: Option<Predicate>,
}

impl FilterSpec {
    /// Decode a raw JSON document, enforcing the size limit before parsing.
    pub fn from_json(raw: &str, limits: &FilterLimits) -> Result<Self, EngineError> {
        if raw.len() > limits.max_json_bytes {
            return Err(EngineError::invalid_filter(format!(
                "filter document exceeds {} bytes",
                limits.max_json_bytes
            )));
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| EngineError::invalid_filter(format!("malformed filter JSON: {e}")))?;
        Self::from_value(&value, limits)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: &Value, limits: &FilterLimits) -> Result<Self, EngineError> {
        let Value::Object(map) = value else {
            return Err(EngineError::invalid_filter("filter must be a JSON object"));
        };
        let mut decoder = Decoder {
            limits,
            conditions: 0,
        };
        let mut spec = FilterSpec::default();
        let mut conjuncts = Vec::new();
        for (key, value) in map {
            match key.as_str() {
                "$search" => spec.search = Some(Decoder::search(value)?),
                "$order" => spec.order = Decoder::order(value)?,
                _ => conjuncts.push(decoder.pair(key, value, 0)?),
            }
        }
        spec.root = match conjuncts.len() {
            0 => None,
            1 => conjuncts.pop(),
            _ => Some(Predicate::All(conjuncts)),
        };
        Ok(spec)
    }
}

// =============================================================================
// Decoder
// =============================================================================

struct Decoder<'a> {
    limits: &'a FilterLimits,
    conditions: usize,
}

impl Decoder<'_> {
    fn search(value: &Value) -> Result<String, EngineError> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
            _ => Err(EngineError::invalid_filter(
                "$search expects a non-empty string",
            )),
        }
    }

    fn order(value: &Value) -> Result<Vec<OrderBy>, EngineError> {
        let Value::Object(map) = value else {
            return Err(EngineError::invalid_filter(
                "$order expects an object of column: direction pairs",
            ));
        };
        if map.is_empty() {
            return Err(EngineError::invalid_filter("$order must not be empty"));
        }
        map.iter()
            .map(|(column, dir)| {
                let Value::String(dir) = dir else {
                    return Err(EngineError::invalid_filter(format!(
                        "invalid order direction for {column}: expected \"asc\" or \"desc\""
                    )));
                };
                let direction = OrderDirection::parse(dir).ok_or_else(|| {
                    EngineError::invalid_filter(format!("invalid order direction: {dir}"))
                })?;
                OrderBy::new(column, direction)
            })
            .collect()
    }

    fn pair(&mut self, key: &str, value: &Value, depth: usize) -> Result<Predicate, EngineError> {
        if depth > self.limits.max_depth {
            return Err(EngineError::invalid_filter(format!(
                "filter nesting exceeds {} levels",
                self.limits.max_depth
            )));
        }
        match key {
            "$and" => Ok(Predicate::All(self.branches(key, value, depth)?)),
            "$or" => Ok(Predicate::Any(self.branches(key, value, depth)?)),
            "$tags" => self.tags(value),
            "$search" | "$order" => Err(EngineError::invalid_filter(format!(
                "{key} is only allowed at the top level"
            ))),
            _ if key.starts_with('$') => Err(EngineError::invalid_filter(format!(
                "unknown operator: {key}"
            ))),
            _ => self.field(key, value),
        }
    }

    /// `$and` / `$or` operands: a non-empty array of non-empty objects, each
    /// folded as a conjunction.
    fn branches(
        &mut self,
        token: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Vec<Predicate>, EngineError> {
        let Value::Array(items) = value else {
            return Err(EngineError::invalid_filter(format!(
                "{token} expects an array of filter objects"
            )));
        };
        if items.is_empty() {
            return Err(EngineError::invalid_filter(format!(
                "{token} must not be empty"
            )));
        }
        items
            .iter()
            .map(|item| self.group(item, depth + 1))
            .collect()
    }

    fn group(&mut self, value: &Value, depth: usize) -> Result<Predicate, EngineError> {
        let Value::Object(map) = value else {
            return Err(EngineError::invalid_filter("filter groups must be objects"));
        };
        if map.is_empty() {
            return Err(EngineError::invalid_filter("empty filter group"));
        }
        let mut conjuncts = Vec::with_capacity(map.len());
        for (key, value) in map {
            conjuncts.push(self.pair(key, value, depth)?);
        }
        Ok(match conjuncts.len() {
            1 => conjuncts.remove(0),
            _ => Predicate::All(conjuncts),
        })
    }

    fn tags(&mut self, value: &Value) -> Result<Predicate, EngineError> {
        self.count_condition()?;
        let filter = match value {
            Value::Array(items) => TagFilter::Names(string_list(items, "$tags")?),
            Value::Object(map) => {
                if map.keys().any(|k| k != "type" && k != "values") {
                    return Err(EngineError::invalid_filter(
                        "$tags objects only carry type and values",
                    ));
                }
                let kind = match map.get("type") {
                    Some(Value::String(kind)) if !kind.is_empty() => kind.clone(),
                    _ => {
                        return Err(EngineError::invalid_filter(
                            "$tags objects need a string type",
                        ));
                    }
                };
                let values = match map.get("values") {
                    Some(Value::Array(items)) => string_list(items, "$tags")?,
                    _ => {
                        return Err(EngineError::invalid_filter(
                            "$tags objects need a values array",
                        ));
                    }
                };
                TagFilter::Typed { kind, values }
            }
            _ => {
                return Err(EngineError::invalid_filter(
                    "unsupported $tags shape: expected an array of names or {type, values}",
                ));
            }
        };
        Ok(Predicate::AnyTag(filter))
    }

    fn field(&mut self, key: &str, value: &Value) -> Result<Predicate, EngineError> {
        let target = self.target(key)?;
        match value {
            Value::Object(map) => self.operator_map(&target, key, map),
            _ => {
                self.count_condition()?;
                let cmp = self.equality(&target, key, value)?;
                Ok(Predicate::Field(FieldPredicate { target, cmp }))
            }
        }
    }

    /// Resolve a filter key to a direct column or a path into a JSON
    /// document column. Unknown names fail instead of passing through to
    /// the backend.
    fn target(&self, key: &str) -> Result<FieldTarget, EngineError> {
        if let Some((head, rest)) = key.split_once('.') {
            if !columns::is_json_column(head) {
                return Err(EngineError::invalid_filter(format!(
                    "cannot filter on path: {key}"
                )));
            }
            if rest.is_empty() || rest.split('.').any(|segment| segment.is_empty()) {
                return Err(EngineError::invalid_filter(format!(
                    "malformed path: {key}"
                )));
            }
            return Ok(FieldTarget::Json {
                column: head.to_string(),
                path: rest.split('.').map(str::to_string).collect(),
            });
        }
        if columns::is_json_column(key) {
            return Err(EngineError::invalid_filter(format!(
                "cannot filter on a document column directly: {key}"
            )));
        }
        if !columns::is_filterable(key) {
            return Err(EngineError::invalid_filter(format!(
                "cannot filter on column: {key}"
            )));
        }
        Ok(FieldTarget::Column(key.to_string()))
    }

    fn operator_map(
        &mut self,
        target: &FieldTarget,
        key: &str,
        map: &Map<String, Value>,
    ) -> Result<Predicate, EngineError> {
        if map.is_empty() {
            return Err(EngineError::invalid_filter(format!(
                "empty operator map for {key}"
            )));
        }
        let mut predicates = Vec::with_capacity(map.len());
        for (token, operand) in map {
            let Some(parsed) = FilterOp::parse(token) else {
                return Err(EngineError::invalid_filter(format!(
                    "unknown operator: {token}"
                )));
            };
            self.count_condition()?;
            let cmp = self.comparison(target, key, parsed, operand)?;
            predicates.push(Predicate::Field(FieldPredicate {
                target: target.clone(),
                cmp,
            }));
        }
        Ok(match predicates.len() {
            1 => predicates.remove(0),
            _ => Predicate::All(predicates),
        })
    }

    fn comparison(
        &self,
        target: &FieldTarget,
        key: &str,
        parsed: FilterOp,
        operand: &Value,
    ) -> Result<Compare, EngineError> {
        if parsed.is_json_only() && !matches!(target, FieldTarget::Json { .. }) {
            return Err(EngineError::invalid_filter(format!(
                "{} only applies to document paths",
                parsed.token()
            )));
        }
        match parsed {
            FilterOp::Eq => self.equality(target, key, operand),
            FilterOp::Ne if operand.is_null() => Ok(Compare::NotNull),
            FilterOp::Ne => Ok(Compare::Op(
                CompareOp::Ne,
                self.operand(target, key, operand)?,
            )),
            FilterOp::Gt => self.ordered(target, key, CompareOp::Gt, parsed.token(), operand),
            FilterOp::Gte => self.ordered(target, key, CompareOp::Gte, parsed.token(), operand),
            FilterOp::Lt => self.ordered(target, key, CompareOp::Lt, parsed.token(), operand),
            FilterOp::Lte => self.ordered(target, key, CompareOp::Lte, parsed.token(), operand),
            FilterOp::Like => self.like(target, key, operand),
            FilterOp::In => Ok(Compare::In(self.list(target, key, "$in", operand)?)),
            FilterOp::NotIn => Ok(Compare::NotIn(self.list(target, key, "$notIn", operand)?)),
            FilterOp::Between => self
                .bounds(target, key, "$between", operand)
                .map(|(lo, hi)| Compare::Between(lo, hi)),
            FilterOp::NotBetween => self
                .bounds(target, key, "$notBetween", operand)
                .map(|(lo, hi)| Compare::NotBetween(lo, hi)),
            FilterOp::Exists => Ok(Self::presence(target, op::exists_flag(operand))),
            FilterOp::NotExists => Ok(Self::presence(target, !op::exists_flag(operand))),
            // unary, operand ignored
            FilterOp::Null => Ok(Compare::IsNull),
            FilterOp::NotNull => Ok(Compare::NotNull),
            FilterOp::Contains => Ok(Compare::Contains(element("$contains", operand)?)),
            FilterOp::NotContains => Ok(Compare::NotContains(element("$notContains", operand)?)),
        }
    }

    /// Bare-scalar sugar: `{"field": v}` is equality, `{"field": null}` is
    /// a null check.
    fn equality(
        &self,
        target: &FieldTarget,
        key: &str,
        operand: &Value,
    ) -> Result<Compare, EngineError> {
        if operand.is_null() {
            return Ok(Compare::IsNull);
        }
        Ok(Compare::Op(
            CompareOp::Eq,
            self.operand(target, key, operand)?,
        ))
    }

    fn ordered(
        &self,
        target: &FieldTarget,
        key: &str,
        cmp: CompareOp,
        token: &str,
        operand: &Value,
    ) -> Result<Compare, EngineError> {
        if operand.is_null() {
            return Err(EngineError::invalid_filter(format!(
                "{token} does not accept null"
            )));
        }
        Ok(Compare::Op(cmp, self.operand(target, key, operand)?))
    }

    fn like(
        &self,
        target: &FieldTarget,
        key: &str,
        operand: &Value,
    ) -> Result<Compare, EngineError> {
        let Value::String(pattern) = operand else {
            return Err(EngineError::invalid_filter("$like expects a string pattern"));
        };
        if let FieldTarget::Column(column) = target {
            if columns::column_kind(column) != Some(ColumnKind::Text) {
                return Err(EngineError::invalid_filter(format!(
                    "$like only applies to text columns: {key}"
                )));
            }
        }
        Ok(Compare::Op(
            CompareOp::Like,
            FilterValue::Str(pattern.clone()),
        ))
    }

    fn list(
        &self,
        target: &FieldTarget,
        key: &str,
        token: &str,
        operand: &Value,
    ) -> Result<Vec<FilterValue>, EngineError> {
        let Value::Array(items) = operand else {
            return Err(EngineError::invalid_filter(format!(
                "{token} expects an array operand"
            )));
        };
        if items.is_empty() {
            return Err(EngineError::invalid_filter(format!(
                "{token} must not be empty"
            )));
        }
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            if item.is_null() {
                return Err(EngineError::invalid_filter(format!(
                    "{token} does not accept null elements"
                )));
            }
            values.push(self.operand(target, key, item)?);
        }
        let kind = values[0].cast_kind();
        if values.iter().any(|v| v.cast_kind() != kind) {
            return Err(EngineError::invalid_filter(format!(
                "{token} does not support mixed-type arrays"
            )));
        }
        Ok(values)
    }

    fn bounds(
        &self,
        target: &FieldTarget,
        key: &str,
        token: &str,
        operand: &Value,
    ) -> Result<(FilterValue, FilterValue), EngineError> {
        let Value::Array(items) = operand else {
            return Err(EngineError::invalid_filter(format!(
                "{token} expects a 2-element array"
            )));
        };
        let [lo, hi] = items.as_slice() else {
            return Err(EngineError::invalid_filter(format!(
                "{token} expects exactly 2 elements"
            )));
        };
        if lo.is_null() || hi.is_null() {
            return Err(EngineError::invalid_filter(format!(
                "{token} does not accept null bounds"
            )));
        }
        let lo = self.operand(target, key, lo)?;
        let hi = self.operand(target, key, hi)?;
        if lo.cast_kind() != hi.cast_kind() {
            return Err(EngineError::invalid_filter(format!(
                "{token} bounds must share one type"
            )));
        }
        Ok((lo, hi))
    }

    /// `$exists` on a JSON path tests key presence; on a direct column it
    /// collapses to a null check, since column attributes always exist.
    fn presence(target: &FieldTarget, present: bool) -> Compare {
        match (target, present) {
            (FieldTarget::Json { .. }, true) => Compare::Exists,
            (FieldTarget::Json { .. }, false) => Compare::NotExists,
            (FieldTarget::Column(_), true) => Compare::NotNull,
            (FieldTarget::Column(_), false) => Compare::IsNull,
        }
    }

    /// Decode a scalar operand and, for direct columns, check it against
    /// the column's type so affinity coercion can never make SQL and
    /// in-memory evaluation disagree. JSON paths take any scalar.
    fn operand(
        &self,
        target: &FieldTarget,
        key: &str,
        value: &Value,
    ) -> Result<FilterValue, EngineError> {
        let operand = FilterValue::from_json(value)?;
        let FieldTarget::Column(column) = target else {
            return Ok(operand);
        };
        let Some(kind) = columns::column_kind(column) else {
            return Ok(operand);
        };
        match kind {
            ColumnKind::Int => match operand {
                FilterValue::Int(_) | FilterValue::Float(_) => Ok(operand),
                _ => Err(operand_error(key, "a numeric")),
            },
            ColumnKind::Text => match operand {
                FilterValue::Str(_) => Ok(operand),
                _ => Err(operand_error(key, "a string")),
            },
            ColumnKind::Bool => match operand {
                FilterValue::Bool(_) => Ok(operand),
                FilterValue::Int(0) => Ok(FilterValue::Bool(false)),
                FilterValue::Int(1) => Ok(FilterValue::Bool(true)),
                _ => Err(operand_error(key, "a boolean")),
            },
            ColumnKind::Timestamp => match operand {
                FilterValue::Int(_) | FilterValue::Float(_) => Ok(operand),
                FilterValue::Str(s) => match timestamp_epoch(&s) {
                    Some(epoch) => Ok(FilterValue::Int(epoch)),
                    None => Err(EngineError::invalid_filter(format!(
                        "invalid datetime for {key}: {s}"
                    ))),
                },
                _ => Err(operand_error(key, "a timestamp")),
            },
        }
    }

    fn count_condition(&mut self) -> Result<(), EngineError> {
        self.conditions += 1;
        if self.conditions > self.limits.max_conditions {
            return Err(EngineError::invalid_filter(format!(
                "filter exceeds {} conditions",
                self.limits.max_conditions
            )));
        }
        Ok(())
    }
}

fn element(token: &str, operand: &Value) -> Result<FilterValue, EngineError> {
    if operand.is_null() {
        return Err(EngineError::invalid_filter(format!(
            "{token} does not accept null"
        )));
    }
    FilterValue::from_json(operand)
}

/// Tag name lists may be empty; an empty list lowers to a predicate that
/// matches nothing, which is what "entries tagged with any of []" means.
fn string_list(items: &[Value], token: &str) -> Result<Vec<String>, EngineError> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            _ => Err(EngineError::invalid_filter(format!(
                "{token} entries must be non-empty strings"
            ))),
        })
        .collect()
}

fn operand_error(key: &str, expected: &str) -> EngineError {
    EngineError::invalid_filter(format!("expected {expected} operand for column {key}"))
}

/// Parse a datetime-ish scalar: RFC 3339, `%Y-%m-%d %H:%M:%S`, or a bare
/// date at UTC midnight.
pub(crate) fn timestamp_epoch(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Some(dt.and_utc().timestamp());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    None
}
