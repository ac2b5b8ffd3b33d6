//! Predicate tree
//!
//! Filters are decoded into an explicit tree first; lowering to SQL is a
//! separate single pass. The tree can also be evaluated directly against
//! hydrated entries, which is how ranked search results are post-filtered
//! and how the SQL lowering is cross-checked in tests.
//!
//! In-memory evaluation mirrors SQLite comparison semantics: SQL NULL never
//! satisfies a comparison, text casts of numbers use their minimal rendering,
//! numeric casts of non-numeric text yield 0, and LIKE is ASCII
//! case-insensitive.

use serde_json::Value;

use crate::model::Entry;

use super::op::CompareOp;
use super::value::{CastKind, FilterValue};

/// Recursion cap for programmatically built trees. Decoded filters are
/// bounded long before this by `FilterLimits`.
const MAX_EVAL_DEPTH: usize = 64;

// =============================================================================
// Tag Filter
// =============================================================================

/// Decoded `$tags` shape: a plain name list, or names constrained to one
/// tag type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    Names(Vec<String>),
    Typed { kind: String, values: Vec<String> },
}

impl TagFilter {
    pub fn names(&self) -> &[String] {
        match self {
            Self::Names(names) => names,
            Self::Typed { values, .. } => values,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Names(_) => None,
            Self::Typed { kind, .. } => Some(kind),
        }
    }
}

// =============================================================================
// Predicate Tree
// =============================================================================

/// What a field predicate addresses: a direct column, or a path inside a
/// JSON document column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTarget {
    Column(String),
    Json { column: String, path: Vec<String> },
}

/// A comparison with its operand(s). Arity is fixed by the variant, so a
/// decoded predicate can never carry a wrong-shaped operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Compare {
    /// Simple binary comparison (`=`, `!=`, `>`, `>=`, `<`, `<=`, `LIKE`)
    Op(CompareOp, FilterValue),
    In(Vec<FilterValue>),
    NotIn(Vec<FilterValue>),
    Between(FilterValue, FilterValue),
    NotBetween(FilterValue, FilterValue),
    /// Extraction is SQL NULL (for JSON paths: key absent or explicit null)
    IsNull,
    NotNull,
    /// JSON key is present, even if its value is null
    Exists,
    NotExists,
    /// JSON value is an array containing the operand
    Contains(FilterValue),
    NotContains(FilterValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub target: FieldTarget,
    pub cmp: Compare,
}

/// A boolean combination of field, tag, and group predicates
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Field(FieldPredicate),
    AnyTag(TagFilter),
}

impl Predicate {
    /// Evaluate against a hydrated entry.
    pub fn matches(&self, entry: &Entry) -> bool {
        self.matches_at(entry, 0)
    }

    fn matches_at(&self, entry: &Entry, depth: usize) -> bool {
        if depth > MAX_EVAL_DEPTH {
            return false;
        }
        match self {
            Self::All(children) => children.iter().all(|c| c.matches_at(entry, depth + 1)),
            Self::Any(children) => children.iter().any(|c| c.matches_at(entry, depth + 1)),
            Self::Field(field) => field.matches(entry),
            Self::AnyTag(tags) => entry.has_any_tag(tags.names(), tags.kind()),
        }
    }
}

// =============================================================================
// Field Evaluation
// =============================================================================

/// Result of resolving a field target against an entry
enum Resolution<'a> {
    /// JSON key absent somewhere along the path
    Absent,
    /// SQL NULL: null column, or JSON key present with explicit null
    Null,
    Value(&'a Value),
}

impl FieldPredicate {
    pub fn matches(&self, entry: &Entry) -> bool {
        let column_holder;
        let resolution = match &self.target {
            FieldTarget::Column(column) => match entry.column_value(column) {
                Some(value) => {
                    column_holder = value;
                    Resolution::Value(&column_holder)
                }
                None => Resolution::Null,
            },
            FieldTarget::Json { path, .. } => match entry.meta_value(path) {
                Some(Value::Null) => Resolution::Null,
                Some(value) => Resolution::Value(value),
                None => Resolution::Absent,
            },
        };

        match &self.cmp {
            Compare::Op(op, operand) => match resolution {
                Resolution::Value(value) => compare_value(*op, value, operand),
                _ => false,
            },
            Compare::In(candidates) => match resolution {
                Resolution::Value(value) => in_list(value, candidates),
                _ => false,
            },
            Compare::NotIn(candidates) => match resolution {
                Resolution::Value(value) => !in_list(value, candidates),
                _ => false,
            },
            Compare::Between(lo, hi) => match resolution {
                Resolution::Value(value) => between(value, lo, hi),
                _ => false,
            },
            Compare::NotBetween(lo, hi) => match resolution {
                Resolution::Value(value) => !between(value, lo, hi),
                _ => false,
            },
            Compare::IsNull => matches!(resolution, Resolution::Null | Resolution::Absent),
            Compare::NotNull => matches!(resolution, Resolution::Value(_)),
            Compare::Exists => !matches!(resolution, Resolution::Absent),
            Compare::NotExists => matches!(resolution, Resolution::Absent),
            Compare::Contains(operand) => match resolution {
                Resolution::Value(Value::Array(items)) => {
                    items.iter().any(|item| element_eq(item, operand))
                }
                _ => false,
            },
            Compare::NotContains(operand) => !match resolution {
                Resolution::Value(Value::Array(items)) => {
                    items.iter().any(|item| element_eq(item, operand))
                }
                _ => false,
            },
        }
    }
}

fn compare_value(op: CompareOp, value: &Value, operand: &FilterValue) -> bool {
    // LIKE always compares the text rendering, whatever the operand type
    if op == CompareOp::Like {
        if let FilterValue::Str(pattern) = operand {
            return like_match(pattern, &text_repr(value));
        }
        return false;
    }
    match operand.cast_kind() {
        CastKind::Numeric => match operand.as_f64() {
            Some(rhs) => numeric_compare(op, numeric_repr(value), rhs),
            None => false,
        },
        CastKind::Boolean => {
            let rhs = match operand {
                FilterValue::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                _ => return false,
            };
            numeric_compare(op, numeric_repr(value).trunc(), rhs)
        }
        CastKind::Text => {
            let rhs = match operand {
                FilterValue::Str(s) => s.as_str(),
                // null operands are normalized to IS NULL during decode
                _ => return false,
            };
            text_compare(op, &text_repr(value), rhs)
        }
    }
}

fn in_list(value: &Value, candidates: &[FilterValue]) -> bool {
    // The cast is fixed by the first element, same as the SQL rendering
    let kind = match candidates.first() {
        Some(first) => first.cast_kind(),
        None => return false,
    };
    candidates.iter().any(|candidate| match kind {
        CastKind::Numeric => match candidate.as_f64() {
            Some(rhs) => numeric_repr(value) == rhs,
            None => false,
        },
        CastKind::Boolean => match candidate {
            FilterValue::Bool(b) => numeric_repr(value).trunc() == if *b { 1.0 } else { 0.0 },
            _ => false,
        },
        CastKind::Text => match candidate {
            FilterValue::Str(s) => text_repr(value) == *s,
            _ => false,
        },
    })
}

fn between(value: &Value, lo: &FilterValue, hi: &FilterValue) -> bool {
    match lo.cast_kind() {
        CastKind::Numeric | CastKind::Boolean => {
            match (lo.as_f64(), hi.as_f64()) {
                (Some(lo), Some(hi)) => {
                    let v = numeric_repr(value);
                    v >= lo && v <= hi
                }
                _ => false,
            }
        }
        CastKind::Text => match (lo, hi) {
            (FilterValue::Str(lo), FilterValue::Str(hi)) => {
                let v = text_repr(value);
                v.as_str() >= lo.as_str() && v.as_str() <= hi.as_str()
            }
            _ => false,
        },
    }
}

/// Equality between a JSON array element and a `$contains` operand, the way
/// SQLite's `json_each.value` compares against a bound parameter (booleans
/// surface as 0/1, strings never equal numbers).
fn element_eq(item: &Value, operand: &FilterValue) -> bool {
    match operand {
        FilterValue::Str(s) => item.as_str() == Some(s.as_str()),
        FilterValue::Int(i) => match item {
            Value::Number(n) => n.as_f64() == Some(*i as f64),
            Value::Bool(b) => i64::from(*b) == *i,
            _ => false,
        },
        FilterValue::Float(f) => match item {
            Value::Number(n) => n.as_f64() == Some(*f),
            Value::Bool(b) => f64::from(u8::from(*b)) == *f,
            _ => false,
        },
        FilterValue::Bool(b) => match item {
            Value::Bool(v) => v == b,
            Value::Number(n) => n.as_i64() == Some(i64::from(*b)),
            _ => false,
        },
        FilterValue::Null => false,
    }
}

fn numeric_compare(op: CompareOp, lhs: f64, rhs: f64) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Gte => lhs >= rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Lte => lhs <= rhs,
        CompareOp::Like => false,
    }
}

fn text_compare(op: CompareOp, lhs: &str, rhs: &str) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Gte => lhs >= rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Lte => lhs <= rhs,
        CompareOp::Like => like_match(rhs, lhs),
    }
}

/// `CAST(x AS NUMERIC)` semantics: numbers pass through, booleans become
/// 0/1, text yields its longest numeric prefix (or 0).
fn numeric_repr(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => numeric_prefix(s),
        _ => 0.0,
    }
}

/// `CAST(x AS TEXT)` semantics: strings pass through, numbers render
/// minimally, booleans surface as the integers they are stored as.
fn text_repr(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Longest numeric prefix of a string, or 0. Mirrors SQLite's text-to-number
/// coercion (`'12abc'` is 12, `'abc'` is 0).
pub(crate) fn numeric_prefix(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let has_int = i > int_start;
    if has_int {
        end = i;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if has_int || i > frac_start {
            end = i;
        }
    }
    if end > 0 && i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }
    if end == 0 {
        return 0.0;
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// SQL LIKE with `%` and `_` wildcards, ASCII case-insensitive. Backslash
/// escapes the next character, mirroring the `ESCAPE '\'` clause the
/// lowering appends on both backends.
fn like_match(pattern: &str, text: &str) -> bool {
    fn rec(p: &[char], t: &[char]) -> bool {
        match p.first() {
            None => t.is_empty(),
            Some('\\') if p.len() > 1 => t.first() == Some(&p[1]) && rec(&p[2..], &t[1..]),
            Some('%') => {
                let rest = &p[1..];
                if rest.is_empty() {
                    return true;
                }
                (0..=t.len()).any(|skip| rec(rest, &t[skip..]))
            }
            Some('_') => !t.is_empty() && rec(&p[1..], &t[1..]),
            Some(c) => t.first() == Some(c) && rec(&p[1..], &t[1..]),
        }
    }
    let p: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let t: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    rec(&p, &t)
}
