//! Programmatic query construction
//!
//! `EntryQuery` is the context the engine hands to stores and search
//! providers: an entry type scope, a conjunction of predicates, ordering,
//! and optional raw SQL fragments for callers that need an escape hatch.

use crate::error::EngineError;
use crate::filter::columns;
use crate::filter::op::CompareOp;
use crate::filter::predicate::{Compare, FieldPredicate, FieldTarget, Predicate, TagFilter};
use crate::filter::value::FilterValue;
use crate::model::Entry;
use crate::sql::params::SqlValue;

// =============================================================================
// Ordering
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A single ORDER BY term, validated against the sortable column list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn new(column: &str, direction: OrderDirection) -> Result<Self, EngineError> {
        if !columns::is_sortable(column) {
            return Err(EngineError::invalid_filter(format!(
                "cannot order by column: {column}"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }

    /// Parse a `column`, `column:asc` or `column:desc` shorthand.
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let parts: Vec<&str> = s.split(':').collect();
        let (column, direction) = match parts.as_slice() {
            [col] => (*col, OrderDirection::Asc),
            [col, dir] => match OrderDirection::parse(dir) {
                Some(direction) => (*col, direction),
                None => {
                    return Err(EngineError::invalid_filter(format!(
                        "invalid order direction: {dir}"
                    )));
                }
            },
            _ => {
                return Err(EngineError::invalid_filter(
                    "invalid order format, use 'column' or 'column:asc' or 'column:desc'",
                ));
            }
        };
        Self::new(column, direction)
    }

    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.as_sql())
    }
}

// =============================================================================
// Entry Query
// =============================================================================

/// A raw SQL predicate with positional `?` placeholders, rewritten to the
/// dialect's placeholder style when the query is lowered.
#[derive(Debug, Clone)]
pub struct RawWhere {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Accumulated query context for one entry listing
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    pub entry_type: Option<String>,
    pub conjuncts: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    pub raw: Vec<RawWhere>,
}

impl EntryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope the query to one entry type.
    pub fn for_type(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: Some(entry_type.into()),
            ..Self::default()
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.conjuncts.push(predicate);
        self
    }

    pub fn where_equals(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.push_field(column, Compare::Op(CompareOp::Eq, value.into()))
    }

    pub fn where_in(self, column: &str, values: Vec<FilterValue>) -> Self {
        self.push_field(column, Compare::In(values))
    }

    pub fn where_not_in(self, column: &str, values: Vec<FilterValue>) -> Self {
        self.push_field(column, Compare::NotIn(values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.push_field(column, Compare::IsNull)
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.push_field(column, Compare::NotNull)
    }

    /// Match entries carrying at least one of the given tag names, optionally
    /// constrained to one tag type. An empty name list leaves the query
    /// unchanged.
    pub fn with_any_tags(mut self, names: Vec<String>, kind: Option<String>) -> Self {
        if names.is_empty() {
            return self;
        }
        let filter = match kind {
            Some(kind) => TagFilter::Typed {
                kind,
                values: names,
            },
            None => TagFilter::Names(names),
        };
        self.conjuncts.push(Predicate::AnyTag(filter));
        self
    }

    /// Append a raw SQL predicate with `?` placeholders. Raw fragments only
    /// apply when the query runs against a store; `matches` does not see
    /// them.
    pub fn where_raw(mut self, sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        self.raw.push(RawWhere {
            sql: sql.into(),
            params,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    fn push_field(mut self, column: &str, cmp: Compare) -> Self {
        self.conjuncts.push(Predicate::Field(FieldPredicate {
            target: target_for(column),
            cmp,
        }));
        self
    }

    /// Evaluate the type scope and every predicate against one entry.
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(entry_type) = &self.entry_type {
            if entry.entry_type != *entry_type {
                return false;
            }
        }
        self.conjuncts.iter().all(|p| p.matches(entry))
    }
}

/// Split a dotted path on a JSON column into a JSON target; anything else
/// addresses a direct column.
fn target_for(column: &str) -> FieldTarget {
    if let Some((head, rest)) = column.split_once('.') {
        if columns::is_json_column(head) && !rest.is_empty() {
            return FieldTarget::Json {
                column: head.to_string(),
                path: rest.split('.').map(str::to_string).collect(),
            };
        }
    }
    FieldTarget::Column(column.to_string())
}
