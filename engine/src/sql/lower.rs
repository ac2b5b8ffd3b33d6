//! Lowering from predicate trees to parameterized SQL
//!
//! One pass walks the tree and appends bind values in statement order, so
//! the fragment text and the parameter list always line up. The boolean
//! shape is dialect-independent; JSON fragments and the placeholder style
//! come from the `Dialect`.

use crate::filter::op::CompareOp;
use crate::filter::predicate::{Compare, FieldPredicate, FieldTarget, Predicate, TagFilter};
use crate::filter::value::{CastKind, FilterValue};
use crate::query::builder::{EntryQuery, RawWhere};
use crate::sql::dialect::Dialect;
use crate::sql::params::{SqlParams, SqlValue};
use crate::store::schema::ENTRY_COLUMNS;

// =============================================================================
// Entry Points
// =============================================================================

/// Render one predicate tree as a WHERE fragment.
pub fn where_clause(
    predicate: &Predicate,
    dialect: &dyn Dialect,
    params: &mut SqlParams,
) -> String {
    match predicate {
        Predicate::All(children) => group_sql(children, " AND ", "1 = 1", dialect, params),
        Predicate::Any(children) => group_sql(children, " OR ", "1 = 0", dialect, params),
        Predicate::Field(field) => field_sql(field, dialect, params),
        Predicate::AnyTag(tags) => tags_sql(tags, dialect, params),
    }
}

/// WHERE body for a full query context: type scope, predicate conjuncts and
/// raw fragments, ANDed together. `None` when the query is unconstrained.
pub fn query_where(
    query: &EntryQuery,
    dialect: &dyn Dialect,
    params: &mut SqlParams,
) -> Option<String> {
    let mut clauses = Vec::new();
    if let Some(entry_type) = &query.entry_type {
        let n = params.push(SqlValue::Text(entry_type.clone()));
        clauses.push(format!("type = {}", dialect.placeholder(n)));
    }
    for conjunct in &query.conjuncts {
        clauses.push(where_clause(conjunct, dialect, params));
    }
    for raw in &query.raw {
        clauses.push(format!("({})", rewrite_raw(raw, dialect, params)));
    }
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// SELECT over the entries table with ordering and optional LIMIT/OFFSET.
pub fn build_select(
    query: &EntryQuery,
    dialect: &dyn Dialect,
    limit_offset: Option<(u32, u32)>,
    params: &mut SqlParams,
) -> String {
    let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM entries");
    if let Some(clause) = query_where(query, dialect, params) {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    if !query.order.is_empty() {
        let terms: Vec<String> = query.order.iter().map(|o| o.to_sql()).collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }
    if let Some((limit, offset)) = limit_offset {
        let l = params.push(SqlValue::Int(i64::from(limit)));
        sql.push_str(&format!(" LIMIT {}", dialect.placeholder(l)));
        let o = params.push(SqlValue::Int(i64::from(offset)));
        sql.push_str(&format!(" OFFSET {}", dialect.placeholder(o)));
    }
    sql
}

pub fn build_count(query: &EntryQuery, dialect: &dyn Dialect, params: &mut SqlParams) -> String {
    match query_where(query, dialect, params) {
        Some(clause) => format!("SELECT COUNT(*) FROM entries WHERE {clause}"),
        None => "SELECT COUNT(*) FROM entries".to_string(),
    }
}

// =============================================================================
// Fragments
// =============================================================================

/// Appended to every LIKE so `\%`/`\_` escape the same way under SQLite
/// (no default escape character) and Postgres (backslash by default).
const LIKE_ESCAPE: &str = " ESCAPE '\\'";

fn group_sql(
    children: &[Predicate],
    joiner: &str,
    empty: &str,
    dialect: &dyn Dialect,
    params: &mut SqlParams,
) -> String {
    match children {
        [] => empty.to_string(),
        [only] => where_clause(only, dialect, params),
        _ => {
            let parts: Vec<String> = children
                .iter()
                .map(|child| where_clause(child, dialect, params))
                .collect();
            format!("({})", parts.join(joiner))
        }
    }
}

fn field_sql(field: &FieldPredicate, dialect: &dyn Dialect, params: &mut SqlParams) -> String {
    match &field.target {
        FieldTarget::Column(column) => column_sql(column, &field.cmp, dialect, params),
        FieldTarget::Json { column, path } => json_sql(column, path, &field.cmp, dialect, params),
    }
}

fn column_sql(
    column: &str,
    cmp: &Compare,
    dialect: &dyn Dialect,
    params: &mut SqlParams,
) -> String {
    match cmp {
        Compare::Op(op, value) => {
            let n = params.push(SqlValue::from(value));
            let mut sql = format!(
                "{column} {} {}",
                op_symbol(*op, dialect),
                dialect.placeholder(n)
            );
            if *op == CompareOp::Like {
                sql.push_str(LIKE_ESCAPE);
            }
            sql
        }
        Compare::In(values) if values.is_empty() => "1 = 0".to_string(),
        Compare::In(values) => format!("{column} IN ({})", placeholders(values, dialect, params)),
        Compare::NotIn(values) if values.is_empty() => "1 = 1".to_string(),
        Compare::NotIn(values) => {
            format!("{column} NOT IN ({})", placeholders(values, dialect, params))
        }
        Compare::Between(lo, hi) => {
            format!("{column} BETWEEN {}", between_bounds(lo, hi, dialect, params))
        }
        Compare::NotBetween(lo, hi) => {
            format!(
                "{column} NOT BETWEEN {}",
                between_bounds(lo, hi, dialect, params)
            )
        }
        Compare::IsNull => format!("{column} IS NULL"),
        Compare::NotNull => format!("{column} IS NOT NULL"),
        // direct columns always exist as attributes, and never hold arrays
        Compare::Exists => "1 = 1".to_string(),
        Compare::NotExists => "1 = 0".to_string(),
        Compare::Contains(_) => "1 = 0".to_string(),
        Compare::NotContains(_) => "1 = 1".to_string(),
    }
}

fn json_sql(
    column: &str,
    path: &[String],
    cmp: &Compare,
    dialect: &dyn Dialect,
    params: &mut SqlParams,
) -> String {
    match cmp {
        Compare::Op(op, value) => {
            let cast = if *op == CompareOp::Like {
                CastKind::Text
            } else {
                value.cast_kind()
            };
            let extract = dialect.json_extract(column, path, cast, params);
            let n = params.push(SqlValue::from(value));
            let mut sql = format!(
                "{extract} {} {}",
                op_symbol(*op, dialect),
                dialect.placeholder(n)
            );
            if *op == CompareOp::Like {
                sql.push_str(LIKE_ESCAPE);
            }
            sql
        }
        Compare::In(values) if values.is_empty() => "1 = 0".to_string(),
        Compare::In(values) => {
            let extract = dialect.json_extract(column, path, list_cast(values), params);
            format!("{extract} IN ({})", placeholders(values, dialect, params))
        }
        Compare::NotIn(values) if values.is_empty() => "1 = 1".to_string(),
        Compare::NotIn(values) => {
            let extract = dialect.json_extract(column, path, list_cast(values), params);
            format!("{extract} NOT IN ({})", placeholders(values, dialect, params))
        }
        Compare::Between(lo, hi) => {
            let extract = dialect.json_extract(column, path, lo.cast_kind(), params);
            format!("{extract} BETWEEN {}", between_bounds(lo, hi, dialect, params))
        }
        Compare::NotBetween(lo, hi) => {
            let extract = dialect.json_extract(column, path, lo.cast_kind(), params);
            format!(
                "{extract} NOT BETWEEN {}",
                between_bounds(lo, hi, dialect, params)
            )
        }
        Compare::IsNull => format!("{} IS NULL", dialect.json_raw(column, path, params)),
        Compare::NotNull => format!("{} IS NOT NULL", dialect.json_raw(column, path, params)),
        Compare::Exists => format!("{} IS NOT NULL", dialect.json_presence(column, path, params)),
        Compare::NotExists => format!("{} IS NULL", dialect.json_presence(column, path, params)),
        Compare::Contains(value) => dialect.json_array_contains(column, path, value, params),
        Compare::NotContains(value) => {
            format!(
                "NOT {}",
                dialect.json_array_contains(column, path, value, params)
            )
        }
    }
}

fn tags_sql(tags: &TagFilter, dialect: &dyn Dialect, params: &mut SqlParams) -> String {
    if tags.names().is_empty() {
        return "1 = 0".to_string();
    }
    let name_list: Vec<String> = tags
        .names()
        .iter()
        .map(|name| {
            let n = params.push(SqlValue::Text(name.clone()));
            dialect.placeholder(n)
        })
        .collect();
    let mut sql = format!(
        "EXISTS (SELECT 1 FROM entry_tag et JOIN tags t ON t.id = et.tag_id WHERE et.entry_id = entries.id AND t.name IN ({})",
        name_list.join(", ")
    );
    if let Some(kind) = tags.kind() {
        let n = params.push(SqlValue::Text(kind.to_string()));
        sql.push_str(&format!(" AND t.type = {}", dialect.placeholder(n)));
    }
    sql.push(')');
    sql
}

fn op_symbol(op: CompareOp, dialect: &dyn Dialect) -> &'static str {
    match op {
        CompareOp::Like => dialect.like_operator(),
        _ => op.symbol(),
    }
}

fn placeholders(values: &[FilterValue], dialect: &dyn Dialect, params: &mut SqlParams) -> String {
    let parts: Vec<String> = values
        .iter()
        .map(|value| {
            let n = params.push(SqlValue::from(value));
            dialect.placeholder(n)
        })
        .collect();
    parts.join(", ")
}

fn between_bounds(
    lo: &FilterValue,
    hi: &FilterValue,
    dialect: &dyn Dialect,
    params: &mut SqlParams,
) -> String {
    let l = params.push(SqlValue::from(lo));
    let lo_ph = dialect.placeholder(l);
    let h = params.push(SqlValue::from(hi));
    format!("{lo_ph} AND {}", dialect.placeholder(h))
}

/// The IN-list cast is fixed by the first element; the decoder guarantees
/// the list is homogeneous.
fn list_cast(values: &[FilterValue]) -> CastKind {
    values
        .first()
        .map(FilterValue::cast_kind)
        .unwrap_or(CastKind::Text)
}

/// Rewrite `?` placeholders in a raw fragment to the dialect's style while
/// appending its parameters in order.
fn rewrite_raw(raw: &RawWhere, dialect: &dyn Dialect, params: &mut SqlParams) -> String {
    let mut out = String::with_capacity(raw.sql.len());
    let mut values = raw.params.iter();
    for ch in raw.sql.chars() {
        if ch == '?' {
            if let Some(value) = values.next() {
                let n = params.push(value.clone());
                out.push_str(&dialect.placeholder(n));
                continue;
            }
        }
        out.push(ch);
    }
    out
}
