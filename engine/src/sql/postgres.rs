//! Postgres fragments
//!
//! Paths into `jsonb` columns are bound as dotted strings and split
//! server-side with `string_to_array`, so the statement text never embeds a
//! client-supplied key. `#>>` yields text and `#>` yields jsonb; the text
//! form is SQL NULL for both absent keys and stored nulls, which is exactly
//! the IS NULL semantics the filter language wants.

use crate::core::config::QueryBackend;
use crate::filter::value::{CastKind, FilterValue};
use crate::sql::dialect::Dialect;
use crate::sql::params::{SqlParams, SqlValue};

pub struct PostgresDialect;

/// Bind the dotted path and return the `text[]` expression for it. Path
/// segments come from splitting a filter key on dots, so none of them can
/// contain a dot themselves.
fn path_expr(path: &[String], params: &mut SqlParams) -> String {
    let n = params.push(SqlValue::Text(path.join(".")));
    format!("string_to_array(${n}, '.')")
}

impl Dialect for PostgresDialect {
    fn backend(&self) -> QueryBackend {
        QueryBackend::Postgres
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn like_operator(&self) -> &'static str {
        "ILIKE"
    }

    fn json_extract(
        &self,
        column: &str,
        path: &[String],
        cast: CastKind,
        params: &mut SqlParams,
    ) -> String {
        let path = path_expr(path, params);
        match cast {
            CastKind::Numeric => format!("({column} #>> {path})::numeric"),
            CastKind::Boolean => format!("({column} #>> {path})::boolean"),
            CastKind::Text => format!("{column} #>> {path}"),
        }
    }

    fn json_raw(&self, column: &str, path: &[String], params: &mut SqlParams) -> String {
        let path = path_expr(path, params);
        format!("{column} #>> {path}")
    }

    fn json_presence(&self, column: &str, path: &[String], params: &mut SqlParams) -> String {
        let path = path_expr(path, params);
        format!("{column} #> {path}")
    }

    fn json_array_contains(
        &self,
        column: &str,
        path: &[String],
        value: &FilterValue,
        params: &mut SqlParams,
    ) -> String {
        let type_path = path_expr(path, params);
        let contain_path = path_expr(path, params);
        let v = params.push(SqlValue::Text(value.as_json().to_string()));
        format!(
            "COALESCE(jsonb_typeof({column} #> {type_path}) = 'array' AND {column} #> {contain_path} @> ${v}::jsonb, false)"
        )
    }
}
