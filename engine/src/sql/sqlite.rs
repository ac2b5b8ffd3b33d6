//! SQLite fragments
//!
//! JSON paths are rendered as `$."a"."b"` strings and bound as parameters to
//! `json_extract` / `json_type` / `json_each`, never interpolated into the
//! statement text.

use crate::core::config::QueryBackend;
use crate::filter::value::{CastKind, FilterValue};
use crate::sql::dialect::Dialect;
use crate::sql::params::{SqlParams, SqlValue};

pub struct SqliteDialect;

/// Segments are quoted so keys with spaces or dashes still resolve.
fn json_path(path: &[String]) -> String {
    let mut out = String::from("$");
    for segment in path {
        out.push_str(".\"");
        out.push_str(segment);
        out.push('"');
    }
    out
}

impl Dialect for SqliteDialect {
    fn backend(&self) -> QueryBackend {
        QueryBackend::Sqlite
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn like_operator(&self) -> &'static str {
        "LIKE"
    }

    fn json_extract(
        &self,
        column: &str,
        path: &[String],
        cast: CastKind,
        params: &mut SqlParams,
    ) -> String {
        params.push(SqlValue::Text(json_path(path)));
        match cast {
            CastKind::Numeric => format!("CAST(json_extract({column}, ?) AS NUMERIC)"),
            CastKind::Boolean => format!("CAST(json_extract({column}, ?) AS INTEGER)"),
            CastKind::Text => format!("CAST(json_extract({column}, ?) AS TEXT)"),
        }
    }

    fn json_raw(&self, column: &str, path: &[String], params: &mut SqlParams) -> String {
        params.push(SqlValue::Text(json_path(path)));
        format!("json_extract({column}, ?)")
    }

    fn json_presence(&self, column: &str, path: &[String], params: &mut SqlParams) -> String {
        params.push(SqlValue::Text(json_path(path)));
        format!("json_type({column}, ?)")
    }

    fn json_array_contains(
        &self,
        column: &str,
        path: &[String],
        value: &FilterValue,
        params: &mut SqlParams,
    ) -> String {
        params.push(SqlValue::Text(json_path(path)));
        params.push(SqlValue::Text(json_path(path)));
        params.push(SqlValue::from(value));
        format!(
            "(json_type({column}, ?) = 'array' AND EXISTS (SELECT 1 FROM json_each({column}, ?) WHERE json_each.value = ?))"
        )
    }
}
