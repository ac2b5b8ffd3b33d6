//! Dialect adapter seam
//!
//! Boolean structure, IN lists and tag subqueries render the same on every
//! backend, but anything touching a JSON document does not. The lowering
//! pass keeps the shared shape and delegates the JSON fragments and the
//! placeholder style to a `Dialect`.

use crate::core::config::QueryBackend;
use crate::filter::value::{CastKind, FilterValue};
use crate::sql::params::SqlParams;
use crate::sql::postgres::PostgresDialect;
use crate::sql::sqlite::SqliteDialect;

pub trait Dialect: Send + Sync {
    fn backend(&self) -> QueryBackend;

    /// Placeholder text for the 1-based parameter position.
    fn placeholder(&self, index: usize) -> String;

    /// Operator used for `$like`. Case-insensitive on both backends.
    fn like_operator(&self) -> &'static str;

    /// JSON extraction casted for comparison under the given kind.
    fn json_extract(
        &self,
        column: &str,
        path: &[String],
        cast: CastKind,
        params: &mut SqlParams,
    ) -> String;

    /// Uncasted extraction: SQL NULL iff the path is absent or holds null.
    fn json_raw(&self, column: &str, path: &[String], params: &mut SqlParams) -> String;

    /// Expression that is SQL NULL iff the path is absent. A stored null
    /// still counts as present.
    fn json_presence(&self, column: &str, path: &[String], params: &mut SqlParams) -> String;

    /// Predicate: the path holds an array containing the scalar operand.
    /// Always TRUE or FALSE, never NULL, so `NOT` distributes over it.
    fn json_array_contains(
        &self,
        column: &str,
        path: &[String],
        value: &FilterValue,
        params: &mut SqlParams,
    ) -> String;
}

pub fn dialect_for(backend: QueryBackend) -> &'static dyn Dialect {
    match backend {
        QueryBackend::Sqlite => &SqliteDialect,
        QueryBackend::Postgres => &PostgresDialect,
    }
}
