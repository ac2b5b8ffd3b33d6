//! Entry column whitelists
//!
//! Filter and order keys are checked against these before any SQL is built.
//! A key that names no known column is rejected rather than passed through.

/// Columns a filter may address directly
pub const FILTERABLE: &[&str] = &[
    "id",
    "type",
    "title",
    "slug",
    "content",
    "excerpt",
    "filename",
    "is_index",
    "published_at",
    "created_at",
    "updated_at",
];

/// Columns `$order` may sort by
pub const SORTABLE: &[&str] = &[
    "id",
    "type",
    "title",
    "slug",
    "published_at",
    "created_at",
    "updated_at",
];

/// Columns holding a JSON document, addressable with dotted paths
pub const JSON_COLUMNS: &[&str] = &["meta"];

/// Host type of a direct column, used to normalize operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Text,
    Bool,
    /// Stored as epoch seconds; datetime-string operands are normalized
    Timestamp,
}

pub fn column_kind(column: &str) -> Option<ColumnKind> {
    match column {
        "id" => Some(ColumnKind::Int),
        "type" | "title" | "slug" | "content" | "excerpt" | "filename" => Some(ColumnKind::Text),
        "is_index" => Some(ColumnKind::Bool),
        "published_at" | "created_at" | "updated_at" => Some(ColumnKind::Timestamp),
        _ => None,
    }
}

pub fn is_filterable(column: &str) -> bool {
    FILTERABLE.contains(&column)
}

pub fn is_sortable(column: &str) -> bool {
    SORTABLE.contains(&column)
}

pub fn is_json_column(column: &str) -> bool {
    JSON_COLUMNS.contains(&column)
}
