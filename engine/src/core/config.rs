use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::{
    DEFAULT_PER_PAGE, MAX_FILTER_CONDITIONS, MAX_FILTER_DEPTH, MAX_FILTER_JSON_SIZE, MAX_PER_PAGE,
    STORE_DEFAULT_MAX_CONNECTIONS,
};

// =============================================================================
// Query Backend Enum (SQLite or PostgreSQL)
// =============================================================================

/// Relational backend the engine compiles predicates for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryBackend {
    #[default]
    Sqlite,
    Postgres,
}

impl QueryBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryBackend::Sqlite => "sqlite",
            QueryBackend::Postgres => "postgres",
        }
    }
}

impl fmt::Display for QueryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Config Sections
// =============================================================================

/// Connection settings for the entry store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite:...` or `postgres://...`)
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: STORE_DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Page size bounds for listing queries
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }
}

impl PaginationConfig {
    /// Clamp a requested page size into the configured bounds.
    /// Zero or absent falls back to the default.
    pub fn clamp_per_page(&self, requested: Option<u32>) -> u32 {
        match requested {
            None | Some(0) => self.default_per_page,
            Some(n) => n.min(self.max_per_page),
        }
    }
}

/// Structural limits applied while decoding a filter document
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterLimits {
    /// Maximum raw JSON size in bytes
    pub max_json_bytes: usize,
    /// Maximum `$and`/`$or` nesting depth
    pub max_depth: usize,
    /// Maximum number of conditions across the whole filter
    pub max_conditions: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_json_bytes: MAX_FILTER_JSON_SIZE,
            max_depth: MAX_FILTER_DEPTH,
            max_conditions: MAX_FILTER_CONDITIONS,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub limits: FilterLimits,
    /// Entry types eligible for `$search` dispatch. `None` means all types.
    pub searchable_types: Option<Vec<String>>,
}

impl EngineConfig {
    /// Whether `$search` may dispatch for the given type scope.
    ///
    /// An unscoped query (no type) passes the gate; the provider decides
    /// what it can rank.
    pub fn type_is_searchable(&self, entry_type: Option<&str>) -> bool {
        match (&self.searchable_types, entry_type) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(types), Some(t)) => types.iter().any(|s| s == t),
        }
    }
}
