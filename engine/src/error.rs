//! Unified error type for the filter and projection engine
//!
//! Structural errors (bad filter shape, unknown operators, bad cast tokens)
//! are raised while decoding, before any SQL exists. Backend failures are
//! wrapped with the originating backend preserved.

use thiserror::Error;

use crate::core::QueryBackend;

/// Errors produced while compiling filters, projecting entries, or executing
/// compiled queries.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed filter input: unknown operator, wrong operand arity,
    /// disallowed column, bad tag shape, structural limits exceeded
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// No dialect is registered for the requested backend
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Unrecognized cast directive in a field selection
    #[error("Invalid cast: {0}")]
    InvalidCast(String),

    /// A recognized cast failed to coerce the value
    #[error("Cast failed: {0}")]
    Cast(String),

    /// Backend failure while executing a compiled query
    #[error("Query failed on {backend}: {source}")]
    Query {
        backend: QueryBackend,
        #[source]
        source: sqlx::Error,
    },
}

impl EngineError {
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    pub fn invalid_cast(msg: impl Into<String>) -> Self {
        Self::InvalidCast(msg.into())
    }

    pub fn cast(msg: impl Into<String>) -> Self {
        Self::Cast(msg.into())
    }

    /// Wrap a SQLite execution failure
    pub fn sqlite(source: sqlx::Error) -> Self {
        Self::Query {
            backend: QueryBackend::Sqlite,
            source,
        }
    }

    /// Wrap a PostgreSQL execution failure
    pub fn postgres(source: sqlx::Error) -> Self {
        Self::Query {
            backend: QueryBackend::Postgres,
            source,
        }
    }

    /// Whether this error is a caller mistake rather than a backend fault.
    /// Callers typically translate these into 4xx-style responses.
    pub fn is_invalid(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilter(_) | Self::InvalidCast(_) | Self::Cast(_)
        )
    }

    /// Backend that produced this error, if any
    pub fn backend(&self) -> Option<QueryBackend> {
        match self {
            Self::Query { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_display() {
        let err = EngineError::invalid_filter("unknown operator: $near");
        assert_eq!(err.to_string(), "Invalid filter: unknown operator: $near");
        assert!(err.is_invalid());
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_query_error_display() {
        let err = EngineError::sqlite(sqlx::Error::PoolClosed);
        assert!(err.to_string().starts_with("Query failed on sqlite"));
        assert!(!err.is_invalid());
        assert_eq!(err.backend(), Some(QueryBackend::Sqlite));
    }

    #[test]
    fn test_invalid_cast_display() {
        let err = EngineError::invalid_cast("unknown cast: money");
        assert_eq!(err.to_string(), "Invalid cast: unknown cast: money");
        assert!(err.is_invalid());
    }
}
