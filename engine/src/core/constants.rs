// =============================================================================
// Pagination
// =============================================================================

/// Default page size for listing queries
pub const DEFAULT_PER_PAGE: u32 = 15;

/// Maximum page size a caller may request
pub const MAX_PER_PAGE: u32 = 100;

// =============================================================================
// Filter Limits
// =============================================================================

/// Maximum size of a raw filter JSON document (64 KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum nesting depth of `$and`/`$or` groups in a filter
pub const MAX_FILTER_DEPTH: usize = 10;

/// Maximum number of individual conditions in a filter
pub const MAX_FILTER_CONDITIONS: usize = 100;

// =============================================================================
// Date Formats
// =============================================================================

/// Output format for `date` projection casts
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output format for `datetime` projection casts
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Database Defaults
// =============================================================================

/// Default max connections for the entry store pool
pub const STORE_DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Batch size for tag/image hydration IN clauses
pub const HYDRATION_BATCH_SIZE: usize = 500;
