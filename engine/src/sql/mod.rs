pub mod dialect;
pub mod lower;
pub mod params;
pub mod postgres;
pub mod sqlite;

pub use dialect::{Dialect, dialect_for};
pub use params::{SqlParams, SqlValue};

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// `$like` operands are bound verbatim, so a host building a pattern from
/// user input should escape it first to prevent unintended wildcards.
///
/// # Example
///
/// ```
/// use leafpress_engine::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
