//! Filter operator table
//!
//! Closed set of operator tokens accepted in an operator map, e.g.
//! `{"$gte": 60, "$lte": 90}`. Unknown tokens are rejected at decode time.

use serde_json::Value;

/// Operator tokens accepted in a filter operator map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    NotIn,
    Between,
    NotBetween,
    Exists,
    NotExists,
    Null,
    NotNull,
    Contains,
    NotContains,
}

impl FilterOp {
    /// Parse a wire token. The empty token means equality.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "" => Some(Self::Eq),
            "$ne" => Some(Self::Ne),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$like" => Some(Self::Like),
            "$in" => Some(Self::In),
            "$notIn" => Some(Self::NotIn),
            "$between" => Some(Self::Between),
            "$notBetween" => Some(Self::NotBetween),
            "$exists" => Some(Self::Exists),
            "$notExists" => Some(Self::NotExists),
            "$null" => Some(Self::Null),
            "$notNull" => Some(Self::NotNull),
            "$contains" => Some(Self::Contains),
            "$notContains" => Some(Self::NotContains),
            _ => None,
        }
    }

    /// Wire token for error messages
    pub fn token(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Like => "$like",
            Self::In => "$in",
            Self::NotIn => "$notIn",
            Self::Between => "$between",
            Self::NotBetween => "$notBetween",
            Self::Exists => "$exists",
            Self::NotExists => "$notExists",
            Self::Null => "$null",
            Self::NotNull => "$notNull",
            Self::Contains => "$contains",
            Self::NotContains => "$notContains",
        }
    }

    /// Operators that only make sense against a JSON document path
    pub fn is_json_only(&self) -> bool {
        matches!(self, Self::Contains | Self::NotContains)
    }

    /// The simple binary comparison this token maps to, if any
    pub fn comparison(&self) -> Option<CompareOp> {
        match self {
            Self::Eq => Some(CompareOp::Eq),
            Self::Ne => Some(CompareOp::Ne),
            Self::Gt => Some(CompareOp::Gt),
            Self::Gte => Some(CompareOp::Gte),
            Self::Lt => Some(CompareOp::Lt),
            Self::Lte => Some(CompareOp::Lte),
            Self::Like => Some(CompareOp::Like),
            _ => None,
        }
    }
}

/// The binary comparison family shared by both dialects. Only the SQL
/// fragment rendering differs per backend; the symbol mapping lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
        }
    }
}

/// Coerce an `$exists` operand to a flag. Only `true`, `"true"` and the
/// integer `1` count as true; anything else is false.
pub fn exists_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_known_tokens() {
        assert_eq!(FilterOp::parse("$gt"), Some(FilterOp::Gt));
        assert_eq!(FilterOp::parse("$notIn"), Some(FilterOp::NotIn));
        assert_eq!(FilterOp::parse("$notBetween"), Some(FilterOp::NotBetween));
        assert_eq!(FilterOp::parse("$contains"), Some(FilterOp::Contains));
        assert_eq!(FilterOp::parse(""), Some(FilterOp::Eq));
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert_eq!(FilterOp::parse("$near"), None);
        assert_eq!(FilterOp::parse("$GT"), None);
        assert_eq!(FilterOp::parse("gt"), None);
    }

    #[test]
    fn comparison_symbols() {
        assert_eq!(CompareOp::Eq.symbol(), "=");
        assert_eq!(CompareOp::Ne.symbol(), "!=");
        assert_eq!(CompareOp::Gte.symbol(), ">=");
        assert_eq!(CompareOp::Like.symbol(), "LIKE");
    }

    #[test]
    fn set_operators_have_no_simple_comparison() {
        assert!(FilterOp::In.comparison().is_none());
        assert!(FilterOp::Between.comparison().is_none());
        assert!(FilterOp::Exists.comparison().is_none());
        assert_eq!(FilterOp::Lte.comparison(), Some(CompareOp::Lte));
    }

    #[test]
    fn exists_flag_coercion() {
        assert!(exists_flag(&json!(true)));
        assert!(exists_flag(&json!("true")));
        assert!(exists_flag(&json!(1)));

        assert!(!exists_flag(&json!(false)));
        assert!(!exists_flag(&json!("TRUE")));
        assert!(!exists_flag(&json!("yes")));
        assert!(!exists_flag(&json!(0)));
        assert!(!exists_flag(&json!(1.0)));
        assert!(!exists_flag(&json!(null)));
    }
}
