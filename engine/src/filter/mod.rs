//! Filter language: wire decoding, predicate trees, interpretation

pub mod columns;
pub mod interpreter;
pub mod op;
pub mod predicate;
pub mod spec;
pub mod value;

pub use interpreter::FilterInterpreter;
pub use predicate::{Compare, FieldPredicate, FieldTarget, Predicate, TagFilter};
pub use spec::FilterSpec;
pub use value::FilterValue;
