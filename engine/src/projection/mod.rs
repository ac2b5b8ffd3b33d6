//! Field selection, casting, and output shaping

pub mod cast;
pub mod field;
pub mod serializer;

pub use field::{CastDirective, FieldSelection, FieldSelectionSpec, PrimitiveCast};
pub use serializer::Projector;
