//! Domain types shared across the engine

mod entry;

pub use entry::{Entry, ImageRef, Tag};
