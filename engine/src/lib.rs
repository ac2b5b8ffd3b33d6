//! # Leafpress Engine
//!
//! Filter and projection engine for headless content APIs. Interprets
//! JSON filter documents (`$and`/`$or` groups, operator maps, tag and
//! search directives) into parameterized SQL over SQLite or Postgres,
//! and projects stored entries into client-shaped JSON through a
//! field-selection language with casts.
//!
//! The engine is read-only: entries are written by an external sync
//! pipeline; this crate only queries and serializes them.

pub mod core;
pub mod engine;
pub mod error;
pub mod filter;
pub mod images;
pub mod model;
pub mod projection;
pub mod query;
pub mod search;
pub mod sql;
pub mod store;

pub use crate::core::config::{
    DatabaseConfig, EngineConfig, FilterLimits, PaginationConfig, QueryBackend,
};
pub use crate::engine::QueryEngine;
pub use crate::error::EngineError;
pub use crate::filter::{FilterSpec, FilterValue, Predicate};
pub use crate::images::{ImageDescriptor, ImageRenderOptions, ImageResolver};
pub use crate::model::{Entry, ImageRef, Tag};
pub use crate::projection::{FieldSelectionSpec, PrimitiveCast, Projector};
pub use crate::query::{EntryQuery, Page, PageMeta, ResultSource};
pub use crate::search::{Scored, SearchProvider};
pub use crate::store::EntryStore;
