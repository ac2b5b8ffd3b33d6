//! Query construction and result shaping

pub mod builder;
pub mod page;
pub mod source;

pub use builder::{EntryQuery, OrderBy, OrderDirection, RawWhere};
pub use page::{Page, PageMeta};
pub use source::ResultSource;
