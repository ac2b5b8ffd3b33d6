//! Pagination envelope

use serde::Serialize;

/// Pagination metadata returned alongside every listing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(page: u32, per_page: u32, total_items: u64) -> Self {
        Self {
            page,
            per_page,
            total_items,
            total_pages: total_items.div_ceil(per_page as u64),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of results plus its envelope
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total_items: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(page, per_page, total_items),
        }
    }

    /// Transform every item while keeping the envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
