//! Result sources
//!
//! Applying a filter produces one of two things: a still-lazy query the
//! store can count and page over, or a sequence already materialized and
//! ranked by a search provider. Rank order is authoritative for the
//! latter, so pagination slices it instead of re-sorting.

use crate::error::EngineError;
use crate::model::Entry;
use crate::query::builder::EntryQuery;
use crate::query::page::Page;
use crate::search::Scored;
use crate::store::EntryStore;

#[derive(Debug, Clone)]
pub enum ResultSource {
    /// Predicates held, nothing executed yet.
    Query(EntryQuery),
    /// Materialized by a search provider, in rank order.
    Ranked(Vec<Scored<Entry>>),
}

impl ResultSource {
    /// Total matching entries, without fetching a page.
    pub async fn count(&self, store: &EntryStore) -> Result<u64, EngineError> {
        match self {
            Self::Query(query) => store.count(query).await,
            Self::Ranked(ranked) => Ok(ranked.len() as u64),
        }
    }

    /// Fetch one page. Lazy queries push LIMIT/OFFSET down to the store;
    /// ranked sequences are sliced in memory. Entries from the lazy path
    /// carry no relevance.
    pub async fn paginate(
        self,
        store: &EntryStore,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Scored<Entry>>, EngineError> {
        let page = page.max(1);
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        match self {
            Self::Query(query) => {
                let total = store.count(&query).await?;
                let entries = store.fetch(&query, Some((per_page, offset))).await?;
                let data = entries
                    .into_iter()
                    .map(|entry| Scored::new(entry, None))
                    .collect();
                Ok(Page::new(data, page, per_page, total))
            }
            Self::Ranked(ranked) => {
                let total = ranked.len() as u64;
                let data = ranked
                    .into_iter()
                    .skip(offset as usize)
                    .take(per_page as usize)
                    .collect();
                Ok(Page::new(data, page, per_page, total))
            }
        }
    }
}
