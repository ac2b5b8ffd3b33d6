//! Search provider seam
//!
//! `$search` hands off to an external provider. Ranking is provider-defined
//! (vector distance, reranking, whatever) and opaque here; the engine only
//! requires that results come back ordered and carry a relevance score.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::model::Entry;
use crate::query::builder::EntryQuery;

/// One ranked result with its provider-assigned relevance.
#[derive(Debug, Clone)]
pub struct Scored<T> {
    pub item: T,
    pub relevance: Option<f64>,
}

impl<T> Scored<T> {
    pub fn new(item: T, relevance: Option<f64>) -> Self {
        Self { item, relevance }
    }
}

/// Full-text / semantic search backend.
///
/// The `scope` query carries the predicates built so far. Providers that
/// support pre-filtering should honor it; the engine re-checks returned
/// entries against the scope either way, so a provider that ignores it
/// still produces correct (if wasteful) results.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search, returning entries in rank order.
    async fn search(
        &self,
        term: &str,
        scope: &EntryQuery,
    ) -> Result<Vec<Scored<Entry>>, EngineError>;
}
