//! Filter application
//!
//! Folds a decoded `FilterSpec` onto an `EntryQuery` and resolves the
//! result source. With no `$search` the outcome stays lazy; with one, and
//! a provider able to serve the scoped type, the outcome is the provider's
//! ranked sequence and any `$order` directive is ignored in favor of rank.

use crate::error::EngineError;
use crate::filter::spec::FilterSpec;
use crate::query::builder::EntryQuery;
use crate::query::source::ResultSource;
use crate::search::SearchProvider;

pub struct FilterInterpreter<'a> {
    provider: Option<&'a dyn SearchProvider>,
    searchable: bool,
}

impl<'a> FilterInterpreter<'a> {
    /// `searchable` reflects whether the query's type scope supports
    /// search at all; callers decide that from configuration.
    pub fn new(provider: Option<&'a dyn SearchProvider>, searchable: bool) -> Self {
        Self {
            provider,
            searchable,
        }
    }

    /// Apply `spec` to `query` and pick the result source.
    pub async fn apply(
        &self,
        mut query: EntryQuery,
        spec: &FilterSpec,
    ) -> Result<ResultSource, EngineError> {
        if let Some(root) = &spec.root {
            query = query.with_predicate(root.clone());
        }

        if let Some(term) = spec.search.as_deref() {
            match self.provider {
                Some(provider) if self.searchable => {
                    let mut ranked = provider.search(term, &query).await?;
                    let found = ranked.len();
                    // providers may ignore the scope; re-check before trusting
                    ranked.retain(|scored| query.matches(&scored.item));
                    tracing::debug!(
                        term,
                        found,
                        kept = ranked.len(),
                        "search provider ranked results"
                    );
                    return Ok(ResultSource::Ranked(ranked));
                }
                _ => {
                    tracing::debug!(
                        term,
                        searchable = self.searchable,
                        provider = self.provider.is_some(),
                        "search unavailable for this scope, running unranked"
                    );
                }
            }
        }

        for order in &spec.order {
            query = query.order_by(order.clone());
        }
        Ok(ResultSource::Query(query))
    }
}
