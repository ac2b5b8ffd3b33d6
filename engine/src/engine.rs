//! Engine facade
//!
//! Ties the pieces together: decode filter and field selection, scope by
//! entry type, interpret, page, project. Hosts construct one engine per
//! database and share it; every call is stateless.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::config::{EngineConfig, QueryBackend};
use crate::error::EngineError;
use crate::filter::interpreter::FilterInterpreter;
use crate::filter::spec::FilterSpec;
use crate::filter::value::FilterValue;
use crate::images::ImageResolver;
use crate::projection::field::FieldSelectionSpec;
use crate::projection::serializer::Projector;
use crate::query::builder::{EntryQuery, OrderBy, OrderDirection};
use crate::query::page::Page;
use crate::query::source::ResultSource;
use crate::search::SearchProvider;
use crate::store::EntryStore;

pub struct QueryEngine {
    store: EntryStore,
    config: EngineConfig,
    search: Option<Arc<dyn SearchProvider>>,
    images: Option<Arc<dyn ImageResolver>>,
}

impl QueryEngine {
    /// Connect to the configured database and wrap it.
    pub async fn connect(config: EngineConfig) -> Result<Self, EngineError> {
        let store = EntryStore::connect(&config.database).await?;
        Ok(Self::with_store(store, config))
    }

    /// Build an engine around an already-connected store.
    pub fn with_store(store: EntryStore, config: EngineConfig) -> Self {
        tracing::debug!(backend = %store.backend(), "query engine ready");
        Self {
            store,
            config,
            search: None,
            images: None,
        }
    }

    pub fn with_search_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    pub fn with_image_resolver(mut self, resolver: Arc<dyn ImageResolver>) -> Self {
        self.images = Some(resolver);
        self
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn backend(&self) -> QueryBackend {
        self.store.backend()
    }

    /// List entries, filtered and projected with the summary defaults.
    ///
    /// `filter_json` and `fields_json` are raw wire documents; `None` means
    /// no filter and the default selection. Search filters come back in
    /// rank order with a `relevance` key on every item.
    pub async fn list(
        &self,
        entry_type: Option<&str>,
        filter_json: Option<&str>,
        fields_json: Option<&str>,
        page: u32,
        per_page: Option<u32>,
    ) -> Result<Page<Map<String, Value>>, EngineError> {
        let spec = match filter_json {
            Some(raw) => FilterSpec::from_json(raw, &self.config.limits)?,
            None => FilterSpec::default(),
        };
        let selection = selection_or(fields_json, FieldSelectionSpec::summary)?;

        let query = match entry_type {
            Some(entry_type) => EntryQuery::for_type(entry_type),
            None => EntryQuery::new(),
        };
        let searchable = self.config.type_is_searchable(entry_type);
        let interpreter = FilterInterpreter::new(self.search.as_deref(), searchable);
        let mut source = interpreter.apply(query, &spec).await?;

        // listings need a stable order for pagination to mean anything
        if let ResultSource::Query(query) = &mut source {
            if query.order.is_empty() {
                query.order.push(OrderBy::new("id", OrderDirection::Asc)?);
            }
        }

        let is_search = matches!(source, ResultSource::Ranked(_));
        let per_page = self.config.pagination.clamp_per_page(per_page);
        let result = source.paginate(&self.store, page, per_page).await?;
        tracing::debug!(
            total = result.meta.total_items,
            page = result.meta.page,
            per_page,
            is_search,
            "list executed"
        );

        let projector = Projector::new(self.images.as_deref());
        let meta = result.meta.clone();
        let mut data = Vec::with_capacity(result.data.len());
        for scored in result.data {
            let mut item = projector.project(&scored.item, &selection)?;
            if is_search {
                item.insert(
                    "relevance".to_string(),
                    scored.relevance.map_or(Value::Null, Value::from),
                );
            }
            data.push(item);
        }
        Ok(Page { data, meta })
    }

    /// Fetch one entry by type and slug, projected with the detail
    /// defaults. `Ok(None)` when nothing matches.
    pub async fn get(
        &self,
        entry_type: &str,
        slug: &str,
        fields_json: Option<&str>,
    ) -> Result<Option<Map<String, Value>>, EngineError> {
        let selection = selection_or(fields_json, FieldSelectionSpec::detail)?;
        let query = EntryQuery::for_type(entry_type).where_equals("slug", slug);
        let Some(entry) = self.store.fetch_one(&query).await? else {
            return Ok(None);
        };
        Projector::new(self.images.as_deref())
            .project(&entry, &selection)
            .map(Some)
    }

    /// Fetch several entries of one type by slug in a single query,
    /// projected with the detail defaults. Output order follows the
    /// requested slugs; slugs that match nothing are skipped.
    pub async fn get_batch(
        &self,
        entry_type: &str,
        slugs: &[&str],
        fields_json: Option<&str>,
    ) -> Result<Vec<Map<String, Value>>, EngineError> {
        if slugs.is_empty() {
            return Err(EngineError::invalid_filter(
                "batch requires at least one slug",
            ));
        }
        let selection = selection_or(fields_json, FieldSelectionSpec::detail)?;
        let values = slugs.iter().map(|slug| FilterValue::from(*slug)).collect();
        let query = EntryQuery::for_type(entry_type).where_in("slug", values);
        let entries = self.store.fetch(&query, None).await?;

        let projector = Projector::new(self.images.as_deref());
        let mut out = Vec::with_capacity(entries.len());
        for slug in slugs {
            let Some(entry) = entries.iter().find(|entry| entry.slug == *slug) else {
                continue;
            };
            out.push(projector.project(entry, &selection)?);
        }
        Ok(out)
    }
}

fn selection_or(
    fields_json: Option<&str>,
    default: fn() -> FieldSelectionSpec,
) -> Result<FieldSelectionSpec, EngineError> {
    match fields_json {
        Some(raw) => {
            let spec = FieldSelectionSpec::from_json(raw)?;
            Ok(if spec.is_empty() { default() } else { spec })
        }
        None => Ok(default()),
    }
}
