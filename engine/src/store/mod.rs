//! Entry storage
//!
//! One store speaks both backends. Statements come out of the lowering pass
//! with typed parameters; each arm binds them natively and decodes the same
//! row shapes. Tags and images are hydrated in batches after the page of
//! entries is selected, so a listing costs three statements regardless of
//! page size.

pub mod schema;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::core::config::{DatabaseConfig, QueryBackend};
use crate::core::constants::HYDRATION_BATCH_SIZE;
use crate::error::EngineError;
use crate::model::{Entry, ImageRef, Tag};
use crate::query::builder::EntryQuery;
use crate::sql::dialect::{Dialect, dialect_for};
use crate::sql::lower;
use crate::sql::params::{SqlParams, SqlValue};

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: i64,
    #[sqlx(rename = "type")]
    entry_type: String,
    title: Option<String>,
    slug: String,
    content: Option<String>,
    excerpt: Option<String>,
    #[sqlx(json)]
    meta: Map<String, Value>,
    filename: String,
    is_index: bool,
    published_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            entry_type: row.entry_type,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            meta: row.meta,
            filename: row.filename,
            is_index: row.is_index,
            published_at: row
                .published_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp(row.updated_at, 0).unwrap_or_else(Utc::now),
            tags: Vec::new(),
            images: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    entry_id: i64,
    name: String,
    #[sqlx(rename = "type")]
    kind: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    entry_id: i64,
    id: i64,
    collection: String,
    filename: String,
    path: String,
    mime_type: Option<String>,
    size: i64,
    width: i64,
    height: i64,
    #[sqlx(json)]
    custom_properties: Map<String, Value>,
}

impl From<ImageRow> for ImageRef {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.id,
            collection: row.collection,
            filename: row.filename,
            path: row.path,
            mime_type: row.mime_type,
            size: row.size,
            width: row.width,
            height: row.height,
            custom_properties: row.custom_properties,
        }
    }
}

/// Bind typed parameters onto any sqlx query builder.
macro_rules! bind_all {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in &$params.values {
            query = match value {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Text(s) => query.bind(s.clone()),
            };
        }
        query
    }};
}

// =============================================================================
// Entry Store
// =============================================================================

#[derive(Debug)]
enum StorePool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

#[derive(Debug)]
pub struct EntryStore {
    pool: StorePool,
}

impl EntryStore {
    /// Connect by URL scheme: `sqlite:` URLs get a SQLite pool, `postgres:`
    /// URLs a Postgres pool, anything else is refused.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, EngineError> {
        let url = config.url.as_str();
        let pool = if url.starts_with("sqlite:") {
            let pool = SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await
                .map_err(EngineError::sqlite)?;
            StorePool::Sqlite(pool)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await
                .map_err(EngineError::postgres)?;
            StorePool::Postgres(pool)
        } else {
            let scheme = url.split(':').next().unwrap_or(url);
            return Err(EngineError::UnsupportedDialect(scheme.to_string()));
        };
        let store = Self { pool };
        tracing::info!(backend = %store.backend(), "entry store connected");
        Ok(store)
    }

    pub fn from_sqlite(pool: SqlitePool) -> Self {
        Self {
            pool: StorePool::Sqlite(pool),
        }
    }

    pub fn from_postgres(pool: PgPool) -> Self {
        Self {
            pool: StorePool::Postgres(pool),
        }
    }

    pub fn backend(&self) -> QueryBackend {
        match &self.pool {
            StorePool::Sqlite(_) => QueryBackend::Sqlite,
            StorePool::Postgres(_) => QueryBackend::Postgres,
        }
    }

    fn dialect(&self) -> &'static dyn Dialect {
        dialect_for(self.backend())
    }

    /// Create the backing tables and indexes if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), EngineError> {
        match &self.pool {
            StorePool::Sqlite(pool) => {
                sqlx::raw_sql(schema::SQLITE_SCHEMA)
                    .execute(pool)
                    .await
                    .map_err(EngineError::sqlite)?;
            }
            StorePool::Postgres(pool) => {
                sqlx::raw_sql(schema::POSTGRES_SCHEMA)
                    .execute(pool)
                    .await
                    .map_err(EngineError::postgres)?;
            }
        }
        tracing::debug!(backend = %self.backend(), "schema ensured");
        Ok(())
    }

    /// Run the query and return fully hydrated entries.
    pub async fn fetch(
        &self,
        query: &EntryQuery,
        limit_offset: Option<(u32, u32)>,
    ) -> Result<Vec<Entry>, EngineError> {
        let mut params = SqlParams::new();
        let sql = lower::build_select(query, self.dialect(), limit_offset, &mut params);
        tracing::debug!(sql = %sql, binds = params.len(), "fetching entries");
        let rows: Vec<EntryRow> = match &self.pool {
            StorePool::Sqlite(pool) => bind_all!(sqlx::query_as(&sql), params)
                .fetch_all(pool)
                .await
                .map_err(EngineError::sqlite)?,
            StorePool::Postgres(pool) => bind_all!(sqlx::query_as(&sql), params)
                .fetch_all(pool)
                .await
                .map_err(EngineError::postgres)?,
        };
        let mut entries: Vec<Entry> = rows.into_iter().map(Entry::from).collect();
        self.hydrate(&mut entries).await?;
        Ok(entries)
    }

    /// First matching entry, hydrated.
    pub async fn fetch_one(&self, query: &EntryQuery) -> Result<Option<Entry>, EngineError> {
        Ok(self.fetch(query, Some((1, 0))).await?.into_iter().next())
    }

    pub async fn count(&self, query: &EntryQuery) -> Result<u64, EngineError> {
        let mut params = SqlParams::new();
        let sql = lower::build_count(query, self.dialect(), &mut params);
        let count: i64 = match &self.pool {
            StorePool::Sqlite(pool) => bind_all!(sqlx::query_scalar(&sql), params)
                .fetch_one(pool)
                .await
                .map_err(EngineError::sqlite)?,
            StorePool::Postgres(pool) => bind_all!(sqlx::query_scalar(&sql), params)
                .fetch_one(pool)
                .await
                .map_err(EngineError::postgres)?,
        };
        Ok(count.max(0) as u64)
    }

    async fn hydrate(&self, entries: &mut [Entry]) -> Result<(), EngineError> {
        if entries.is_empty() {
            return Ok(());
        }
        let positions: HashMap<i64, usize> = entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.id, pos))
            .collect();
        let ids: Vec<i64> = entries.iter().map(|entry| entry.id).collect();

        for chunk in ids.chunks(HYDRATION_BATCH_SIZE) {
            for tag in self.fetch_tags(chunk).await? {
                if let Some(&pos) = positions.get(&tag.entry_id) {
                    entries[pos].tags.push(Tag {
                        name: tag.name,
                        kind: tag.kind,
                    });
                }
            }
            for image in self.fetch_images(chunk).await? {
                if let Some(&pos) = positions.get(&image.entry_id) {
                    entries[pos].images.push(image.into());
                }
            }
        }
        Ok(())
    }

    async fn fetch_tags(&self, ids: &[i64]) -> Result<Vec<TagRow>, EngineError> {
        let sql = format!(
            "SELECT et.entry_id, t.name, t.type FROM entry_tag et JOIN tags t ON t.id = et.tag_id WHERE et.entry_id IN ({}) ORDER BY et.entry_id, t.name",
            self.id_placeholders(ids.len())
        );
        match &self.pool {
            StorePool::Sqlite(pool) => {
                let mut query = sqlx::query_as(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                query.fetch_all(pool).await.map_err(EngineError::sqlite)
            }
            StorePool::Postgres(pool) => {
                let mut query = sqlx::query_as(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                query.fetch_all(pool).await.map_err(EngineError::postgres)
            }
        }
    }

    async fn fetch_images(&self, ids: &[i64]) -> Result<Vec<ImageRow>, EngineError> {
        let sql = format!(
            "SELECT entry_id, id, collection, filename, path, mime_type, size, width, height, custom_properties FROM images WHERE entry_id IN ({}) ORDER BY entry_id, collection, sort_order, id",
            self.id_placeholders(ids.len())
        );
        match &self.pool {
            StorePool::Sqlite(pool) => {
                let mut query = sqlx::query_as(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                query.fetch_all(pool).await.map_err(EngineError::sqlite)
            }
            StorePool::Postgres(pool) => {
                let mut query = sqlx::query_as(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                query.fetch_all(pool).await.map_err(EngineError::postgres)
            }
        }
    }

    fn id_placeholders(&self, count: usize) -> String {
        let dialect = self.dialect();
        (1..=count)
            .map(|i| dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::builder::{OrderBy, OrderDirection};

    async fn setup_test_store() -> EntryStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let store = EntryStore::from_sqlite(pool);
        store.init_schema().await.unwrap();
        store
    }

    async fn seed(store: &EntryStore) {
        let StorePool::Sqlite(pool) = &store.pool else {
            panic!("expected sqlite pool");
        };
        sqlx::query(
            "INSERT INTO entries (type, title, slug, meta, filename, created_at, updated_at) VALUES \
             ('post', 'First', 'first', '{\"views\": 10}', 'first.md', 100, 100), \
             ('post', 'Second', 'second', '{}', 'second.md', 200, 200), \
             ('page', 'About', 'about', '{}', 'about.md', 300, 300)",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO tags (name, type) VALUES ('rust', 'topic'), ('draft', NULL)")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO entry_tag (entry_id, tag_id) VALUES (1, 1), (1, 2)")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO images (entry_id, collection, filename, path, size, width, height) \
             VALUES (1, 'cover', 'a.jpg', 'images/a.jpg', 1234, 800, 600)",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_hydrates_tags_and_images() {
        let store = setup_test_store().await;
        seed(&store).await;

        let entries = store
            .fetch(&EntryQuery::for_type("post"), None)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.slug, "first");
        assert_eq!(first.meta.get("views"), Some(&serde_json::json!(10)));
        assert_eq!(first.tag_names(), vec!["draft", "rust"]);
        assert_eq!(first.images.len(), 1);
        assert_eq!(first.images[0].collection, "cover");
        assert_eq!(first.created_at.timestamp(), 100);

        assert!(entries[1].tags.is_empty());
        assert!(entries[1].images.is_empty());
    }

    #[tokio::test]
    async fn test_count_and_pagination() {
        let store = setup_test_store().await;
        seed(&store).await;

        assert_eq!(store.count(&EntryQuery::new()).await.unwrap(), 3);
        assert_eq!(store.count(&EntryQuery::for_type("post")).await.unwrap(), 2);

        let query =
            EntryQuery::new().order_by(OrderBy::new("created_at", OrderDirection::Desc).unwrap());
        let page = store.fetch(&query, Some((2, 1))).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].slug, "second");
        assert_eq!(page[1].slug, "first");
    }

    #[tokio::test]
    async fn test_fetch_one_by_slug() {
        let store = setup_test_store().await;
        seed(&store).await;

        let entry = store
            .fetch_one(&EntryQuery::for_type("page").where_equals("slug", "about"))
            .await
            .unwrap();
        assert_eq!(entry.unwrap().title.as_deref(), Some("About"));

        let missing = store
            .fetch_one(&EntryQuery::for_type("page").where_equals("slug", "nope"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_connect_refuses_unknown_schemes() {
        let config = DatabaseConfig {
            url: "mysql://localhost/db".to_string(),
            max_connections: 1,
        };
        let err = EntryStore::connect(&config).await.unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedDialect(_)));
    }
}
