//! Content entry domain types
//!
//! Entries are produced by an out-of-band sync pipeline and are read-only
//! from the engine's perspective.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

// =============================================================================
// Entry
// =============================================================================

/// A content entry with its typed columns, JSON metadata document, and
/// hydrated tag/image relations.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: i64,
    pub entry_type: String,
    pub title: Option<String>,
    pub slug: String,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    /// Arbitrary-depth JSON document. Always an object at the top level.
    pub meta: Map<String, Value>,
    pub filename: String,
    pub is_index: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub images: Vec<ImageRef>,
}

impl Entry {
    /// Look up a nested key inside `meta`.
    ///
    /// Returns `Some(&Value::Null)` when the key is present with an explicit
    /// JSON null, `None` when any path segment is absent. Callers rely on
    /// that distinction.
    pub fn meta_value(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.meta.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Resolve a direct column to a JSON value for in-memory evaluation.
    ///
    /// Temporal columns resolve to epoch seconds, matching how they are
    /// stored and compared in SQL. `None` means SQL NULL.
    pub fn column_value(&self, column: &str) -> Option<Value> {
        match column {
            "id" => Some(Value::from(self.id)),
            "type" => Some(Value::from(self.entry_type.clone())),
            "title" => self.title.clone().map(Value::from),
            "slug" => Some(Value::from(self.slug.clone())),
            "content" => self.content.clone().map(Value::from),
            "excerpt" => self.excerpt.clone().map(Value::from),
            "filename" => Some(Value::from(self.filename.clone())),
            "is_index" => Some(Value::from(self.is_index)),
            "published_at" => self.published_at.map(|dt| Value::from(dt.timestamp())),
            "created_at" => Some(Value::from(self.created_at.timestamp())),
            "updated_at" => Some(Value::from(self.updated_at.timestamp())),
            _ => None,
        }
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Whether the entry carries at least one of the named tags, optionally
    /// constrained to a tag type.
    pub fn has_any_tag(&self, names: &[String], kind: Option<&str>) -> bool {
        self.tags.iter().any(|tag| {
            let kind_matches = match kind {
                Some(k) => tag.kind.as_deref() == Some(k),
                None => true,
            };
            kind_matches && names.iter().any(|n| n == &tag.name)
        })
    }

    /// Images belonging to a named collection, in stored order.
    pub fn images_in(&self, collection: &str) -> Vec<&ImageRef> {
        self.images
            .iter()
            .filter(|img| img.collection == collection)
            .collect()
    }

    /// Distinct image collection names in first-seen order.
    pub fn image_collections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for img in &self.images {
            if !seen.contains(&img.collection.as_str()) {
                seen.push(&img.collection);
            }
        }
        seen
    }
}

// =============================================================================
// Tag
// =============================================================================

/// A named label attached to entries, optionally namespaced by a type
/// (wire name `type`, e.g. `category` or `topic`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub kind: Option<String>,
}

// =============================================================================
// Image Reference
// =============================================================================

/// A stored image row belonging to an entry's named collection.
/// URL and markup generation happen in the external image resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub id: i64,
    pub collection: String,
    pub filename: String,
    pub path: String,
    pub mime_type: Option<String>,
    pub size: i64,
    pub width: i64,
    pub height: i64,
    pub custom_properties: Map<String, Value>,
}
