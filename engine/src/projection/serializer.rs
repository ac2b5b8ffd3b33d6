//! Entity projection
//!
//! Turns one entry into a client-facing JSON map, one selection at a
//! time. Dotted paths land in nested maps, never as literal dotted keys.
//!
//! Null handling is deliberately asymmetric: a `meta` key present with an
//! explicit null is emitted as null, while an ordinary column that
//! resolves to null (or a key that is simply absent) is omitted from the
//! output entirely.

use serde_json::{Map, Value};

use crate::core::constants::DATETIME_FORMAT;
use crate::error::EngineError;
use crate::images::{self, ImageDescriptor, ImageRenderOptions, ImageResolver};
use crate::model::Entry;
use crate::projection::cast;
use crate::projection::field::{CastDirective, FieldSelection, FieldSelectionSpec};

pub struct Projector<'a> {
    images: Option<&'a dyn ImageResolver>,
}

impl<'a> Projector<'a> {
    pub fn new(images: Option<&'a dyn ImageResolver>) -> Self {
        Self { images }
    }

    /// Project one entry through a field selection.
    pub fn project(
        &self,
        entry: &Entry,
        spec: &FieldSelectionSpec,
    ) -> Result<Map<String, Value>, EngineError> {
        let mut out = Map::new();
        for selection in &spec.fields {
            if let Some(value) = self.resolve(entry, selection)? {
                set_path(&mut out, &selection.path, value);
            }
        }
        Ok(out)
    }

    fn resolve(
        &self,
        entry: &Entry,
        selection: &FieldSelection,
    ) -> Result<Option<Value>, EngineError> {
        let path = selection.path.as_str();
        if let Some(rest) = path.strip_prefix("meta.") {
            return self.meta_path(entry, rest, &selection.cast);
        }
        if let Some(collection) = path.strip_prefix("images.") {
            let options = render_options(&selection.cast)?;
            return Ok(self
                .collection_descriptors(entry, collection, &options)
                .into_iter()
                .next()
                .map(ImageDescriptor::into_json));
        }
        match path {
            "tags" => Ok(Some(Value::Array(
                entry.tag_names().into_iter().map(Value::String).collect(),
            ))),
            "images" => self.image_groups(entry, &selection.cast).map(Some),
            "meta" => self.whole_meta(entry, &selection.cast).map(Some),
            _ => self.column(entry, path, &selection.cast),
        }
    }

    fn meta_path(
        &self,
        entry: &Entry,
        rest: &str,
        cast: &CastDirective,
    ) -> Result<Option<Value>, EngineError> {
        let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
        match entry.meta_value(&segments) {
            None => Ok(None),
            // present-but-null survives, absent does not
            Some(Value::Null) => Ok(Some(Value::Null)),
            Some(value) => cast::apply(cast, value.clone()).map(Some),
        }
    }

    /// Bare `meta` yields the whole document; with a shape directive it
    /// becomes a sub-selection of key paths, each with its own cast.
    fn whole_meta(&self, entry: &Entry, cast: &CastDirective) -> Result<Value, EngineError> {
        let CastDirective::Shape(keys) = cast else {
            return Ok(Value::Object(entry.meta.clone()));
        };
        let mut out = Map::new();
        for (key, directive) in keys {
            let cast = FieldSelectionSpec::directive(key, directive)?;
            if let Some(value) = self.meta_path(entry, key, &cast)? {
                set_path(&mut out, key, value);
            }
        }
        Ok(Value::Object(out))
    }

    /// Bare `images` yields every collection in stored order, keyed by
    /// collection name.
    fn image_groups(&self, entry: &Entry, cast: &CastDirective) -> Result<Value, EngineError> {
        let options = render_options(cast)?;
        let mut groups = Map::new();
        for collection in entry.image_collections() {
            let descriptors: Vec<Value> = self
                .collection_descriptors(entry, collection, &options)
                .into_iter()
                .map(ImageDescriptor::into_json)
                .collect();
            if !descriptors.is_empty() {
                groups.insert(collection.to_string(), Value::Array(descriptors));
            }
        }
        Ok(Value::Object(groups))
    }

    fn collection_descriptors(
        &self,
        entry: &Entry,
        collection: &str,
        options: &ImageRenderOptions,
    ) -> Vec<ImageDescriptor> {
        match self.images {
            Some(resolver) => resolver.resolve_collection(entry, collection, options),
            None => entry
                .images_in(collection)
                .into_iter()
                .map(images::basic_descriptor)
                .collect(),
        }
    }

    fn column(
        &self,
        entry: &Entry,
        column: &str,
        cast: &CastDirective,
    ) -> Result<Option<Value>, EngineError> {
        let resolved = match column {
            "published_at" => entry.published_at.map(|dt| format_datetime_value(&dt)),
            "created_at" => Some(format_datetime_value(&entry.created_at)),
            "updated_at" => Some(format_datetime_value(&entry.updated_at)),
            _ => entry.column_value(column),
        };
        match resolved {
            None => Ok(None),
            Some(value) => cast::apply(cast, value).map(Some),
        }
    }
}

fn format_datetime_value(dt: &chrono::DateTime<chrono::Utc>) -> Value {
    Value::String(dt.format(DATETIME_FORMAT).to_string())
}

fn render_options(cast: &CastDirective) -> Result<ImageRenderOptions, EngineError> {
    match cast {
        CastDirective::Shape(map) => serde_json::from_value(Value::Object(map.clone()))
            .map_err(|e| EngineError::invalid_cast(format!("invalid image options: {e}"))),
        _ => Ok(ImageRenderOptions::default()),
    }
}

/// Write `value` at a dotted path, materializing intermediate maps. A
/// non-map intermediate is replaced, matching last-write-wins ordering
/// across selections.
fn set_path(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                set_path(map, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageRef, Tag};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn entry() -> Entry {
        Entry {
            id: 1,
            entry_type: "post".to_string(),
            title: Some("Filtering deeply".to_string()),
            slug: "filtering-deeply".to_string(),
            content: Some("body text".to_string()),
            excerpt: None,
            meta: object(json!({
                "views": "1000",
                "rating": "4.5",
                "subtitle": null,
                "author": {"name": "Ada", "links": {"site": "https://example.org"}}
            })),
            filename: "filtering-deeply.md".to_string(),
            is_index: false,
            published_at: DateTime::<Utc>::from_timestamp(1_704_067_200, 0),
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now),
            updated_at: DateTime::<Utc>::from_timestamp(1_700_000_100, 0).unwrap_or_else(Utc::now),
            tags: vec![
                Tag {
                    name: "rust".to_string(),
                    kind: Some("topic".to_string()),
                },
                Tag {
                    name: "draft".to_string(),
                    kind: None,
                },
            ],
            images: vec![
                ImageRef {
                    id: 11,
                    collection: "hero".to_string(),
                    filename: "a.jpg".to_string(),
                    path: "/media/11/a.jpg".to_string(),
                    mime_type: Some("image/jpeg".to_string()),
                    size: 1000,
                    width: 200,
                    height: 100,
                    custom_properties: Map::new(),
                },
                ImageRef {
                    id: 12,
                    collection: "gallery".to_string(),
                    filename: "b.jpg".to_string(),
                    path: "/media/12/b.jpg".to_string(),
                    mime_type: Some("image/jpeg".to_string()),
                    size: 1000,
                    width: 300,
                    height: 300,
                    custom_properties: Map::new(),
                },
            ],
        }
    }

    fn project(entry: &Entry, selection: Value) -> Map<String, Value> {
        let spec = FieldSelectionSpec::from_value(&selection).unwrap();
        Projector::new(None).project(entry, &spec).unwrap()
    }

    #[test]
    fn test_casts_build_typed_nested_output() {
        let out = project(
            &entry(),
            json!(["id", ["meta.views", "integer"], ["meta.rating", "float"]]),
        );
        assert_eq!(
            Value::Object(out),
            json!({"id": 1, "meta": {"views": 1000, "rating": 4.5}})
        );
    }

    #[test]
    fn test_null_asymmetry() {
        let out = project(&entry(), json!(["excerpt", "meta.subtitle", "meta.missing"]));
        // explicit null under meta survives; null column and absent key do not
        assert_eq!(Value::Object(out), json!({"meta": {"subtitle": null}}));
    }

    #[test]
    fn test_deep_meta_paths_nest() {
        let out = project(&entry(), json!(["meta.author.name", "meta.author.links.site"]));
        assert_eq!(
            Value::Object(out),
            json!({"meta": {"author": {"name": "Ada", "links": {"site": "https://example.org"}}}})
        );
    }

    #[test]
    fn test_tags_project_as_names() {
        let out = project(&entry(), json!(["tags"]));
        assert_eq!(Value::Object(out), json!({"tags": ["rust", "draft"]}));
    }

    #[test]
    fn test_timestamps_format_and_cast() {
        let out = project(&entry(), json!(["published_at", ["created_at", "date"]]));
        assert_eq!(
            Value::Object(out),
            json!({
                "published_at": "2024-01-01 00:00:00",
                "created_at": "2023-11-14"
            })
        );
    }

    #[test]
    fn test_unpublished_entry_omits_published_at() {
        let mut unpublished = entry();
        unpublished.published_at = None;
        let out = project(&unpublished, json!(["id", "published_at"]));
        assert_eq!(Value::Object(out), json!({"id": 1}));
    }

    #[test]
    fn test_whole_meta_and_sub_selection() {
        let out = project(&entry(), json!(["meta"]));
        assert_eq!(out["meta"]["views"], json!("1000"));

        let out = project(
            &entry(),
            json!([["meta", {"views": "int", "author.name": null}]]),
        );
        assert_eq!(
            Value::Object(out),
            json!({"meta": {"views": 1000, "author": {"name": "Ada"}}})
        );
    }

    #[test]
    fn test_images_fall_back_to_stored_rows() {
        let out = project(&entry(), json!(["images"]));
        let hero = &out["images"]["hero"];
        assert_eq!(hero[0]["id"], json!(11));
        assert_eq!(hero[0]["url"], json!("/media/11/a.jpg"));
        assert_eq!(out["images"]["gallery"][0]["id"], json!(12));

        let out = project(&entry(), json!(["images.hero"]));
        assert_eq!(out["images"]["hero"]["id"], json!(11));

        let out = project(&entry(), json!(["images.missing", "id"]));
        assert_eq!(Value::Object(out), json!({"id": 1}));
    }

    #[test]
    fn test_resolver_receives_parsed_options() {
        struct TestResolver;
        impl ImageResolver for TestResolver {
            fn resolve_collection(
                &self,
                entry: &Entry,
                collection: &str,
                options: &ImageRenderOptions,
            ) -> Vec<ImageDescriptor> {
                entry
                    .images_in(collection)
                    .into_iter()
                    .map(|img| ImageDescriptor {
                        id: img.id,
                        url: format!("https://cdn.test{}", img.path),
                        html: format!("<img sizes=\"{}\">", options.sizes.join(", ")),
                        meta: Map::new(),
                    })
                    .collect()
            }
        }

        let spec = FieldSelectionSpec::from_value(&json!([
            ["images.hero", {"sizes": ["50vw", "100vw"], "fluid": false}]
        ]))
        .unwrap();
        let out = Projector::new(Some(&TestResolver))
            .project(&entry(), &spec)
            .unwrap();
        assert_eq!(out["images"]["hero"]["url"], json!("https://cdn.test/media/11/a.jpg"));
        assert_eq!(out["images"]["hero"]["html"], json!("<img sizes=\"50vw, 100vw\">"));
    }

    #[test]
    fn test_summary_defaults_skip_heavy_fields() {
        let out = Projector::new(None)
            .project(&entry(), &FieldSelectionSpec::summary())
            .unwrap();
        assert!(out.contains_key("id"));
        assert!(out.contains_key("tags"));
        assert!(!out.contains_key("content"));
        assert!(!out.contains_key("meta"));

        let out = Projector::new(None)
            .project(&entry(), &FieldSelectionSpec::detail())
            .unwrap();
        assert!(out.contains_key("content"));
        assert!(out.contains_key("meta"));
    }

    #[test]
    fn test_unknown_columns_are_omitted() {
        let out = project(&entry(), json!(["id", "nonexistent"]));
        assert_eq!(Value::Object(out), json!({"id": 1}));
    }

    #[test]
    fn test_transform_cast_runs() {
        let spec = FieldSelectionSpec::default()
            .with_transform("title", |v| json!(v.as_str().unwrap_or("").to_uppercase()));
        let out = Projector::new(None).project(&entry(), &spec).unwrap();
        assert_eq!(out["title"], json!("FILTERING DEEPLY"));
    }

    #[test]
    fn test_bad_image_options_fail() {
        let err = project_err(json!([["images.hero", {"sizes": 42}]]));
        assert!(matches!(err, EngineError::InvalidCast(_)), "{err}");
    }

    fn project_err(selection: Value) -> EngineError {
        let spec = FieldSelectionSpec::from_value(&selection).unwrap();
        Projector::new(None).project(&entry(), &spec).unwrap_err()
    }
}
