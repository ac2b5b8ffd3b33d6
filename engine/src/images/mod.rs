//! Image resolution seam
//!
//! Projection expands `images` selections into descriptors carrying a URL,
//! rendered markup, and derived metadata. Producing those (responsive
//! variants, CDN URLs, srcset markup) is host-application work behind the
//! `ImageResolver` trait; without a resolver the engine falls back to
//! plain descriptors built from the stored image rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Entry, ImageRef};

/// Rendering options accepted on an image field selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRenderOptions {
    #[serde(default = "default_sizes")]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default = "default_fluid")]
    pub fluid: bool,
    #[serde(default)]
    pub display_size: Option<[u32; 2]>,
}

impl Default for ImageRenderOptions {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            attributes: Map::new(),
            fluid: default_fluid(),
            display_size: None,
        }
    }
}

fn default_sizes() -> Vec<String> {
    vec!["100vw".to_string()]
}

fn default_fluid() -> bool {
    true
}

/// One expanded image, ready for client output.
#[derive(Debug, Clone, Serialize)]
pub struct ImageDescriptor {
    pub id: i64,
    pub url: String,
    pub html: String,
    pub meta: Map<String, Value>,
}

impl ImageDescriptor {
    pub fn into_json(self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(self.id));
        map.insert("url".to_string(), Value::String(self.url));
        map.insert("html".to_string(), Value::String(self.html));
        map.insert("meta".to_string(), Value::Object(self.meta));
        Value::Object(map)
    }
}

/// Host-application hook that turns stored image rows into descriptors.
pub trait ImageResolver: Send + Sync {
    /// Expand every image in `collection` on `entry`, in stored order.
    fn resolve_collection(
        &self,
        entry: &Entry,
        collection: &str,
        options: &ImageRenderOptions,
    ) -> Vec<ImageDescriptor>;
}

/// Descriptor built straight from a stored row, used when no resolver is
/// configured. The URL is the stored path and the markup is a bare tag;
/// dimensional metadata is merged into the custom properties without
/// overwriting anything the row already carries.
pub fn basic_descriptor(image: &ImageRef) -> ImageDescriptor {
    let mut meta = image.custom_properties.clone();
    if image.width > 0 {
        meta.entry("width".to_string())
            .or_insert_with(|| Value::from(image.width));
    }
    if image.height > 0 {
        meta.entry("height".to_string())
            .or_insert_with(|| Value::from(image.height));
        if image.width > 0 {
            let ratio = image.width as f64 / image.height as f64;
            meta.entry("aspect_ratio".to_string())
                .or_insert_with(|| Value::from((ratio * 10_000.0).round() / 10_000.0));
        }
    }
    let alt = meta
        .get("alt")
        .and_then(Value::as_str)
        .unwrap_or_default();
    ImageDescriptor {
        id: image.id,
        url: image.path.clone(),
        html: format!("<img src=\"{}\" alt=\"{}\">", image.path, alt),
        meta,
    }
}
