//! Shared fixture: an in-memory store seeded with a small content set
//!
//! Six entries across three types, with meta documents shaped to exercise
//! string/number coercion, presence checks, and array containment:
//!
//!   1 post   intro-to-rust    beginner  60min  4.2  draft, null subtitle
//!   2 post   advanced-traits  advanced  120min 4.8
//!   3 post   css-layout       beginner  45min  3.9
//!   4 course rust-workshop    intermediate 90min 4.5
//!   5 course sql-course       beginner  75min  "4.9" (string), unpublished
//!   6 page   about            empty meta, index page
#![allow(dead_code)]

use leafpress_engine::EntryStore;
use serde_json::{Value, json};
use sqlx::SqlitePool;

/// Route engine events through the test harness. `RUST_LOG=leafpress_engine=debug`
/// shows the compiled SQL for failing cases.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub async fn seeded_store() -> EntryStore {
    init_tracing();
    let pool = SqlitePool::connect(":memory:").await.expect("connect sqlite");
    let store = EntryStore::from_sqlite(pool.clone());
    store.init_schema().await.expect("apply schema");
    seed(&pool).await;
    store
}

async fn seed(pool: &SqlitePool) {
    insert_entry(
        pool,
        1,
        "post",
        "Intro to Rust",
        "intro-to-rust",
        Some("Ownership from first principles."),
        Some("Start here."),
        json!({
            "difficulty": "beginner",
            "duration": 60,
            "rating": 4.2,
            "views": "1000",
            "subtitle": null,
            "draft": true,
            "topics": ["rust", "basics"]
        }),
        false,
        Some(1_704_844_800),
        1000,
    )
    .await;
    insert_entry(
        pool,
        2,
        "post",
        "Advanced Traits",
        "advanced-traits",
        Some("Coherence, blankets, and you."),
        None,
        json!({
            "difficulty": "advanced",
            "duration": 120,
            "rating": 4.8,
            "views": 2500,
            "topics": ["rust", "traits"]
        }),
        false,
        Some(1_706_745_600),
        2000,
    )
    .await;
    insert_entry(
        pool,
        3,
        "post",
        "CSS Layout",
        "css-layout",
        Some("Boxes all the way down."),
        Some("Boxes."),
        json!({
            "difficulty": "beginner",
            "duration": 45,
            "rating": 3.9,
            "views": 800,
            "featured": false,
            "topics": ["css"]
        }),
        false,
        Some(1_702_598_400),
        3000,
    )
    .await;
    insert_entry(
        pool,
        4,
        "course",
        "Rust Workshop",
        "rust-workshop",
        Some("Two days, one borrow checker."),
        Some("Hands on."),
        json!({
            "difficulty": "intermediate",
            "duration": 90,
            "rating": 4.5,
            "views": 5000,
            "topics": ["rust"]
        }),
        false,
        Some(1_709_251_200),
        4000,
    )
    .await;
    insert_entry(
        pool,
        5,
        "course",
        "SQL Course",
        "sql-course",
        Some("Joins without fear."),
        None,
        json!({
            "difficulty": "beginner",
            "duration": 75,
            "rating": "4.9",
            "views": 120,
            "topics": ["sql", "db"]
        }),
        false,
        None,
        5000,
    )
    .await;
    insert_entry(
        pool,
        6,
        "page",
        "About",
        "about",
        None,
        None,
        json!({}),
        true,
        Some(1_704_412_800),
        6000,
    )
    .await;

    insert_tag(pool, 1, "rust", Some("topic")).await;
    insert_tag(pool, 2, "tutorial", None).await;
    insert_tag(pool, 3, "css", Some("topic")).await;
    insert_tag(pool, 4, "sql", Some("topic")).await;
    for (entry_id, tag_id) in [(1, 1), (1, 2), (2, 1), (3, 3), (3, 2), (4, 1), (5, 4)] {
        sqlx::query("INSERT INTO entry_tag (entry_id, tag_id) VALUES (?, ?)")
            .bind(entry_id)
            .bind(tag_id)
            .execute(pool)
            .await
            .expect("link tag");
    }

    insert_image(pool, 1, 1, "hero", "rust.jpg", 1600, 900, json!({"alt": "Rust logo"})).await;
    insert_image(pool, 2, 1, "gallery", "shot.jpg", 800, 600, json!({})).await;
    insert_image(pool, 3, 4, "hero", "workshop.jpg", 1200, 800, json!({})).await;
}

#[allow(clippy::too_many_arguments)]
async fn insert_entry(
    pool: &SqlitePool,
    id: i64,
    entry_type: &str,
    title: &str,
    slug: &str,
    content: Option<&str>,
    excerpt: Option<&str>,
    meta: Value,
    is_index: bool,
    published_at: Option<i64>,
    stamp: i64,
) {
    sqlx::query(
        "INSERT INTO entries (id, type, title, slug, content, excerpt, meta, filename, is_index, published_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(entry_type)
    .bind(title)
    .bind(slug)
    .bind(content)
    .bind(excerpt)
    .bind(meta.to_string())
    .bind(format!("{slug}.md"))
    .bind(is_index)
    .bind(published_at)
    .bind(stamp)
    .bind(stamp)
    .execute(pool)
    .await
    .expect("insert entry");
}

async fn insert_tag(pool: &SqlitePool, id: i64, name: &str, kind: Option<&str>) {
    sqlx::query("INSERT INTO tags (id, name, type) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(kind)
        .execute(pool)
        .await
        .expect("insert tag");
}

async fn insert_image(
    pool: &SqlitePool,
    id: i64,
    entry_id: i64,
    collection: &str,
    filename: &str,
    width: i64,
    height: i64,
    custom: Value,
) {
    sqlx::query(
        "INSERT INTO images (id, entry_id, collection, filename, path, mime_type, size, width, height, sort_order, custom_properties) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(id)
    .bind(entry_id)
    .bind(collection)
    .bind(filename)
    .bind(format!("/media/{id}/{filename}"))
    .bind("image/jpeg")
    .bind(34_000_i64)
    .bind(width)
    .bind(height)
    .bind(custom.to_string())
    .execute(pool)
    .await
    .expect("insert image");
}
