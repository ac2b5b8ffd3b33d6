//! Decoded filters against the SQL path and the in-memory path
//!
//! Every test decodes a wire filter, runs it through the SQLite store, and
//! cross-checks the returned ids against evaluating the same predicate tree
//! over all hydrated entries. The two paths must agree on every document.

mod common;

use leafpress_engine::filter::TagFilter;
use leafpress_engine::sql::{SqlParams, SqlValue, dialect_for, lower};
use leafpress_engine::{
    EntryQuery, EntryStore, FilterLimits, FilterSpec, Predicate, QueryBackend,
};
use serde_json::{Value, json};

async fn ids_for(store: &EntryStore, filter: &Value) -> Vec<i64> {
    let spec = FilterSpec::from_value(filter, &FilterLimits::default())
        .unwrap_or_else(|e| panic!("filter {filter} rejected: {e}"));
    let mut query = EntryQuery::new();
    if let Some(root) = spec.root.clone() {
        query = query.with_predicate(root);
    }

    let mut sql_ids: Vec<i64> = store
        .fetch(&query, None)
        .await
        .expect("fetch")
        .iter()
        .map(|e| e.id)
        .collect();
    sql_ids.sort_unstable();

    let mut memory_ids: Vec<i64> = store
        .fetch(&EntryQuery::new(), None)
        .await
        .expect("fetch all")
        .iter()
        .filter(|e| query.matches(e))
        .map(|e| e.id)
        .collect();
    memory_ids.sort_unstable();

    assert_eq!(sql_ids, memory_ids, "paths disagree on {filter}");
    sql_ids
}

// =============================================================================
// Operator Coverage
// =============================================================================

#[tokio::test]
async fn test_conjunction_of_field_conditions() {
    let store = common::seeded_store().await;
    let filter = json!({
        "meta.difficulty": "beginner",
        "meta.duration": {"$gte": 60, "$lte": 90},
        "meta.rating": {"$gt": 4.0}
    });
    // entry 5 qualifies through its string-typed "4.9" rating
    assert_eq!(ids_for(&store, &filter).await, vec![1, 5]);
}

#[tokio::test]
async fn test_disjunction_of_branch_conjunctions() {
    let store = common::seeded_store().await;
    let filter = json!({
        "$or": [
            {"type": "post", "meta.difficulty": "advanced"},
            {"type": "course", "meta.rating": {"$gte": 4.5}}
        ]
    });
    assert_eq!(ids_for(&store, &filter).await, vec![2, 4, 5]);
}

#[tokio::test]
async fn test_set_membership() {
    let store = common::seeded_store().await;

    let ids = ids_for(
        &store,
        &json!({"meta.difficulty": {"$in": ["beginner", "advanced"]}}),
    )
    .await;
    assert_eq!(ids, vec![1, 2, 3, 5]);

    // $notIn still requires the key to be present
    let ids = ids_for(&store, &json!({"meta.difficulty": {"$notIn": ["beginner"]}})).await;
    assert_eq!(ids, vec![2, 4]);

    let ids = ids_for(&store, &json!({"id": {"$in": [2, 6]}})).await;
    assert_eq!(ids, vec![2, 6]);
}

#[tokio::test]
async fn test_numeric_ranges() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"meta.duration": {"$between": [60, 90]}})).await;
    assert_eq!(ids, vec![1, 4, 5]);

    // entries without the key fall outside both polarities
    let ids = ids_for(&store, &json!({"meta.duration": {"$notBetween": [60, 90]}})).await;
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_null_operators_on_columns() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"excerpt": null})).await;
    assert_eq!(ids, vec![2, 5, 6]);

    let ids = ids_for(&store, &json!({"excerpt": {"$ne": null}})).await;
    assert_eq!(ids, vec![1, 3, 4]);

    let ids = ids_for(&store, &json!({"published_at": null})).await;
    assert_eq!(ids, vec![5]);
}

#[tokio::test]
async fn test_presence_on_meta_paths() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"meta.draft": {"$exists": true}})).await;
    assert_eq!(ids, vec![1]);

    // a key holding explicit null still exists
    let ids = ids_for(&store, &json!({"meta.subtitle": {"$exists": true}})).await;
    assert_eq!(ids, vec![1]);
    let ids = ids_for(&store, &json!({"meta.subtitle": null})).await;
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    let ids = ids_for(&store, &json!({"meta.featured": {"$exists": false}})).await;
    assert_eq!(ids, vec![1, 2, 4, 5, 6]);
}

#[tokio::test]
async fn test_array_containment() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"meta.topics": {"$contains": "rust"}})).await;
    assert_eq!(ids, vec![1, 2, 4]);

    // absent arrays count as "does not contain"
    let ids = ids_for(&store, &json!({"meta.topics": {"$notContains": "rust"}})).await;
    assert_eq!(ids, vec![3, 5, 6]);
}

#[tokio::test]
async fn test_like_is_case_insensitive() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"title": {"$like": "%rust%"}})).await;
    assert_eq!(ids, vec![1, 4]);

    let ids = ids_for(&store, &json!({"slug": {"$like": "%-course"}})).await;
    assert_eq!(ids, vec![5]);
}

#[tokio::test]
async fn test_boolean_and_timestamp_columns() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"is_index": true})).await;
    assert_eq!(ids, vec![6]);

    // datetime-string operands normalize to the stored epoch representation
    let ids = ids_for(&store, &json!({"published_at": {"$gt": "2024-02-01 00:00:00"}})).await;
    assert_eq!(ids, vec![4]);
    let ids = ids_for(&store, &json!({"published_at": {"$gte": 1_706_745_600}})).await;
    assert_eq!(ids, vec![2, 4]);
}

#[tokio::test]
async fn test_tag_filters() {
    let store = common::seeded_store().await;

    let ids = ids_for(&store, &json!({"$tags": ["tutorial"]})).await;
    assert_eq!(ids, vec![1, 3]);

    let ids = ids_for(&store, &json!({"$tags": {"type": "topic", "values": ["rust"]}})).await;
    assert_eq!(ids, vec![1, 2, 4]);

    // the untyped tutorial tag is invisible to a typed filter
    let ids = ids_for(&store, &json!({"$tags": {"type": "topic", "values": ["tutorial"]}})).await;
    assert!(ids.is_empty());

    let ids = ids_for(&store, &json!({"$tags": ["rust"], "type": "course"})).await;
    assert_eq!(ids, vec![4]);
}

// =============================================================================
// Structural Properties
// =============================================================================

#[tokio::test]
async fn test_sibling_order_never_changes_results() {
    let store = common::seeded_store().await;

    let forward = json!({
        "meta.difficulty": "beginner",
        "meta.duration": {"$gte": 60, "$lte": 90},
        "meta.rating": {"$gt": 4.0}
    });
    let reversed = json!({
        "meta.rating": {"$gt": 4.0},
        "meta.duration": {"$lte": 90, "$gte": 60},
        "meta.difficulty": "beginner"
    });
    assert_eq!(
        ids_for(&store, &forward).await,
        ids_for(&store, &reversed).await
    );

    let branches = json!({"$or": [
        {"type": "post", "meta.difficulty": "advanced"},
        {"type": "course", "meta.rating": {"$gte": 4.5}}
    ]});
    let swapped = json!({"$or": [
        {"meta.rating": {"$gte": 4.5}, "type": "course"},
        {"meta.difficulty": "advanced", "type": "post"}
    ]});
    assert_eq!(
        ids_for(&store, &branches).await,
        ids_for(&store, &swapped).await
    );
}

#[tokio::test]
async fn test_same_spec_on_independent_queries() -> anyhow::Result<()> {
    let store = common::seeded_store().await;
    let spec = FilterSpec::from_value(
        &json!({"meta.duration": {"$between": [60, 90]}}),
        &FilterLimits::default(),
    )?;
    let root = spec.root.expect("predicate tree");

    let first = EntryQuery::new().with_predicate(root.clone());
    let second = EntryQuery::for_type("post").with_predicate(root);

    let first_ids: Vec<i64> = store.fetch(&first, None).await?.iter().map(|e| e.id).collect();
    let second_ids: Vec<i64> = store
        .fetch(&second, None)
        .await?
        .iter()
        .map(|e| e.id)
        .collect();

    // the tree is a value; reusing it never leaks state between queries
    assert_eq!(first_ids, vec![1, 4, 5]);
    assert_eq!(second_ids, vec![1]);
    Ok(())
}

#[tokio::test]
async fn test_empty_tag_list_matches_nothing() {
    let store = common::seeded_store().await;

    // wire shape
    let ids = ids_for(&store, &json!({"$tags": []})).await;
    assert!(ids.is_empty());

    // programmatic shape
    let query =
        EntryQuery::new().with_predicate(Predicate::AnyTag(TagFilter::Names(Vec::new())));
    let rows = store.fetch(&query, None).await.unwrap();
    assert!(rows.is_empty());

    let everything = store.fetch(&EntryQuery::new(), None).await.unwrap();
    assert_eq!(everything.len(), 6);
    assert!(everything.iter().all(|e| !query.matches(e)));
}

#[test]
fn test_operands_never_appear_in_sql_text() -> anyhow::Result<()> {
    let spec = FilterSpec::from_value(
        &json!({
            "meta.difficulty": "NEEDLE_OPERAND",
            "meta.duration": {"$gte": 424_242},
            "title": {"$like": "%NEEDLE_PATTERN%"},
            "$tags": ["NEEDLE_TAG"]
        }),
        &FilterLimits::default(),
    )?;
    let query = EntryQuery::new().with_predicate(spec.root.expect("predicate tree"));

    for backend in [QueryBackend::Sqlite, QueryBackend::Postgres] {
        let dialect = dialect_for(backend);
        let mut params = SqlParams::new();
        let sql = lower::build_select(&query, dialect, None, &mut params);

        assert!(!sql.contains("NEEDLE"), "inlined operand in: {sql}");
        assert!(!sql.contains("424242"), "inlined operand in: {sql}");
        assert!(
            params
                .values
                .contains(&SqlValue::Text("NEEDLE_OPERAND".to_string())),
            "operand missing from params for {backend:?}"
        );
        assert!(params.values.contains(&SqlValue::Int(424_242)));
        assert!(
            params
                .values
                .contains(&SqlValue::Text("NEEDLE_TAG".to_string()))
        );
    }
    Ok(())
}

#[test]
fn test_wrong_arity_operands_are_rejected() {
    let limits = FilterLimits::default();
    let cases = [
        json!({"meta.duration": {"$between": [60]}}),
        json!({"meta.duration": {"$between": "60,90"}}),
        json!({"meta.difficulty": {"$in": "beginner"}}),
        json!({"meta.difficulty": {"$in": []}}),
        json!({"meta.difficulty": {"$in": ["beginner", 2]}}),
    ];
    for case in &cases {
        let err = FilterSpec::from_value(case, &limits)
            .err()
            .unwrap_or_else(|| panic!("{case} was accepted"));
        assert!(err.is_invalid(), "unexpected error kind for {case}: {err}");
    }
}
