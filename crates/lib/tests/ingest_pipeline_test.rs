//! # Ingestion Pipeline Tests
//!
//! Deterministic keying, the conversation cap, idempotent re-ingestion, the
//! schema conflict path, and partial batch failures.

mod common;

use chrono::Utc;
use common::{setup_tracing, MockCollectionStore};
use forumlens::ingest::{
    cap_conversation, ensure_collection, thread_object_id, thread_properties, upsert_threads,
    IngestError, SchemaOutcome, CONVERSATION_CAP,
};
use forumlens::providers::collection::CollectionStore;
use forumlens::schema::{forum_post_schema, SchemaVersion};
use forumlens::types::ForumThread;

fn thread(topic_id: i64, conversation: &str) -> ForumThread {
    ForumThread {
        topic_id,
        user_id: 100 + topic_id,
        title: format!("Thread {topic_id}"),
        conversation: conversation.to_string(),
        date_created: Utc::now(),
        has_accepted_answer: topic_id % 2 == 0,
    }
}

#[test]
fn test_thread_object_id_is_deterministic() {
    assert_eq!(thread_object_id(12345), thread_object_id(12345));
    assert_ne!(thread_object_id(12345), thread_object_id(12346));
}

#[test]
fn test_cap_conversation_below_threshold_is_identity() {
    let text = "a".repeat(CONVERSATION_CAP);
    assert_eq!(cap_conversation(&text), text);
    assert_eq!(cap_conversation("short"), "short");
}

#[test]
fn test_cap_conversation_over_threshold() {
    // 25,000 chars: first 10,000 'h', then 5,000 'm', then 10,000 't'.
    let text = format!("{}{}{}", "h".repeat(10_000), "m".repeat(5_000), "t".repeat(10_000));
    let capped = cap_conversation(&text);

    assert_eq!(capped.chars().count(), 20_003);
    let expected = format!("{}...{}", "h".repeat(10_000), "t".repeat(10_000));
    assert_eq!(capped, expected);
}

#[test]
fn test_cap_conversation_counts_characters_not_bytes() {
    // Multi-byte characters must not be split.
    let text = "é".repeat(CONVERSATION_CAP + 100);
    let capped = cap_conversation(&text);
    assert_eq!(capped.chars().count(), 20_003);
}

#[test]
fn test_thread_properties_keeps_full_conversation() {
    let long = "x".repeat(25_000);
    let properties = thread_properties(&thread(1, &long));

    let capped = properties["conversation"].as_str().unwrap();
    let full = properties["conversation_full"].as_str().unwrap();
    assert_eq!(capped.chars().count(), 20_003);
    assert_eq!(full.chars().count(), 25_000);
    assert_eq!(properties["topic_id"], 1);
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    setup_tracing();
    let store = MockCollectionStore::new();
    let threads = vec![thread(1, "a"), thread(2, "b"), thread(3, "c")];

    let report = upsert_threads(&store, "ForumPost", &threads, 200).await.unwrap();
    assert_eq!(report.attempted, 3);
    assert!(report.failures.is_empty());
    assert_eq!(store.object_count(), 3);
    let first_ids = store.stored_ids();

    // Same threads again: same keys, same count, nothing duplicated.
    upsert_threads(&store, "ForumPost", &threads, 200).await.unwrap();
    assert_eq!(store.object_count(), 3);
    assert_eq!(store.stored_ids(), first_ids);

    for t in &threads {
        assert!(first_ids.contains(&thread_object_id(t.topic_id)));
    }
}

#[tokio::test]
async fn test_upsert_respects_batch_size() {
    setup_tracing();
    let store = MockCollectionStore::new();
    let threads: Vec<ForumThread> = (1..=5).map(|i| thread(i, "c")).collect();

    let report = upsert_threads(&store, "ForumPost", &threads, 2).await.unwrap();
    assert_eq!(report.batches, 3);
    assert_eq!(*store.batch_calls.read().unwrap(), 3);
    assert_eq!(store.object_count(), 5);
}

#[tokio::test]
async fn test_partial_batch_failure_is_collected_not_fatal() {
    setup_tracing();
    let store = MockCollectionStore::new();
    let threads: Vec<ForumThread> = (1..=4).map(|i| thread(i, "c")).collect();
    store
        .failing_ids
        .write()
        .unwrap()
        .push(thread_object_id(3));

    let report = upsert_threads(&store, "ForumPost", &threads, 2).await.unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, thread_object_id(3));
    assert_eq!(report.failures[0].message, "invalid properties");
    // The rest of the batch still landed.
    assert_eq!(store.object_count(), 3);
}

#[tokio::test]
async fn test_zero_batch_size_is_rejected() {
    let store = MockCollectionStore::new();
    let result = upsert_threads(&store, "ForumPost", &[thread(1, "c")], 0).await;
    assert!(matches!(result, Err(IngestError::InvalidBatchSize)));
}

#[tokio::test]
async fn test_ensure_collection_requires_confirmation_to_replace() {
    setup_tracing();
    let store = MockCollectionStore::new();
    store
        .objects
        .write()
        .unwrap()
        .insert(thread_object_id(1), serde_json::json!({"topic_id": 1}));
    let schema = forum_post_schema("ForumPost", SchemaVersion::CappedConversation);

    // The mock reports the collection as existing, so declining must fail
    // without touching it.
    let declined = ensure_collection(&store, &schema, false).await;
    assert!(matches!(declined, Err(IngestError::SchemaConflict(name)) if name == "ForumPost"));
    assert_eq!(store.object_count(), 1);

    // Confirming drops and recreates.
    let outcome = ensure_collection(&store, &schema, true).await.unwrap();
    assert_eq!(outcome, SchemaOutcome::Replaced);
    assert_eq!(store.object_count(), 0);
}

#[tokio::test]
async fn test_count_matches_after_ingestion() {
    let store = MockCollectionStore::new();
    let threads: Vec<ForumThread> = (1..=3).map(|i| thread(i, "c")).collect();
    upsert_threads(&store, "ForumPost", &threads, 200).await.unwrap();
    assert_eq!(store.count_objects("ForumPost").await.unwrap(), 3);
}
