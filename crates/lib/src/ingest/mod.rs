//! # Ingestion Pipeline
//!
//! Turns loaded forum threads into keyed documents in the hosted collection:
//! declares the collection schema (drop-and-recreate only, never migrated),
//! derives a deterministic id per thread so re-ingestion overwrites instead
//! of duplicating, caps the conversation text for indexing while keeping the
//! uncapped copy, and uploads in fixed-size batches with per-item failures
//! collected rather than aborting the batch.

pub mod loader;

pub use loader::{load_threads, LoadError};

use crate::errors::StoreError;
use crate::providers::collection::{BatchItemError, BatchObject, CollectionStore};
use crate::schema::CollectionSchema;
use crate::types::ForumThread;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Conversations longer than this many characters are capped for indexing.
pub const CONVERSATION_CAP: usize = 20_000;
/// Characters kept from the head of an over-cap conversation.
const CAP_HEAD: usize = 10_000;
/// Characters kept from the tail of an over-cap conversation.
const CAP_TAIL: usize = 10_000;
/// Default number of documents per upload batch.
pub const DEFAULT_BATCH_SIZE: usize = 200;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Collection '{0}' already exists and replacement was declined")]
    SchemaConflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
}

/// Derives the storage id for a thread from its topic id.
///
/// The id is a UUIDv5 of the decimal topic id, so the same source row always
/// maps to the same document and a re-run overwrites rather than appends.
pub fn thread_object_id(topic_id: i64) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, topic_id.to_string().as_bytes())
}

/// Caps a conversation for indexing: text over [`CONVERSATION_CAP`] characters
/// becomes the first 10,000 characters, an ellipsis, and the last 10,000.
/// At or below the cap the text is returned unchanged, so the capped field is
/// always a pure function of the full one.
pub fn cap_conversation(full: &str) -> String {
    let char_count = full.chars().count();
    if char_count <= CONVERSATION_CAP {
        return full.to_string();
    }
    let head: String = full.chars().take(CAP_HEAD).collect();
    let tail: String = full.chars().skip(char_count - CAP_TAIL).collect();
    format!("{head}...{tail}")
}

/// Renders a thread into the stored property map, applying the conversation
/// cap and keeping the uncapped text in `conversation_full`.
pub fn thread_properties(thread: &ForumThread) -> serde_json::Value {
    json!({
        "user_id": thread.user_id,
        "conversation": cap_conversation(&thread.conversation),
        "conversation_full": thread.conversation,
        "date_created": thread.date_created.to_rfc3339(),
        "has_accepted_answer": thread.has_accepted_answer,
        "title": thread.title,
        "topic_id": thread.topic_id,
    })
}

/// What `ensure_collection` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created,
    Replaced,
}

/// Idempotently declares the collection.
///
/// If a collection of the same name exists it is only dropped and recreated
/// when `replace_existing` is set; the interactive confirmation lives with
/// the caller. Declining yields [`IngestError::SchemaConflict`] with no side
/// effects.
pub async fn ensure_collection(
    store: &dyn CollectionStore,
    schema: &CollectionSchema,
    replace_existing: bool,
) -> Result<SchemaOutcome, IngestError> {
    let exists = store.collection_exists(&schema.name).await?;
    if exists {
        if !replace_existing {
            return Err(IngestError::SchemaConflict(schema.name.clone()));
        }
        warn!(
            "[ingest] Replacing existing collection '{}' (all documents dropped)",
            schema.name
        );
        store.delete_collection(&schema.name).await?;
        store.create_collection(schema).await?;
        return Ok(SchemaOutcome::Replaced);
    }
    store.create_collection(schema).await?;
    Ok(SchemaOutcome::Created)
}

/// Summary of a batched upload run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Number of threads submitted.
    pub attempted: usize,
    /// Number of batches sent.
    pub batches: usize,
    /// Per-item failures, in submission order.
    pub failures: Vec<BatchItemError>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }
}

/// Uploads threads to the collection in fixed-size batches.
///
/// Every thread is keyed via [`thread_object_id`], so upload order is
/// irrelevant and re-running the ingestion leaves the document count
/// unchanged. Item failures within a batch are collected into the report;
/// only transport or service-level errors abort the run.
pub async fn upsert_threads(
    store: &dyn CollectionStore,
    collection: &str,
    threads: &[ForumThread],
    batch_size: usize,
) -> Result<IngestReport, IngestError> {
    if batch_size == 0 {
        return Err(IngestError::InvalidBatchSize);
    }

    let mut report = IngestReport {
        attempted: threads.len(),
        ..Default::default()
    };

    for chunk in threads.chunks(batch_size) {
        let objects: Vec<BatchObject> = chunk
            .iter()
            .map(|thread| BatchObject {
                id: thread_object_id(thread.topic_id),
                properties: thread_properties(thread),
            })
            .collect();

        let failures = store.upsert_batch(collection, &objects).await?;
        report.batches += 1;
        if !failures.is_empty() {
            warn!(
                "[ingest] Batch {} had {} failed objects",
                report.batches,
                failures.len()
            );
            report.failures.extend(failures);
        }
    }

    info!(
        "[ingest] Uploaded {} of {} threads in {} batches",
        report.succeeded(),
        report.attempted,
        report.batches
    );
    Ok(report)
}
