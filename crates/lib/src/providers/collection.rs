//! # Collection Store Trait
//!
//! The seam between the pipeline and the hosted collection service. The
//! service owns all the hard parts (indexing, vector search, generative
//! queries); the pipeline only needs the request/response operations below,
//! so everything behind this trait is swappable in tests.

use crate::errors::StoreError;
use crate::schema::CollectionSchema;
use crate::types::{Filter, GroupCount};
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;
use uuid::Uuid;

/// A document keyed for upsert: a deterministic id plus its properties.
#[derive(Debug, Clone)]
pub struct BatchObject {
    pub id: Uuid,
    pub properties: Value,
}

/// A per-item failure reported by a batch upload. Items that fail are
/// collected and surfaced, never silently dropped.
#[derive(Debug, Clone)]
pub struct BatchItemError {
    pub id: Uuid,
    pub message: String,
}

/// Operations the pipeline needs from the hosted collection service.
#[async_trait]
pub trait CollectionStore: Send + Sync + Debug + DynClone {
    /// Whether a collection with this name is already defined.
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Declares a typed collection. Fails if one of that name exists; there
    /// is no migration path, only delete-and-recreate.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), StoreError>;

    /// Drops a collection and all of its documents.
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Uploads one batch of keyed documents. An existing document with the
    /// same id is overwritten. Returns the per-item failures; an empty vec
    /// means the whole batch landed.
    async fn upsert_batch(
        &self,
        name: &str,
        objects: &[BatchObject],
    ) -> Result<Vec<BatchItemError>, StoreError>;

    /// Total number of documents in the collection.
    async fn count_objects(&self, name: &str) -> Result<u64, StoreError>;

    /// Grouped count of documents per distinct value of `field`, optionally
    /// restricted by an equality/conjunction filter.
    async fn aggregate_group_by(
        &self,
        name: &str,
        field: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<GroupCount>, StoreError>;

    /// Fetches one page of documents, projected to `fields`. Used by the
    /// flat export to walk the whole collection.
    async fn fetch_page(
        &self,
        name: &str,
        fields: &[&str],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError>;

    /// Runs a grouped generative task over the documents matching `filter`,
    /// reading only `view_fields`. The returned text is opaque model output.
    async fn generate_grouped(
        &self,
        name: &str,
        filter: Option<&Filter>,
        limit: usize,
        task: &str,
        view_fields: &[&str],
    ) -> Result<String, StoreError>;
}

dyn_clone::clone_trait_object!(CollectionStore);
