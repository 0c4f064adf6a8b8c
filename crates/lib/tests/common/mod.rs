#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the integration tests: tracing setup plus an in-memory
//! [`CollectionStore`] so pipeline logic can be exercised without a mock HTTP
//! server.

use async_trait::async_trait;
use forumlens::errors::StoreError;
use forumlens::providers::collection::{BatchItemError, BatchObject, CollectionStore};
use forumlens::schema::CollectionSchema;
use forumlens::types::{Filter, GroupCount};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Once, RwLock};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

/// An in-memory collection keyed by object id, mirroring the overwrite
/// semantics of the hosted service. Ids that appear in `failing_ids` are
/// rejected per-item, the way a real batch response reports them.
#[derive(Clone, Debug, Default)]
pub struct MockCollectionStore {
    pub objects: Arc<RwLock<BTreeMap<Uuid, Value>>>,
    pub failing_ids: Arc<RwLock<Vec<Uuid>>>,
    pub batch_calls: Arc<RwLock<usize>>,
}

impl MockCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn stored_ids(&self) -> Vec<Uuid> {
        self.objects.read().unwrap().keys().copied().collect()
    }
}

#[async_trait]
impl CollectionStore for MockCollectionStore {
    async fn collection_exists(&self, _name: &str) -> Result<bool, StoreError> {
        Ok(true)
    }

    async fn create_collection(&self, _schema: &CollectionSchema) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete_collection(&self, _name: &str) -> Result<(), StoreError> {
        self.objects.write().unwrap().clear();
        Ok(())
    }

    async fn upsert_batch(
        &self,
        _name: &str,
        batch: &[BatchObject],
    ) -> Result<Vec<BatchItemError>, StoreError> {
        *self.batch_calls.write().unwrap() += 1;
        let failing = self.failing_ids.read().unwrap().clone();
        let mut failures = Vec::new();
        let mut objects = self.objects.write().unwrap();
        for object in batch {
            if failing.contains(&object.id) {
                failures.push(BatchItemError {
                    id: object.id,
                    message: "invalid properties".to_string(),
                });
            } else {
                objects.insert(object.id, object.properties.clone());
            }
        }
        Ok(failures)
    }

    async fn count_objects(&self, _name: &str) -> Result<u64, StoreError> {
        Ok(self.objects.read().unwrap().len() as u64)
    }

    async fn aggregate_group_by(
        &self,
        _name: &str,
        field: &str,
        _filter: Option<&Filter>,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for object in self.objects.read().unwrap().values() {
            let value = match object.get(field) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            *counts.entry(value).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(value, count)| GroupCount { value, count })
            .collect())
    }

    async fn fetch_page(
        &self,
        _name: &str,
        fields: &[&str],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let objects = self.objects.read().unwrap();
        Ok(objects
            .values()
            .skip(offset)
            .take(limit)
            .map(|object| {
                let projected: serde_json::Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.to_string(), object.get(*f).cloned().unwrap_or(Value::Null)))
                    .collect();
                Value::Object(projected)
            })
            .collect())
    }

    async fn generate_grouped(
        &self,
        _name: &str,
        _filter: Option<&Filter>,
        _limit: usize,
        _task: &str,
        _view_fields: &[&str],
    ) -> Result<String, StoreError> {
        Ok("mock generative output".to_string())
    }
}
