//! # Weaviate-Style Collection Provider
//!
//! Implements [`CollectionStore`] against the REST/GraphQL surface of a
//! hosted Weaviate-style cluster: `/v1/schema` for collection definitions,
//! `/v1/batch/objects` for keyed batch uploads, and `/v1/graphql` for
//! aggregate, fetch and generative queries. The service is treated as an
//! opaque collaborator; nothing here reimplements search or generation.

use crate::errors::StoreError;
use crate::providers::collection::{BatchItemError, BatchObject, CollectionStore};
use crate::schema::CollectionSchema;
use crate::types::{Filter, FilterValue, GroupCount};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

/// Header used to pass the generative provider's key through the cluster.
const GENERATIVE_KEY_HEADER: &str = "X-Anthropic-Api-Key";

/// HTTP client for a hosted Weaviate-style collection service.
#[derive(Clone, Debug)]
pub struct WeaviateStore {
    client: ReqwestClient,
    base_url: String,
}

impl WeaviateStore {
    /// Creates a new store client.
    ///
    /// `generative_api_key` is only needed by [`CollectionStore::generate_grouped`];
    /// the other operations work without it.
    pub fn new(
        base_url: &str,
        api_key: &str,
        generative_api_key: Option<&str>,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| StoreError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        if let Some(key) = generative_api_key {
            let mut value =
                HeaderValue::from_str(key).map_err(|_| StoreError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(GENERATIVE_KEY_HEADER, value);
        }

        let client = ReqwestClient::builder()
            .default_headers(headers)
            .build()
            .map_err(StoreError::ReqwestClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Posts a GraphQL query and returns the `data` payload, surfacing any
    /// GraphQL-level errors as [`StoreError::Query`].
    async fn graphql(&self, query: &str) -> Result<Value, StoreError> {
        debug!("[weaviate] GraphQL query: {query}");
        let response = self
            .client
            .post(format!("{}/v1/graphql", self.base_url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(StoreError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await.map_err(StoreError::Deserialization)?;
        if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
            return Err(StoreError::Query(errors.to_string()));
        }
        body.get("data").cloned().ok_or_else(|| {
            StoreError::UnexpectedResponse("GraphQL response has no `data` field".to_string())
        })
    }
}

/// Renders a single `field == value` condition in GraphQL syntax.
fn render_condition(field: &str, value: &FilterValue) -> String {
    match value {
        FilterValue::Text(text) => format!(
            r#"{{ path: ["{field}"], operator: Equal, valueText: {} }}"#,
            Value::String(text.clone())
        ),
        FilterValue::Int(n) => {
            format!(r#"{{ path: ["{field}"], operator: Equal, valueInt: {n} }}"#)
        }
        FilterValue::Bool(b) => {
            format!(r#"{{ path: ["{field}"], operator: Equal, valueBoolean: {b} }}"#)
        }
    }
}

/// Renders a filter as a GraphQL `where` argument, or an empty string for no
/// filter. A single condition is emitted bare; multiple conditions are joined
/// under an `And` operator.
fn render_where(filter: Option<&Filter>) -> String {
    let Some(filter) = filter.filter(|f| !f.is_empty()) else {
        return String::new();
    };
    let conditions = filter.conditions();
    if conditions.len() == 1 {
        let (field, value) = &conditions[0];
        format!("where: {}, ", render_condition(field, value))
    } else {
        let operands = conditions
            .iter()
            .map(|(field, value)| render_condition(field, value))
            .collect::<Vec<_>>()
            .join(", ");
        format!("where: {{ operator: And, operands: [{operands}] }}, ")
    }
}

// --- Batch upload response structures ---

#[derive(Deserialize, Debug)]
struct BatchResponseItem {
    id: Option<Uuid>,
    result: Option<BatchItemResult>,
}

#[derive(Deserialize, Debug)]
struct BatchItemResult {
    status: Option<String>,
    errors: Option<BatchItemErrors>,
}

#[derive(Deserialize, Debug)]
struct BatchItemErrors {
    #[serde(default)]
    error: Vec<BatchErrorMessage>,
}

#[derive(Deserialize, Debug)]
struct BatchErrorMessage {
    #[serde(default)]
    message: String,
}

#[async_trait]
impl CollectionStore for WeaviateStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .get(format!("{}/v1/schema/{name}", self.base_url))
            .send()
            .await
            .map_err(StoreError::Request)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<(), StoreError> {
        let properties: Vec<Value> = schema
            .fields
            .iter()
            .map(|field| {
                json!({
                    "name": field.name,
                    "description": field.description,
                    "dataType": [field.field_type.wire_name()],
                })
            })
            .collect();
        let vector_config: Value = schema
            .vectorizers
            .iter()
            .map(|v| {
                (
                    v.name.clone(),
                    json!({
                        "vectorizer": {
                            "text2vec-weaviate": { "sourceProperties": v.source_fields }
                        },
                        "vectorIndexType": "hnsw",
                    }),
                )
            })
            .collect::<serde_json::Map<_, _>>()
            .into();

        let body = json!({
            "class": schema.name,
            "description": schema.description,
            "properties": properties,
            "vectorConfig": vector_config,
        });

        info!("[weaviate] Creating collection '{}'", schema.name);
        let response = self
            .client
            .post(format!("{}/v1/schema", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(StoreError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        info!("[weaviate] Deleting collection '{name}'");
        let response = self
            .client
            .delete(format!("{}/v1/schema/{name}", self.base_url))
            .send()
            .await
            .map_err(StoreError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn upsert_batch(
        &self,
        name: &str,
        objects: &[BatchObject],
    ) -> Result<Vec<BatchItemError>, StoreError> {
        let payload: Vec<Value> = objects
            .iter()
            .map(|object| {
                json!({
                    "class": name,
                    "id": object.id,
                    "properties": object.properties,
                })
            })
            .collect();

        debug!("[weaviate] Uploading batch of {} objects", objects.len());
        let response = self
            .client
            .post(format!("{}/v1/batch/objects", self.base_url))
            .json(&json!({ "objects": payload }))
            .send()
            .await
            .map_err(StoreError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let results: Vec<BatchResponseItem> =
            response.json().await.map_err(StoreError::Deserialization)?;

        let failures = results
            .into_iter()
            .filter_map(|item| {
                let result = item.result?;
                if result.status.as_deref() != Some("FAILED") {
                    return None;
                }
                let message = result
                    .errors
                    .map(|errors| {
                        errors
                            .error
                            .into_iter()
                            .map(|e| e.message)
                            .collect::<Vec<_>>()
                            .join("; ")
                    })
                    .unwrap_or_else(|| "unknown batch error".to_string());
                Some(BatchItemError {
                    id: item.id.unwrap_or_default(),
                    message,
                })
            })
            .collect();

        Ok(failures)
    }

    async fn count_objects(&self, name: &str) -> Result<u64, StoreError> {
        let query = format!("{{ Aggregate {{ {name} {{ meta {{ count }} }} }} }}");
        let data = self.graphql(&query).await?;
        data.pointer(&format!("/Aggregate/{name}/0/meta/count"))
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                StoreError::UnexpectedResponse("Aggregate meta count missing".to_string())
            })
    }

    async fn aggregate_group_by(
        &self,
        name: &str,
        field: &str,
        filter: Option<&Filter>,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let where_clause = render_where(filter);
        let query = format!(
            "{{ Aggregate {{ {name}({where_clause}groupBy: [\"{field}\"]) \
             {{ groupedBy {{ value }} meta {{ count }} }} }} }}"
        );
        let data = self.graphql(&query).await?;
        let groups = data
            .pointer(&format!("/Aggregate/{name}"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                StoreError::UnexpectedResponse("Aggregate group-by result missing".to_string())
            })?;

        let mut counts = Vec::with_capacity(groups.len());
        for group in groups {
            let value = match group.pointer("/groupedBy/value") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => continue,
            };
            let count = group
                .pointer("/meta/count")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            counts.push(GroupCount { value, count });
        }
        Ok(counts)
    }

    async fn fetch_page(
        &self,
        name: &str,
        fields: &[&str],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let projection = fields.join(" ");
        let query = format!(
            "{{ Get {{ {name}(limit: {limit}, offset: {offset}) {{ {projection} }} }} }}"
        );
        let data = self.graphql(&query).await?;
        data.pointer(&format!("/Get/{name}"))
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| StoreError::UnexpectedResponse("Get result missing".to_string()))
    }

    async fn generate_grouped(
        &self,
        name: &str,
        filter: Option<&Filter>,
        limit: usize,
        task: &str,
        view_fields: &[&str],
    ) -> Result<String, StoreError> {
        let where_clause = render_where(filter);
        let projection = view_fields.join(" ");
        let properties = view_fields
            .iter()
            .map(|f| format!("\"{f}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let task_literal = Value::String(task.to_string()).to_string();
        let query = format!(
            "{{ Get {{ {name}({where_clause}limit: {limit}) {{ {projection} \
             _additional {{ generate(groupedResult: {{ task: {task_literal}, \
             properties: [{properties}] }}) {{ groupedResult error }} }} }} }} }}"
        );
        let data = self.graphql(&query).await?;

        let generate = data
            .pointer(&format!("/Get/{name}/0/_additional/generate"))
            .ok_or_else(|| {
                StoreError::UnexpectedResponse("Generative result missing".to_string())
            })?;
        if let Some(error) = generate.get("error").and_then(Value::as_str) {
            return Err(StoreError::Generative(error.to_string()));
        }
        generate
            .get("groupedResult")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::UnexpectedResponse("Generative result has no text".to_string())
            })
    }
}
