//! # Transformation Agent Client
//!
//! Client for the remote transformation service that annotates stored
//! documents. The service runs asynchronously on its own side: submitting a
//! set of enrichment operations returns a workflow id immediately, and the
//! caller polls the workflow's status until it leaves `running`. The service
//! is a generic async task handle here; no vendor SDK shape is assumed.

use crate::enrich::EnrichmentOperation;
use crate::errors::AgentError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// Status of a transformation workflow as reported by the agent service.
#[derive(Deserialize, Debug, Clone)]
pub struct AgentStatus {
    /// `running` while in progress; anything else is terminal.
    pub state: String,
    /// Start timestamp in `%Y-%m-%d %H:%M:%S` (UTC), when known.
    pub start_time: Option<String>,
    /// End timestamp in the same format, present once terminal.
    pub end_time: Option<String>,
    /// Total duration in seconds, when the service computed one.
    pub total_duration: Option<f64>,
}

impl AgentStatus {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

#[derive(Deserialize, Debug)]
struct SubmitResponse {
    workflow_id: String,
}

#[derive(Deserialize, Debug)]
struct StatusResponse {
    status: AgentStatus,
}

/// HTTP client for the transformation agent service.
#[derive(Clone, Debug)]
pub struct TransformationAgentClient {
    client: ReqwestClient,
    base_url: String,
}

impl TransformationAgentClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AgentError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| AgentError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = ReqwestClient::builder()
            .default_headers(headers)
            .build()
            .map_err(AgentError::ReqwestClientBuild)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submits the operation list for server-side processing over every
    /// document of `collection`. Returns the workflow id to poll.
    pub async fn submit(
        &self,
        collection: &str,
        operations: &[EnrichmentOperation],
    ) -> Result<String, AgentError> {
        info!(
            "[agent] Submitting {} operations for collection '{collection}'",
            operations.len()
        );
        let response = self
            .client
            .post(format!("{}/agents/transformation", self.base_url))
            .json(&json!({
                "collection": collection,
                "operations": operations,
            }))
            .send()
            .await
            .map_err(AgentError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let submitted: SubmitResponse =
            response.json().await.map_err(AgentError::Deserialization)?;
        Ok(submitted.workflow_id)
    }

    /// Fetches the current status of a workflow.
    pub async fn status(&self, workflow_id: &str) -> Result<AgentStatus, AgentError> {
        let response = self
            .client
            .get(format!(
                "{}/agents/transformation/{workflow_id}",
                self.base_url
            ))
            .send()
            .await
            .map_err(AgentError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: StatusResponse = response.json().await.map_err(AgentError::Deserialization)?;
        Ok(body.status)
    }
}
