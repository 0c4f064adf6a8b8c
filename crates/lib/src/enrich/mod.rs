//! # Annotation Pipeline
//!
//! Declares the enrichment operations the transformation agent applies to
//! every stored document, submits them as one asynchronous server-side job,
//! and polls the job until it terminates. The poll loop is bounded: the
//! original tooling waited forever, which is replaced here with an explicit,
//! configurable maximum attempt count.

pub mod operations;

pub use operations::standard_operations;

use crate::errors::AgentError;
use crate::providers::agent::{AgentStatus, TransformationAgentClient};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Timestamp format the agent service reports (`%Y-%m-%d %H:%M:%S`, UTC).
const AGENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Enrichment job still running after {attempts} polls; giving up")]
    PollTimeout { attempts: u32 },
}

/// Data type of an enriched property, in the agent's vocabulary.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnrichKind {
    Int,
    Text,
    Bool,
}

/// A stateless declaration of one enrichment: the property to append, its
/// type, the stored fields the model may read, and the instruction text.
#[derive(Serialize, Debug, Clone)]
pub struct EnrichmentOperation {
    pub operation_type: &'static str,
    pub property_name: String,
    pub data_type: EnrichKind,
    pub view_properties: Vec<String>,
    pub instruction: String,
}

impl EnrichmentOperation {
    /// Declares an append-property operation.
    pub fn append_property(
        property_name: &str,
        data_type: EnrichKind,
        view_properties: &[&str],
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            operation_type: "append_property",
            property_name: property_name.to_string(),
            data_type,
            view_properties: view_properties.iter().map(|p| p.to_string()).collect(),
            instruction: instruction.into(),
        }
    }
}

/// A handle to a submitted enrichment workflow.
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub workflow_id: String,
    /// Local submission time, used as the duration fallback when the service
    /// reports no timestamps at all.
    pub submitted_at: DateTime<Utc>,
}

/// Poll loop settings. The defaults mirror the reference behavior (10-second
/// spacing) but the attempt bound is mandatory.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            // One hour of waiting at the default interval.
            max_polls: 360,
        }
    }
}

/// Final outcome of a polled job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The terminal state the service reported.
    pub state: String,
    /// How many status calls were made.
    pub polls: u32,
    /// Total job duration in seconds, service-reported or computed locally.
    pub duration_secs: f64,
}

impl JobOutcome {
    /// Whether the job ended in the service's success state.
    pub fn is_completed(&self) -> bool {
        self.state == "completed"
    }
}

/// Submits the operations for asynchronous processing and returns a job
/// handle immediately.
pub async fn submit_enrichment(
    agent: &TransformationAgentClient,
    collection: &str,
    operations: &[EnrichmentOperation],
) -> Result<EnrichmentJob, EnrichError> {
    let workflow_id = agent.submit(collection, operations).await?;
    info!("[enrich] Workflow {workflow_id} started");
    Ok(EnrichmentJob {
        workflow_id,
        submitted_at: Utc::now(),
    })
}

fn parse_agent_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, AGENT_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Computes the job duration from a terminal status, preferring the
/// service-reported total and falling back to the reported (or local)
/// timestamps. Never negative.
fn job_duration(status: &AgentStatus, job: &EnrichmentJob) -> f64 {
    if let Some(total) = status.total_duration {
        return total.max(0.0);
    }
    let start = status
        .start_time
        .as_deref()
        .and_then(parse_agent_time)
        .unwrap_or(job.submitted_at);
    let end = status
        .end_time
        .as_deref()
        .and_then(parse_agent_time)
        .unwrap_or_else(Utc::now);
    (end - start).num_milliseconds().max(0) as f64 / 1000.0
}

/// Polls the job on a fixed interval until its state leaves `running`.
///
/// Returns after exactly as many status calls as the job needed to turn
/// terminal. A job still running after `poll.max_polls` attempts yields
/// [`EnrichError::PollTimeout`]; terminal failure states are returned in the
/// outcome, never retried.
pub async fn await_completion(
    agent: &TransformationAgentClient,
    job: &EnrichmentJob,
    poll: &PollConfig,
) -> Result<JobOutcome, EnrichError> {
    let mut polls = 0u32;
    loop {
        let status = agent.status(&job.workflow_id).await?;
        polls += 1;

        if !status.is_running() {
            let duration_secs = job_duration(&status, job);
            info!(
                "[enrich] Workflow {} finished in state '{}' after {duration_secs:.2}s",
                job.workflow_id, status.state
            );
            return Ok(JobOutcome {
                state: status.state,
                polls,
                duration_secs,
            });
        }

        if polls >= poll.max_polls {
            return Err(EnrichError::PollTimeout { attempts: polls });
        }

        let elapsed = (Utc::now() - job.submitted_at).num_seconds();
        info!(
            "[enrich] Workflow {} still running, elapsed {elapsed}s (poll {polls})",
            job.workflow_id
        );
        tokio::time::sleep(poll.interval).await;
    }
}
