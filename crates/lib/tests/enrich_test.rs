//! # Annotation Pipeline Tests
//!
//! Exercises the transformation agent client and the bounded poll loop
//! against a mock agent service: submission payloads, termination after
//! exactly as many polls as the job needs, duration fallbacks, and the
//! explicit poll bound.

mod common;

use common::setup_tracing;
use forumlens::enrich::{
    await_completion, standard_operations, submit_enrichment, EnrichError, PollConfig,
};
use forumlens::providers::TransformationAgentClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_poll(max_polls: u32) -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(1),
        max_polls,
    }
}

fn running_status() -> serde_json::Value {
    json!({
        "status": {
            "state": "running",
            "start_time": "2025-01-15 12:00:00",
            "end_time": null,
            "total_duration": null
        }
    })
}

#[test]
fn test_standard_operations_cover_all_enriched_fields() {
    let operations = standard_operations();
    let names: Vec<&str> = operations.iter().map(|op| op.property_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "technicalComplexity",
            "technicalDomain",
            "rootCauseCategory",
            "accessContext",
            "causedByOutdatedStack",
            "isDocumentationGap",
            "summary",
        ]
    );
    // Categorical instructions must carry their registry codes so the model
    // knows the closed set it is choosing from.
    let domain = &operations[1];
    assert!(domain.instruction.contains("server_setup"));
    assert!(domain.instruction.contains("ingestion"));
    let root_cause = &operations[2];
    assert!(root_cause.instruction.contains("conceptual_misunderstanding"));
}

#[tokio::test]
async fn test_submit_posts_operations_and_returns_workflow_id() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/agents/transformation"))
        .and(body_partial_json(json!({ "collection": "ForumPost" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "workflow_id": "wf-123" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let agent = TransformationAgentClient::new(&server.uri(), "test-key").unwrap();
    let job = submit_enrichment(&agent, "ForumPost", &standard_operations())
        .await
        .unwrap();
    assert_eq!(job.workflow_id, "wf-123");
}

#[tokio::test]
async fn test_await_completion_returns_after_exact_poll_count() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/agents/transformation"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "workflow_id": "wf-9" })),
        )
        .mount(&server)
        .await;
    // Two polls see `running`, the third sees the terminal state.
    Mock::given(method("GET"))
        .and(path("/agents/transformation/wf-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(running_status()))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/agents/transformation/wf-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "state": "completed",
                "start_time": "2025-01-15 12:00:00",
                "end_time": "2025-01-15 12:03:20",
                "total_duration": 200.0
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = TransformationAgentClient::new(&server.uri(), "test-key").unwrap();
    let job = submit_enrichment(&agent, "ForumPost", &[]).await.unwrap();
    let outcome = await_completion(&agent, &job, &fast_poll(10)).await.unwrap();

    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.state, "completed");
    assert!(outcome.is_completed());
    assert_eq!(outcome.duration_secs, 200.0);
}

#[tokio::test]
async fn test_await_completion_computes_duration_from_timestamps() {
    setup_tracing();
    let server = MockServer::start().await;

    // No total_duration from the service: the client derives it from the
    // reported start/end times.
    Mock::given(method("GET"))
        .and(path("/agents/transformation/wf-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "state": "completed",
                "start_time": "2025-01-15 12:00:00",
                "end_time": "2025-01-15 12:01:30",
                "total_duration": null
            }
        })))
        .mount(&server)
        .await;

    let agent = TransformationAgentClient::new(&server.uri(), "test-key").unwrap();
    let job = forumlens::enrich::EnrichmentJob {
        workflow_id: "wf-7".to_string(),
        submitted_at: chrono::Utc::now(),
    };
    let outcome = await_completion(&agent, &job, &fast_poll(10)).await.unwrap();

    assert_eq!(outcome.polls, 1);
    assert_eq!(outcome.duration_secs, 90.0);
}

#[tokio::test]
async fn test_await_completion_gives_up_at_poll_bound() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agents/transformation/wf-stuck"))
        .respond_with(ResponseTemplate::new(200).set_body_json(running_status()))
        .expect(3)
        .mount(&server)
        .await;

    let agent = TransformationAgentClient::new(&server.uri(), "test-key").unwrap();
    let job = forumlens::enrich::EnrichmentJob {
        workflow_id: "wf-stuck".to_string(),
        submitted_at: chrono::Utc::now(),
    };
    let result = await_completion(&agent, &job, &fast_poll(3)).await;

    assert!(matches!(result, Err(EnrichError::PollTimeout { attempts: 3 })));
}

#[tokio::test]
async fn test_failed_terminal_state_is_reported_not_retried() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agents/transformation/wf-bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {
                "state": "failed",
                "start_time": "2025-01-15 12:00:00",
                "end_time": "2025-01-15 12:00:05",
                "total_duration": 5.0
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = TransformationAgentClient::new(&server.uri(), "test-key").unwrap();
    let job = forumlens::enrich::EnrichmentJob {
        workflow_id: "wf-bad".to_string(),
        submitted_at: chrono::Utc::now(),
    };
    let outcome = await_completion(&agent, &job, &fast_poll(10)).await.unwrap();

    assert_eq!(outcome.state, "failed");
    assert!(!outcome.is_completed());
    assert_eq!(outcome.polls, 1);
}
