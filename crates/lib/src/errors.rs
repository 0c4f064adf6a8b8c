use thiserror::Error;

/// Errors produced by the hosted collection service client.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("API key contains characters that cannot appear in a header")]
    InvalidApiKey,
    #[error("Request to the collection service failed: {0}")]
    Request(reqwest::Error),
    #[error("Collection service returned an error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("Failed to deserialize collection service response: {0}")]
    Deserialization(reqwest::Error),
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Generative query failed: {0}")]
    Generative(String),
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

/// Errors produced by the transformation agent client.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("API key contains characters that cannot appear in a header")]
    InvalidApiKey,
    #[error("Request to the transformation agent failed: {0}")]
    Request(reqwest::Error),
    #[error("Transformation agent returned an error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("Failed to deserialize transformation agent response: {0}")]
    Deserialization(reqwest::Error),
}
