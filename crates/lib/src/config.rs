//! # Pipeline Configuration
//!
//! Connection details for the hosted collection service and the generative
//! provider, loaded from the process environment into an explicitly passed
//! struct. Nothing here is global: two pipelines pointed at different
//! clusters or collections can coexist in one process.

use std::env;
use thiserror::Error;

/// Default collection name, matching the original forum-analysis dataset.
pub const DEFAULT_COLLECTION_NAME: &str = "ForumPost";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Connection and naming configuration shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted collection service (e.g. a cloud cluster URL).
    pub weaviate_url: String,
    /// API key for the collection service.
    pub weaviate_api_key: String,
    /// Provider key passed through for generative queries. Optional because
    /// ingestion and enrichment do not need it.
    pub anthropic_api_key: Option<String>,
    /// Name of the target collection.
    pub collection_name: String,
}

impl AppConfig {
    /// Loads configuration from `WEAVIATE_URL`, `WEAVIATE_API_KEY`,
    /// `ANTHROPIC_API_KEY` and `COLLECTION_NAME`. The caller is expected to
    /// have loaded a `.env` file first if one is in use.
    pub fn from_env() -> Result<Self, ConfigError> {
        let weaviate_url =
            env::var("WEAVIATE_URL").map_err(|_| ConfigError::MissingVar("WEAVIATE_URL"))?;
        let weaviate_api_key = env::var("WEAVIATE_API_KEY")
            .map_err(|_| ConfigError::MissingVar("WEAVIATE_API_KEY"))?;
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").ok();
        let collection_name =
            env::var("COLLECTION_NAME").unwrap_or_else(|_| DEFAULT_COLLECTION_NAME.to_string());

        Ok(Self {
            weaviate_url,
            weaviate_api_key,
            anthropic_api_key,
            collection_name,
        })
    }
}
