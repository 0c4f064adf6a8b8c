//! # forumlens
//!
//! A pipeline that populates a hosted vector-search collection with forum
//! conversation threads, enriches each document with LLM-derived annotations
//! (topic categories, complexity scores, summaries) via a remote
//! transformation agent, and runs aggregate and generative queries over the
//! enriched corpus. The hosted database and the model provider are opaque
//! collaborators reached over HTTP; this crate owns loading, keying,
//! batching, the annotation declarations, and the reporting reshapes.

pub mod analysis;
pub mod categories;
pub mod config;
pub mod enrich;
pub mod errors;
pub mod ingest;
pub mod providers;
pub mod schema;
pub mod types;

pub use config::AppConfig;
pub use errors::{AgentError, StoreError};
pub use types::{Filter, FilterValue, ForumThread, GroupCount};
