pub mod agent;
pub mod collection;
pub mod weaviate;

pub use agent::{AgentStatus, TransformationAgentClient};
pub use collection::{BatchItemError, BatchObject, CollectionStore};
pub use weaviate::WeaviateStore;
