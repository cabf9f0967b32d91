//! reqflow Clients - external-service capability contracts
//!
//! The orchestration core depends only on the narrow traits defined here,
//! never on concrete service implementations. Workers receive these by
//! injection at construction:
//! - [`TextGenerationClient`]: prompt in, generated text + usage out
//! - [`SchemaExtractionClient`]: graph database schema extraction
//! - [`AnalysisExecutionClient`]: deploy/load/execute/store on the
//!   analytics engine
//!
//! Each contract fails with its own distinguished error kind so the worker
//! boundary can report faults precisely.

#![warn(unreachable_pub)]

pub mod document;
pub mod error;

use async_trait::async_trait;
use reqflow_model::{AnalysisTemplate, ExecutionOutcome, GraphSchema};
use serde::{Deserialize, Serialize};

pub use document::{DocumentBody, DocumentSource};
pub use error::{ExecutionClientError, GenerationError, SchemaClientError};

/// Token accounting reported by the text-generation service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Total tokens consumed
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One completed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub content: String,
    pub token_usage: TokenUsage,
    pub cost_estimate: f64,
}

/// Options forwarded to the text-generation service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Optional system prompt prepended by the service
    pub system: Option<String>,
    /// Hard output cap, service default when `None`
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Text-generation service contract
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Generate text for a prompt
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Generation, GenerationError>;
}

/// Graph-database schema extraction contract
#[async_trait]
pub trait SchemaExtractionClient: Send + Sync {
    /// Extract the full schema from the configured database
    async fn extract(&self) -> Result<GraphSchema, SchemaClientError>;
}

/// Handle to a running analytics job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionJob {
    pub job_id: String,
    pub template_id: String,
}

/// Analytics-engine execution contract
///
/// The engine lifecycle is deploy -> load -> execute -> await -> store;
/// each stage fails with its own [`ExecutionClientError`] kind.
#[async_trait]
pub trait AnalysisExecutionClient: Send + Sync {
    /// Deploy the analytics runtime
    async fn deploy(&self) -> Result<(), ExecutionClientError>;

    /// Load the graph described by `schema` into the runtime
    async fn load(&self, schema: &GraphSchema) -> Result<(), ExecutionClientError>;

    /// Submit one template for execution
    async fn execute(&self, template: &AnalysisTemplate)
        -> Result<ExecutionJob, ExecutionClientError>;

    /// Block until the job settles
    async fn await_completion(
        &self,
        job: &ExecutionJob,
    ) -> Result<ExecutionOutcome, ExecutionClientError>;

    /// Persist an outcome to the named storage target
    async fn store(
        &self,
        outcome: &ExecutionOutcome,
        target: &str,
    ) -> Result<(), ExecutionClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_totals() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }
}
