//! Client error kinds
//!
//! Each external contract fails with its own enum so the worker boundary
//! can wrap faults without losing the failing stage.

/// Text-generation service failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Service rejected or could not complete the request
    #[error("generation failed: {0}")]
    Failed(String),

    /// Request exceeded the service's rate limits
    #[error("generation rate limited: {0}")]
    RateLimited(String),

    /// Transport-level failure
    #[error("generation service unreachable: {0}")]
    Unreachable(String),
}

/// Schema-extraction failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaClientError {
    /// Could not reach the graph database
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Schema was readable but malformed/unsupported
    #[error("schema error: {0}")]
    Schema(String),
}

/// Analytics-engine failures, per lifecycle stage
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionClientError {
    /// Runtime deployment failed
    #[error("deployment failed: {0}")]
    Deployment(String),

    /// Graph load failed
    #[error("graph load failed: {0}")]
    Load(String),

    /// Job submission failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Job did not settle within the engine's deadline
    #[error("execution timed out: {0}")]
    ExecutionTimeout(String),

    /// Result persistence failed
    #[error("storage failed: {0}")]
    Storage(String),
}
