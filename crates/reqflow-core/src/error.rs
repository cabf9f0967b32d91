//! Error types for the orchestration core
//!
//! Two layers:
//! - [`WorkerError`]: a worker's internal failure, wrapping an
//!   external-service error or logic fault. Caught at the worker boundary
//!   and converted into an error message; never escapes a worker.
//! - [`WorkflowError`]: supervisor-level outcomes. Worker-level failures do
//!   not surface here; top-level `run` returns a terminal state with
//!   status Failed instead. Only checkpoint corruption, illegal state
//!   transitions and cancellation travel as errors.

use reqflow_clients::{ExecutionClientError, GenerationError, SchemaClientError};
use reqflow_model::StateError;
use std::path::PathBuf;

/// A worker's internal failure
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Text-generation service failure
    #[error("text generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Graph-database schema extraction failure
    #[error("schema extraction failed: {0}")]
    Schema(#[from] SchemaClientError),

    /// Analytics-engine failure
    #[error("analysis execution failed: {0}")]
    Execution(#[from] ExecutionClientError),

    /// Task payload missing or malformed
    #[error("invalid task payload: {0}")]
    InvalidPayload(String),

    /// Upstream artifact required by this worker is absent
    #[error("missing upstream artifact: {0}")]
    MissingUpstream(String),

    /// Generated content could not be parsed into the expected artifact
    #[error("unparseable generation output: {0}")]
    UnparseableOutput(String),
}

impl WorkerError {
    /// Whether a retry of the same task could plausibly succeed.
    ///
    /// Service and parse faults are transient (services recover, generation
    /// is non-deterministic); payload and upstream faults are not, since the
    /// same inputs will be re-dispatched.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(_) | Self::Schema(_) | Self::Execution(_)
            | Self::UnparseableOutput(_) => true,
            Self::InvalidPayload(_) | Self::MissingUpstream(_) => false,
        }
    }
}

/// Checkpoint persistence failures
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Persisted state is unreadable or fails validation. Always fatal;
    /// partial state is never reconstructed.
    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),

    /// No checkpoint at the given path
    #[error("checkpoint not found: {0}")]
    NotFound(PathBuf),

    /// Filesystem failure while writing
    #[error("checkpoint io: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be serialized
    #[error("checkpoint serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Supervisor-level workflow errors
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A required phase exhausted its retry budget
    #[error("phase '{phase}' exhausted after {attempts} attempts: {error}")]
    PhaseExhausted {
        phase: String,
        attempts: u32,
        error: String,
    },

    /// Checkpoint corruption or persistence failure
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Illegal state mutation (programming error)
    #[error(transparent)]
    State(#[from] StateError),

    /// Control signal: a pause was requested. Not a failure; the workflow
    /// checkpoints and reports status Paused.
    #[error("cancellation requested")]
    Cancelled,

    /// Worker role has no registered worker (programming error)
    #[error("no worker registered for role '{0}'")]
    UnregisteredRole(String),

    /// A worker result message did not carry the artifact its role
    /// promises (programming error)
    #[error("malformed worker result: {0}")]
    MalformedResult(String),
}
