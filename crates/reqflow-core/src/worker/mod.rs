//! Workers
//!
//! A worker is a polymorphic unit with one capability tag and a uniform
//! `process(message, state) -> message` contract. Workers never mutate
//! workflow state; they read a snapshot and return a message, and the
//! supervisor applies all effects. Any internal fault is caught at the
//! worker boundary by [`settle`] and converted into a well-formed error
//! message; no fault escapes a worker.
//!
//! External-service clients are injected at construction, so the core
//! depends only on the narrow contracts in `reqflow-clients`.

mod execution;
mod reporting;
mod requirements;
mod schema;
mod templates;
mod use_cases;

pub use execution::TemplateExecutionWorker;
pub use reporting::ReportGenerationWorker;
pub use requirements::RequirementsExtractionWorker;
pub use schema::SchemaAnalysisWorker;
pub use templates::TemplateGenerationWorker;
pub use use_cases::UseCaseGenerationWorker;

use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use reqflow_clients::{
    AnalysisExecutionClient, GenerationOptions, SchemaExtractionClient, TextGenerationClient,
};
use reqflow_model::{Message, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Sender/recipient name of the supervisor
pub const SUPERVISOR: &str = "supervisor";

/// Stable prompt openers, one per generation-backed operation
pub mod prompts {
    pub const SCHEMA_SUMMARY: &str = "Summarize this graph schema";
    pub const REQUIREMENTS: &str = "Extract structured business requirements";
    pub const USE_CASES: &str = "Derive analysis use cases";
    pub const TEMPLATES: &str = "Generate executable analysis templates";
    pub const REPORT: &str = "Write a narrative analysis report";
}

/// Uniform message-processing contract
#[async_trait]
pub trait Worker: Send + Sync {
    /// Capability tag
    fn role(&self) -> WorkerRole;

    /// Process one task against a read-only state snapshot.
    ///
    /// Infallible by contract: implementations route their internal
    /// `Result` through [`settle`], so the returned message is either a
    /// result or a well-formed error reply.
    async fn process(&self, message: &Message, state: &WorkflowState) -> Message;
}

/// External-service clients shared by the worker set
#[derive(Clone)]
pub struct ClientSet {
    pub text: Arc<dyn TextGenerationClient>,
    pub schema: Arc<dyn SchemaExtractionClient>,
    pub execution: Arc<dyn AnalysisExecutionClient>,
}

impl std::fmt::Debug for ClientSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSet").finish_non_exhaustive()
    }
}

/// Convert a worker outcome into its reply message.
///
/// The single fault boundary: errors are logged and downgraded to an
/// `error` message addressed back to the supervisor.
pub(crate) fn settle(
    role: WorkerRole,
    task: &Message,
    outcome: Result<Value, WorkerError>,
) -> Message {
    match outcome {
        Ok(content) => Message::result(role.as_str(), SUPERVISOR, task.id, content),
        Err(err) => {
            tracing::warn!(
                worker = %role,
                task = %task.id,
                error = %err,
                retryable = err.is_retryable(),
                "worker fault"
            );
            Message::error(
                role.as_str(),
                SUPERVISOR,
                task.id,
                json!({"error": err.to_string()}),
            )
        }
    }
}

/// Parse generated text into a typed artifact
pub(crate) fn parse_generated<T: serde::de::DeserializeOwned>(
    content: &str,
) -> Result<T, WorkerError> {
    serde_json::from_str(content).map_err(|e| WorkerError::UnparseableOutput(e.to_string()))
}

/// Extract a required field from a task payload
pub(crate) fn payload_field<T: serde::de::DeserializeOwned>(
    message: &Message,
    field: &str,
) -> Result<T, WorkerError> {
    let value = message
        .content
        .get(field)
        .ok_or_else(|| WorkerError::InvalidPayload(format!("missing field '{field}'")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| WorkerError::InvalidPayload(format!("field '{field}': {e}")))
}

/// Build the full worker registry, one worker per role
#[must_use]
pub fn build_workers(
    clients: &ClientSet,
    trace: Arc<TraceCollector>,
    generation: GenerationOptions,
) -> HashMap<WorkerRole, Arc<dyn Worker>> {
    let mut workers: HashMap<WorkerRole, Arc<dyn Worker>> = HashMap::new();
    workers.insert(
        WorkerRole::SchemaAnalysis,
        Arc::new(SchemaAnalysisWorker::new(
            clients.schema.clone(),
            clients.text.clone(),
            trace.clone(),
            generation.clone(),
        )),
    );
    workers.insert(
        WorkerRole::RequirementsExtraction,
        Arc::new(RequirementsExtractionWorker::new(
            clients.text.clone(),
            trace.clone(),
            generation.clone(),
        )),
    );
    workers.insert(
        WorkerRole::UseCaseGeneration,
        Arc::new(UseCaseGenerationWorker::new(
            clients.text.clone(),
            trace.clone(),
            generation.clone(),
        )),
    );
    workers.insert(
        WorkerRole::TemplateGeneration,
        Arc::new(TemplateGenerationWorker::new(
            clients.text.clone(),
            trace.clone(),
            generation.clone(),
        )),
    );
    workers.insert(
        WorkerRole::TemplateExecution,
        Arc::new(TemplateExecutionWorker::new(
            clients.execution.clone(),
            trace.clone(),
        )),
    );
    workers.insert(
        WorkerRole::ReportGeneration,
        Arc::new(ReportGenerationWorker::new(
            clients.text.clone(),
            trace.clone(),
            generation,
        )),
    );
    workers
}
