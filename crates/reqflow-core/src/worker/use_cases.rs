//! Use-case generation worker
//!
//! Depends on both upstream artifacts: the extracted requirements and the
//! analyzed schema. Asks the generation service for use cases grounded in
//! both.

use super::{parse_generated, prompts, settle, Worker};
use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use chrono::Utc;
use reqflow_clients::{GenerationOptions, TextGenerationClient};
use reqflow_model::{Message, UseCase, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct UseCaseGenerationWorker {
    text_client: Arc<dyn TextGenerationClient>,
    trace: Arc<TraceCollector>,
    generation: GenerationOptions,
}

impl UseCaseGenerationWorker {
    pub fn new(
        text_client: Arc<dyn TextGenerationClient>,
        trace: Arc<TraceCollector>,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            text_client,
            trace,
            generation,
        }
    }

    async fn try_process(&self, state: &WorkflowState) -> Result<Value, WorkerError> {
        let schema = state
            .artifacts
            .schema
            .as_ref()
            .ok_or_else(|| WorkerError::MissingUpstream("graph schema".into()))?;
        let requirements = state
            .artifacts
            .requirements
            .as_ref()
            .ok_or_else(|| WorkerError::MissingUpstream("requirements summary".into()))?;

        let prompt = format!(
            "{} covering these requirements:\n{}\nagainst this schema:\n{}",
            prompts::USE_CASES,
            serde_json::to_string(requirements)
                .map_err(|e| WorkerError::InvalidPayload(e.to_string()))?,
            serde_json::to_string(schema).map_err(|e| WorkerError::InvalidPayload(e.to_string()))?,
        );

        let started_at = Utc::now();
        let generated = self.text_client.generate(&prompt, &self.generation).await?;
        self.trace.record_call(
            self.role().as_str(),
            started_at,
            generated.token_usage.total(),
            generated.cost_estimate,
        );

        let use_cases: Vec<UseCase> = parse_generated(&generated.content)?;
        if use_cases.is_empty() {
            return Err(WorkerError::UnparseableOutput(
                "generation produced zero use cases".into(),
            ));
        }
        tracing::debug!(count = use_cases.len(), "use cases derived");
        Ok(json!({ "use_cases": use_cases }))
    }
}

#[async_trait]
impl Worker for UseCaseGenerationWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::UseCaseGeneration
    }

    async fn process(&self, message: &Message, state: &WorkflowState) -> Message {
        let outcome = self.try_process(state).await;
        settle(self.role(), message, outcome)
    }
}
