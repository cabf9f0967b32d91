//! Template-generation worker
//!
//! Produces one executable analysis template per use case. The downstream
//! execution phase fans out over the returned template list.

use super::{parse_generated, prompts, settle, Worker};
use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use chrono::Utc;
use reqflow_clients::{GenerationOptions, TextGenerationClient};
use reqflow_model::{AnalysisTemplate, Message, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct TemplateGenerationWorker {
    text_client: Arc<dyn TextGenerationClient>,
    trace: Arc<TraceCollector>,
    generation: GenerationOptions,
}

impl TemplateGenerationWorker {
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
        if state.artifacts.use_cases.is_empty() {
            return Err(WorkerError::MissingUpstream("use cases".into()));
        }
        let schema = state
            .artifacts
            .schema
            .as_ref()
            .ok_or_else(|| WorkerError::MissingUpstream("graph schema".into()))?;

        let prompt = format!(
            "{} for these use cases:\n{}\nusing this schema:\n{}",
            prompts::TEMPLATES,
            serde_json::to_string(&state.artifacts.use_cases)
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

        let templates: Vec<AnalysisTemplate> = parse_generated(&generated.content)?;
        if templates.is_empty() {
            return Err(WorkerError::UnparseableOutput(
                "generation produced zero templates".into(),
            ));
        }
        tracing::debug!(count = templates.len(), "templates generated");
        Ok(json!({ "templates": templates }))
    }
}

#[async_trait]
impl Worker for TemplateGenerationWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::TemplateGeneration
    }

    async fn process(&self, message: &Message, state: &WorkflowState) -> Message {
        let outcome = self.try_process(state).await;
        settle(self.role(), message, outcome)
    }
}
