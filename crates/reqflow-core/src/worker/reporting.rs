//! Report-generation worker
//!
//! Writes one narrative report per execution outcome. The narrative is the
//! generation service's output verbatim; the title is derived from the
//! template the outcome belongs to.

use super::{payload_field, prompts, settle, Worker};
use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use chrono::Utc;
use reqflow_clients::{GenerationOptions, TextGenerationClient};
use reqflow_model::{AnalysisReport, ExecutionOutcome, Message, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ReportGenerationWorker {
    text_client: Arc<dyn TextGenerationClient>,
    trace: Arc<TraceCollector>,
    generation: GenerationOptions,
}

impl ReportGenerationWorker {
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

    async fn try_process(
        &self,
        message: &Message,
        state: &WorkflowState,
    ) -> Result<Value, WorkerError> {
        let outcome: ExecutionOutcome = payload_field(message, "outcome")?;

        let template_name = state
            .artifacts
            .templates
            .iter()
            .find(|t| t.id == outcome.template_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| outcome.template_id.clone());

        let prompt = format!(
            "{} for analysis '{}' with results:\n{}",
            prompts::REPORT,
            template_name,
            serde_json::to_string(&outcome.records)
                .map_err(|e| WorkerError::InvalidPayload(e.to_string()))?,
        );

        let started_at = Utc::now();
        let generated = self.text_client.generate(&prompt, &self.generation).await?;
        self.trace.record_call(
            self.role().as_str(),
            started_at,
            generated.token_usage.total(),
            generated.cost_estimate,
        );

        let report = AnalysisReport {
            template_id: outcome.template_id.clone(),
            title: format!("Analysis report: {template_name}"),
            narrative: generated.content,
        };
        Ok(json!({ "report": report }))
    }
}

#[async_trait]
impl Worker for ReportGenerationWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::ReportGeneration
    }

    async fn process(&self, message: &Message, state: &WorkflowState) -> Message {
        let outcome = self.try_process(message, state).await;
        settle(self.role(), message, outcome)
    }
}
