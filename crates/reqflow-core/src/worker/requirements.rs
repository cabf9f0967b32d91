//! Requirements-extraction worker
//!
//! Forwards the input documents opaquely to the text-generation service
//! and parses the response into a structured requirements summary.

use super::{parse_generated, payload_field, prompts, settle, Worker};
use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use chrono::Utc;
use reqflow_clients::{DocumentBody, DocumentSource, GenerationOptions, TextGenerationClient};
use reqflow_model::{Message, RequirementsSummary, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct RequirementsExtractionWorker {
    text_client: Arc<dyn TextGenerationClient>,
    trace: Arc<TraceCollector>,
    generation: GenerationOptions,
}

impl RequirementsExtractionWorker {
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

    async fn try_process(&self, message: &Message) -> Result<Value, WorkerError> {
        let documents: Vec<DocumentSource> = payload_field(message, "documents")?;
        if documents.is_empty() {
            return Err(WorkerError::InvalidPayload("no input documents".into()));
        }

        let mut prompt = String::from(prompts::REQUIREMENTS);
        prompt.push_str(" from the following documents:\n");
        for doc in &documents {
            match &doc.body {
                DocumentBody::Inline(content) => {
                    prompt.push_str(&format!("--- {} ({})\n{}\n", doc.name, doc.media_type, content));
                }
                DocumentBody::Path(path) => {
                    // Text extraction is the service's concern; pass the reference through.
                    prompt.push_str(&format!(
                        "--- {} ({}) at {}\n",
                        doc.name,
                        doc.media_type,
                        path.display()
                    ));
                }
            }
        }

        let started_at = Utc::now();
        let generated = self.text_client.generate(&prompt, &self.generation).await?;
        self.trace.record_call(
            self.role().as_str(),
            started_at,
            generated.token_usage.total(),
            generated.cost_estimate,
        );

        let requirements: RequirementsSummary = parse_generated(&generated.content)?;
        tracing::debug!(count = requirements.requirements.len(), "requirements extracted");
        Ok(json!({ "requirements": requirements }))
    }
}

#[async_trait]
impl Worker for RequirementsExtractionWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::RequirementsExtraction
    }

    async fn process(&self, message: &Message, _state: &WorkflowState) -> Message {
        let outcome = self.try_process(message).await;
        settle(self.role(), message, outcome)
    }
}
