//! Schema-analysis worker
//!
//! Extracts the graph schema through the injected client, then asks the
//! text-generation service for a natural-language summary attached to the
//! schema artifact.

use super::{payload_field, prompts, settle, Worker};
use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use chrono::Utc;
use reqflow_clients::{GenerationOptions, SchemaExtractionClient, TextGenerationClient};
use reqflow_model::{GraphSchema, Message, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct SchemaAnalysisWorker {
    schema_client: Arc<dyn SchemaExtractionClient>,
    text_client: Arc<dyn TextGenerationClient>,
    trace: Arc<TraceCollector>,
    generation: GenerationOptions,
}

impl SchemaAnalysisWorker {
    pub fn new(
        schema_client: Arc<dyn SchemaExtractionClient>,
        text_client: Arc<dyn TextGenerationClient>,
        trace: Arc<TraceCollector>,
        generation: GenerationOptions,
    ) -> Self {
        Self {
            schema_client,
            text_client,
            trace,
            generation,
        }
    }

    async fn try_process(&self, message: &Message) -> Result<Value, WorkerError> {
        let graph_name: String = payload_field(message, "graph")?;
        tracing::debug!(graph = %graph_name, "extracting schema");

        let mut schema: GraphSchema = self.schema_client.extract().await?;

        let started_at = Utc::now();
        let prompt = format!(
            "{} for graph '{}':\n{}",
            prompts::SCHEMA_SUMMARY,
            graph_name,
            serde_json::to_string(&schema)
                .map_err(|e| WorkerError::InvalidPayload(e.to_string()))?
        );
        let generated = self.text_client.generate(&prompt, &self.generation).await?;
        self.trace.record_call(
            self.role().as_str(),
            started_at,
            generated.token_usage.total(),
            generated.cost_estimate,
        );

        schema.summary = generated.content;
        Ok(json!({ "schema": schema }))
    }
}

#[async_trait]
impl Worker for SchemaAnalysisWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::SchemaAnalysis
    }

    async fn process(&self, message: &Message, _state: &WorkflowState) -> Message {
        let outcome = self.try_process(message).await;
        settle(self.role(), message, outcome)
    }
}
