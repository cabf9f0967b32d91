//! Template-execution worker
//!
//! Runs one analysis template on the analytics engine:
//! execute -> await completion -> optionally store. Engine deployment and
//! graph loading happen exactly once per worker lifetime, on the first
//! task, guarded by a `OnceCell` so concurrent siblings share the setup.

use super::{payload_field, settle, Worker};
use crate::error::WorkerError;
use crate::trace::TraceCollector;
use async_trait::async_trait;
use chrono::Utc;
use reqflow_clients::{AnalysisExecutionClient, ExecutionClientError};
use reqflow_model::{AnalysisTemplate, Message, WorkerRole, WorkflowState};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct TemplateExecutionWorker {
    client: Arc<dyn AnalysisExecutionClient>,
    trace: Arc<TraceCollector>,
    engine_ready: OnceCell<()>,
}

impl TemplateExecutionWorker {
    pub fn new(client: Arc<dyn AnalysisExecutionClient>, trace: Arc<TraceCollector>) -> Self {
        Self {
            client,
            trace,
            engine_ready: OnceCell::new(),
        }
    }

    /// Deploy the runtime and load the graph, once
    async fn ensure_engine(&self, state: &WorkflowState) -> Result<(), WorkerError> {
        let schema = state
            .artifacts
            .schema
            .as_ref()
            .ok_or_else(|| WorkerError::MissingUpstream("graph schema".into()))?;

        self.engine_ready
            .get_or_try_init(|| async {
                tracing::info!("deploying analytics engine");
                self.client.deploy().await?;
                self.client.load(schema).await?;
                Ok::<(), ExecutionClientError>(())
            })
            .await?;
        Ok(())
    }

    async fn try_process(
        &self,
        message: &Message,
        state: &WorkflowState,
    ) -> Result<Value, WorkerError> {
        let template: AnalysisTemplate = payload_field(message, "template")?;
        let target: Option<String> = message
            .content
            .get("target")
            .and_then(|v| v.as_str())
            .map(String::from);

        self.ensure_engine(state).await?;

        let started_at = Utc::now();
        let job = self.client.execute(&template).await?;
        tracing::debug!(template = %template.id, job = %job.job_id, "template submitted");

        let outcome = self.client.await_completion(&job).await?;
        if let Some(target) = &target {
            self.client.store(&outcome, target).await?;
        }

        self.trace.record_call(self.role().as_str(), started_at, 0, 0.0);
        Ok(json!({ "outcome": outcome }))
    }
}

#[async_trait]
impl Worker for TemplateExecutionWorker {
    fn role(&self) -> WorkerRole {
        WorkerRole::TemplateExecution
    }

    async fn process(&self, message: &Message, state: &WorkflowState) -> Message {
        let outcome = self.try_process(message, state).await;
        settle(self.role(), message, outcome)
    }
}
