//! Scripted mock clients
//!
//! The text mock routes each prompt on its opener (the stable prefixes in
//! `reqflow_core::worker::prompts`) and answers with the matching fixture.
//! All mocks support "fail the first N calls" scripting so retry paths run
//! deterministically.

use crate::fixtures;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqflow_clients::{
    AnalysisExecutionClient, ExecutionClientError, ExecutionJob, Generation, GenerationError,
    GenerationOptions, SchemaClientError, SchemaExtractionClient, TextGenerationClient,
    TokenUsage,
};
use reqflow_core::worker::prompts;
use reqflow_core::ClientSet;
use reqflow_model::{AnalysisTemplate, ExecutionOutcome, GraphSchema};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const OPENERS: [&str; 5] = [
    prompts::SCHEMA_SUMMARY,
    prompts::REQUIREMENTS,
    prompts::USE_CASES,
    prompts::TEMPLATES,
    prompts::REPORT,
];

fn opener_of(prompt: &str) -> Option<&'static str> {
    OPENERS.into_iter().find(|o| prompt.starts_with(o))
}

#[derive(Debug, Default)]
struct TextInner {
    /// Remaining scripted failures per prompt opener
    fail_budget: HashMap<&'static str, u32>,
    /// Calls observed per prompt opener
    calls: HashMap<&'static str, u32>,
}

/// Text-generation mock routed on prompt openers
#[derive(Debug, Default)]
pub struct MockTextGeneration {
    inner: Mutex<TextInner>,
}

impl MockTextGeneration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` calls whose prompt starts with `opener`
    pub fn fail_next(&self, opener: &'static str, n: u32) {
        self.inner.lock().fail_budget.insert(opener, n);
    }

    /// Calls observed so far for an opener
    #[must_use]
    pub fn calls(&self, opener: &str) -> u32 {
        self.inner.lock().calls.get(opener).copied().unwrap_or(0)
    }

    fn respond(opener: &'static str) -> String {
        match opener {
            prompts::SCHEMA_SUMMARY => {
                "Retail graph: customers place orders containing products.".to_string()
            }
            prompts::REQUIREMENTS => serde_json::to_string(&fixtures::sample_requirements())
                .expect("fixture serializes"),
            prompts::USE_CASES => {
                serde_json::to_string(&fixtures::sample_use_cases()).expect("fixture serializes")
            }
            prompts::TEMPLATES => {
                serde_json::to_string(&fixtures::sample_templates()).expect("fixture serializes")
            }
            prompts::REPORT => {
                "The analysis indicates stable order volume with regional churn pockets."
                    .to_string()
            }
            _ => unreachable!("unrouted opener"),
        }
    }
}

#[async_trait]
impl TextGenerationClient for MockTextGeneration {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<Generation, GenerationError> {
        let opener = opener_of(prompt)
            .ok_or_else(|| GenerationError::Failed(format!("unrouted prompt: {prompt:.40}")))?;

        {
            let mut inner = self.inner.lock();
            *inner.calls.entry(opener).or_insert(0) += 1;
            if let Some(budget) = inner.fail_budget.get_mut(opener) {
                if *budget > 0 {
                    *budget -= 1;
                    return Err(GenerationError::Failed("scripted failure".into()));
                }
            }
        }

        Ok(Generation {
            content: Self::respond(opener),
            token_usage: TokenUsage {
                prompt_tokens: (prompt.len() / 4) as u64,
                completion_tokens: 64,
            },
            cost_estimate: 0.0005,
        })
    }
}

/// Schema-extraction mock returning a fixed schema
#[derive(Debug)]
pub struct MockSchemaClient {
    schema: GraphSchema,
    fail_budget: Mutex<u32>,
    calls: Mutex<u32>,
}

impl MockSchemaClient {
    #[must_use]
    pub fn new(schema: GraphSchema) -> Self {
        Self {
            schema,
            fail_budget: Mutex::new(0),
            calls: Mutex::new(0),
        }
    }

    /// Fail the next `n` extraction calls
    pub fn fail_next(&self, n: u32) {
        *self.fail_budget.lock() = n;
    }

    #[must_use]
    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

impl Default for MockSchemaClient {
    fn default() -> Self {
        Self::new(fixtures::sample_schema())
    }
}

#[async_trait]
impl SchemaExtractionClient for MockSchemaClient {
    async fn extract(&self) -> Result<GraphSchema, SchemaClientError> {
        *self.calls.lock() += 1;
        {
            let mut budget = self.fail_budget.lock();
            if *budget > 0 {
                *budget -= 1;
                return Err(SchemaClientError::Connection("scripted failure".into()));
            }
        }
        Ok(self.schema.clone())
    }
}

#[derive(Debug, Default)]
struct ExecutionInner {
    deploy_calls: u32,
    load_calls: u32,
    /// Remaining scripted failures per template id
    fail_budget: HashMap<String, u32>,
    /// Simulated execution latency per template id
    latency: HashMap<String, Duration>,
    /// (target, template id) pairs persisted via `store`
    stored: Vec<(String, String)>,
}

/// Analytics-engine mock with per-template latency and failure scripts
#[derive(Debug, Default)]
pub struct MockExecutionClient {
    inner: Mutex<ExecutionInner>,
}

impl MockExecutionClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` executions of a template
    pub fn fail_next(&self, template_id: &str, n: u32) {
        self.inner.lock().fail_budget.insert(template_id.to_string(), n);
    }

    /// Sleep this long inside `await_completion` for a template
    pub fn set_latency(&self, template_id: &str, latency: Duration) {
        self.inner.lock().latency.insert(template_id.to_string(), latency);
    }

    #[must_use]
    pub fn deploy_calls(&self) -> u32 {
        self.inner.lock().deploy_calls
    }

    #[must_use]
    pub fn load_calls(&self) -> u32 {
        self.inner.lock().load_calls
    }

    /// (target, template id) pairs persisted via `store`, in call order
    #[must_use]
    pub fn stored(&self) -> Vec<(String, String)> {
        self.inner.lock().stored.clone()
    }
}

#[async_trait]
impl AnalysisExecutionClient for MockExecutionClient {
    async fn deploy(&self) -> Result<(), ExecutionClientError> {
        self.inner.lock().deploy_calls += 1;
        Ok(())
    }

    async fn load(&self, _schema: &GraphSchema) -> Result<(), ExecutionClientError> {
        self.inner.lock().load_calls += 1;
        Ok(())
    }

    async fn execute(
        &self,
        template: &AnalysisTemplate,
    ) -> Result<ExecutionJob, ExecutionClientError> {
        {
            let mut inner = self.inner.lock();
            if let Some(budget) = inner.fail_budget.get_mut(&template.id) {
                if *budget > 0 {
                    *budget -= 1;
                    return Err(ExecutionClientError::Execution(format!(
                        "scripted failure for {}",
                        template.id
                    )));
                }
            }
        }
        Ok(ExecutionJob {
            job_id: format!("job-{}", template.id),
            template_id: template.id.clone(),
        })
    }

    async fn await_completion(
        &self,
        job: &ExecutionJob,
    ) -> Result<ExecutionOutcome, ExecutionClientError> {
        let latency = self
            .inner
            .lock()
            .latency
            .get(&job.template_id)
            .copied()
            .unwrap_or(Duration::ZERO);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(ExecutionOutcome {
            template_id: job.template_id.clone(),
            job_id: job.job_id.clone(),
            records: json!([{"rows": 1}]),
            duration_ms: latency.as_millis() as u64,
        })
    }

    async fn store(
        &self,
        outcome: &ExecutionOutcome,
        target: &str,
    ) -> Result<(), ExecutionClientError> {
        self.inner
            .lock()
            .stored
            .push((target.to_string(), outcome.template_id.clone()));
        Ok(())
    }
}

/// Full healthy client set plus handles to each mock for scripting
#[must_use]
pub fn mock_client_set() -> (
    ClientSet,
    Arc<MockTextGeneration>,
    Arc<MockSchemaClient>,
    Arc<MockExecutionClient>,
) {
    let text = Arc::new(MockTextGeneration::new());
    let schema = Arc::new(MockSchemaClient::default());
    let execution = Arc::new(MockExecutionClient::new());
    let clients = ClientSet {
        text: text.clone(),
        schema: schema.clone(),
        execution: execution.clone(),
    };
    (clients, text, schema, execution)
}
