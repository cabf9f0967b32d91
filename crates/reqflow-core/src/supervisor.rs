//! Supervisor
//!
//! Owns the phase plan, the worker registry and the workflow state.
//! Dispatches one message per sequential phase or fans out N messages
//! through the concurrency engine, applies every result to the state
//! (single-writer rule), persists a checkpoint after each phase settles,
//! and decides retry vs. escalate per the phase's required/best-effort
//! classification.
//!
//! Retry policy: immediate re-dispatch up to `max_retries` total attempts
//! per step, no backoff. Cancellation is honored only at phase boundaries;
//! in-flight tasks always finish.

use crate::checkpoint::CheckpointStore;
use crate::config::{DatabaseConfig, WorkflowOptions};
use crate::engine::{ConcurrencyEngine, TaskSpec};
use crate::error::WorkflowError;
use crate::trace::TraceCollector;
use crate::worker::{Worker, SUPERVISOR};
use reqflow_clients::DocumentSource;
use reqflow_model::{
    fan_out_step_name, ArtifactUpdate, Message, Phase, PhaseKind, PhasePlan, StateMutation,
    WorkerFault, WorkerRole, WorkflowState, WorkflowStatus,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative pause signal, honored at phase boundaries
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    flag: Arc<AtomicBool>,
}

impl CancellationHandle {
    /// Fresh, un-cancelled handle
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a pause before the next phase
    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a pause has been requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the signal (used when resuming)
    #[inline]
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Phase scheduler and sole writer of [`WorkflowState`]
pub struct Supervisor {
    plan: PhasePlan,
    workers: HashMap<WorkerRole, Arc<dyn Worker>>,
    engine: ConcurrencyEngine,
    checkpoints: CheckpointStore,
    trace: Arc<TraceCollector>,
    options: WorkflowOptions,
    cancel: CancellationHandle,
    state: WorkflowState,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("workflow_id", &self.state.workflow_id)
            .field("status", &self.state.status)
            .field("current_phase", &self.state.current_phase)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Supervisor for a fresh workflow
    #[must_use]
    pub fn new(
        workers: HashMap<WorkerRole, Arc<dyn Worker>>,
        options: WorkflowOptions,
        trace: Arc<TraceCollector>,
        cancel: CancellationHandle,
    ) -> Self {
        let engine = ConcurrencyEngine::new(options.max_concurrent_tasks);
        let checkpoints = CheckpointStore::new(&options.checkpoint_dir);
        Self {
            plan: PhasePlan::standard(),
            workers,
            engine,
            checkpoints,
            trace,
            options,
            cancel,
            state: WorkflowState::new(),
        }
    }

    /// Continue from a restored state (resume)
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: WorkflowState) -> Self {
        self.state = state;
        self
    }

    /// Current workflow state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Consume the supervisor, yielding the final state
    #[inline]
    #[must_use]
    pub fn into_state(self) -> WorkflowState {
        self.state
    }

    /// Phase plan driving this workflow
    #[inline]
    #[must_use]
    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Drive the workflow to a settled status.
    ///
    /// Worker-level failures never surface as `Err`; they end in a state
    /// with status `Failed` (required phase exhausted) or `Completed`
    /// (best-effort failures within threshold). Only checkpoint and state
    /// programming faults propagate.
    pub async fn run(
        &mut self,
        documents: &[DocumentSource],
        database: &DatabaseConfig,
        parallel: bool,
    ) -> Result<(), WorkflowError> {
        if self.state.status.is_terminal() {
            tracing::info!(status = %self.state.status, "workflow already terminal");
            return Ok(());
        }
        if matches!(
            self.state.status,
            WorkflowStatus::NotStarted | WorkflowStatus::Paused
        ) {
            self.apply(StateMutation::StatusChanged {
                status: WorkflowStatus::InProgress,
            })?;
        }

        for phase in self.plan.phases().to_vec() {
            if self.phase_complete(&phase) {
                tracing::debug!(phase = phase.name, "phase already complete, skipping");
                continue;
            }

            let outcome = if self.cancel.is_cancelled() {
                Err(WorkflowError::Cancelled)
            } else {
                self.apply(StateMutation::PhaseStarted {
                    phase: phase.name.to_string(),
                })?;
                let timer = format!("phase:{}", phase.name);
                self.trace.start_timer(&timer);
                let outcome = self.dispatch_phase(&phase, documents, database, parallel).await;
                self.trace.stop_and_record(&timer, "phase", SUPERVISOR);
                outcome
            };

            match outcome {
                Ok(()) => {
                    // Advance: InProgress -> InProgress
                    self.apply(StateMutation::StatusChanged {
                        status: WorkflowStatus::InProgress,
                    })?;
                    self.checkpoint().await?;
                    tracing::info!(phase = phase.name, "phase complete");
                }
                Err(WorkflowError::PhaseExhausted {
                    phase: name,
                    attempts,
                    error,
                }) => {
                    tracing::error!(phase = %name, attempts, error = %error, "required work exhausted");
                    self.apply(StateMutation::StatusChanged {
                        status: WorkflowStatus::Failed,
                    })?;
                    self.checkpoint().await?;
                    return Ok(());
                }
                Err(WorkflowError::Cancelled) => {
                    tracing::info!(phase = phase.name, "pause requested, stopping at phase boundary");
                    self.apply(StateMutation::StatusChanged {
                        status: WorkflowStatus::Paused,
                    })?;
                    self.checkpoint().await?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        self.apply(StateMutation::StatusChanged {
            status: WorkflowStatus::Completed,
        })?;
        self.checkpoint().await?;
        tracing::info!(workflow_id = %self.state.workflow_id, "workflow completed");
        Ok(())
    }

    /// Whether every step of a phase has already settled successfully
    fn phase_complete(&self, phase: &Phase) -> bool {
        match phase.kind {
            PhaseKind::Sequential => self.state.step_completed(phase.name),
            PhaseKind::FanOut => {
                let expected = self.expected_task_count(phase);
                expected > 0
                    && (1..=expected)
                        .all(|i| self.state.step_completed(&fan_out_step_name(phase.name, i)))
            }
        }
    }

    /// Fan-out width, knowable only once upstream artifacts exist
    fn expected_task_count(&self, phase: &Phase) -> usize {
        match phase.role {
            WorkerRole::TemplateExecution => self.state.artifacts.templates.len(),
            WorkerRole::ReportGeneration => self.state.artifacts.outcomes.len(),
            _ => 1,
        }
    }

    /// Dispatch one phase to completion, retrying failed steps in immediate
    /// rounds until each settles or exhausts its attempt budget
    async fn dispatch_phase(
        &mut self,
        phase: &Phase,
        documents: &[DocumentSource],
        database: &DatabaseConfig,
        parallel: bool,
    ) -> Result<(), WorkflowError> {
        let worker = self
            .workers
            .get(&phase.role)
            .cloned()
            .ok_or_else(|| WorkflowError::UnregisteredRole(phase.role.to_string()))?;

        let tasks = self.expand_tasks(phase, documents, database);
        if tasks.is_empty() {
            tracing::info!(phase = phase.name, "nothing to dispatch");
            return Ok(());
        }
        let fan_out = parallel && phase.kind == PhaseKind::FanOut;
        tracing::info!(
            phase = phase.name,
            tasks = tasks.len(),
            fan_out,
            "dispatching phase"
        );

        loop {
            let pending: Vec<(String, Value)> = tasks
                .iter()
                .filter(|(step, _)| {
                    !self.state.step_completed(step) && self.attempts(step) < self.options.max_retries
                })
                .cloned()
                .collect();
            if pending.is_empty() {
                break;
            }

            // Record dispatch before snapshotting so workers see a
            // consistent view of everything already applied.
            let mut step_names = Vec::with_capacity(pending.len());
            let mut messages = Vec::with_capacity(pending.len());
            for (step, payload) in &pending {
                self.apply(StateMutation::StepStarted { step: step.clone() })?;
                let message = Message::task(SUPERVISOR, phase.role.as_str(), payload.clone());
                self.apply(StateMutation::MessageAppended {
                    message: message.clone(),
                })?;
                step_names.push(step.clone());
                messages.push(message);
            }

            let snapshot = Arc::new(self.state.snapshot());
            let specs: Vec<TaskSpec> = step_names
                .iter()
                .zip(messages)
                .map(|(step, message)| TaskSpec {
                    step_name: step.clone(),
                    message,
                    worker: worker.clone(),
                    snapshot: snapshot.clone(),
                })
                .collect();

            // Fan-out: all tasks launched before any is awaited, results in
            // submission order. Forced-sequential: one at a time, same
            // panic isolation.
            let replies = if fan_out {
                self.engine.run_parallel(specs).await
            } else {
                let mut replies = Vec::with_capacity(specs.len());
                for spec in specs {
                    replies.push(self.engine.run_single(spec).await);
                }
                replies
            };

            // Single-writer apply step, strictly after the join
            for (step, reply) in step_names.iter().zip(replies) {
                self.append_reply(&reply)?;
                if reply.is_error() {
                    let error = reply
                        .error_text()
                        .unwrap_or("unknown worker error")
                        .to_string();
                    tracing::warn!(
                        step = %step,
                        attempt = self.attempts(step),
                        error = %error,
                        "step attempt failed"
                    );
                    self.apply(StateMutation::StepFailed {
                        step: step.clone(),
                        error,
                    })?;
                } else {
                    self.apply(StateMutation::StepSucceeded {
                        step: step.clone(),
                        payload: reply.content.clone(),
                    })?;
                    self.store_artifact(phase.role, &reply.content)?;
                }
            }
        }

        self.settle_phase(phase, &tasks)
    }

    /// Judge a settled phase against its required/best-effort class
    fn settle_phase(
        &mut self,
        phase: &Phase,
        tasks: &[(String, Value)],
    ) -> Result<(), WorkflowError> {
        let failed: Vec<String> = tasks
            .iter()
            .map(|(step, _)| step.clone())
            .filter(|step| !self.state.step_completed(step))
            .collect();
        if failed.is_empty() {
            return Ok(());
        }

        // Faults are recorded once per exhausted step, not per attempt.
        // A resume pass re-judges an already-settled phase, so steps whose
        // fault is on record are not recorded again.
        let mut first_error = String::new();
        for step in &failed {
            let error = self
                .state
                .step_results
                .get(step)
                .and_then(|r| r.error_message.clone())
                .unwrap_or_else(|| "retry budget exhausted".to_string());
            if first_error.is_empty() {
                first_error.clone_from(&error);
            }
            let on_record = self
                .state
                .errors
                .get(phase.role.as_str())
                .is_some_and(|faults| faults.iter().any(|f| f.step_name == *step));
            if !on_record {
                self.apply(StateMutation::FaultRecorded {
                    worker: phase.role.as_str().to_string(),
                    fault: WorkerFault::new(step.clone(), error),
                })?;
            }
        }

        let fraction = failed.len() as f64 / tasks.len() as f64;
        if phase.required || fraction > self.options.best_effort_failure_threshold {
            return Err(WorkflowError::PhaseExhausted {
                phase: phase.name.to_string(),
                attempts: self.options.max_retries,
                error: first_error,
            });
        }

        tracing::warn!(
            phase = phase.name,
            failed = failed.len(),
            total = tasks.len(),
            "best-effort phase advanced with failures"
        );
        Ok(())
    }

    /// Expand a phase into its (step name, task payload) list
    fn expand_tasks(
        &self,
        phase: &Phase,
        documents: &[DocumentSource],
        database: &DatabaseConfig,
    ) -> Vec<(String, Value)> {
        match phase.role {
            WorkerRole::SchemaAnalysis => vec![(
                phase.name.to_string(),
                json!({"op": "analyze_schema", "graph": database.graph_name}),
            )],
            WorkerRole::RequirementsExtraction => vec![(
                phase.name.to_string(),
                json!({"op": "extract_requirements", "documents": documents}),
            )],
            WorkerRole::UseCaseGeneration => vec![(
                phase.name.to_string(),
                json!({"op": "derive_use_cases"}),
            )],
            WorkerRole::TemplateGeneration => vec![(
                phase.name.to_string(),
                json!({"op": "generate_templates"}),
            )],
            WorkerRole::TemplateExecution => self
                .state
                .artifacts
                .templates
                .iter()
                .enumerate()
                .map(|(i, template)| {
                    (
                        fan_out_step_name(phase.name, i + 1),
                        json!({
                            "op": "execute_template",
                            "template": template,
                            "target": database.store_target,
                        }),
                    )
                })
                .collect(),
            WorkerRole::ReportGeneration => self
                .state
                .artifacts
                .outcomes
                .iter()
                .enumerate()
                .map(|(i, outcome)| {
                    (
                        fan_out_step_name(phase.name, i + 1),
                        json!({"op": "write_report", "outcome": outcome}),
                    )
                })
                .collect(),
        }
    }

    /// Store the typed artifact a result message carries for its role
    fn store_artifact(&mut self, role: WorkerRole, content: &Value) -> Result<(), WorkflowError> {
        fn field<T: serde::de::DeserializeOwned>(
            content: &Value,
            name: &str,
        ) -> Result<T, WorkflowError> {
            let value = content
                .get(name)
                .ok_or_else(|| WorkflowError::MalformedResult(format!("missing '{name}'")))?;
            serde_json::from_value(value.clone())
                .map_err(|e| WorkflowError::MalformedResult(format!("'{name}': {e}")))
        }

        let update = match role {
            WorkerRole::SchemaAnalysis => ArtifactUpdate::Schema(field(content, "schema")?),
            WorkerRole::RequirementsExtraction => {
                ArtifactUpdate::Requirements(field(content, "requirements")?)
            }
            WorkerRole::UseCaseGeneration => ArtifactUpdate::UseCases(field(content, "use_cases")?),
            WorkerRole::TemplateGeneration => {
                ArtifactUpdate::Templates(field(content, "templates")?)
            }
            WorkerRole::TemplateExecution => ArtifactUpdate::Outcome(field(content, "outcome")?),
            WorkerRole::ReportGeneration => ArtifactUpdate::Report(field(content, "report")?),
        };
        self.apply(StateMutation::ArtifactStored { update })
    }

    /// Append a reply after verifying it answers a dispatched task
    fn append_reply(&mut self, reply: &Message) -> Result<(), WorkflowError> {
        if let Some(reply_to) = reply.reply_to {
            if !self.state.messages.iter().any(|m| m.id == reply_to) {
                return Err(reqflow_model::StateError::UnknownReplyTarget(
                    reply_to.to_string(),
                )
                .into());
            }
        }
        self.apply(StateMutation::MessageAppended {
            message: reply.clone(),
        })
    }

    fn attempts(&self, step: &str) -> u32 {
        self.state
            .step_results
            .get(step)
            .map_or(0, |r| r.attempt_count)
    }

    fn apply(&mut self, mutation: StateMutation) -> Result<(), WorkflowError> {
        self.state.apply(mutation)?;
        Ok(())
    }

    async fn checkpoint(&self) -> Result<(), WorkflowError> {
        self.checkpoints.save(&self.state).await?;
        Ok(())
    }

    /// Persist the current state on demand, returning the checkpoint path
    pub async fn save_checkpoint(&self) -> Result<std::path::PathBuf, WorkflowError> {
        Ok(self.checkpoints.save(&self.state).await?)
    }

    /// Persist the current state to an explicit path (checkpoint export)
    pub async fn save_checkpoint_to(&self, path: &std::path::Path) -> Result<(), WorkflowError> {
        Ok(self.checkpoints.save_to(&self.state, path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_handle_round_trip() {
        let handle = CancellationHandle::new();
        assert!(!handle.is_cancelled());

        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());

        handle.reset();
        assert!(!clone.is_cancelled());
    }
}
