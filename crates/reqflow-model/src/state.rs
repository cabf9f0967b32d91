//! Versioned workflow state
//!
//! [`WorkflowState`] is the single source of truth for a running workflow.
//! It has exactly one writer (the supervisor) and all writes go through
//! [`WorkflowState::apply`], which bumps the version on every mutation so
//! checkpoint conflicts are detectable. Workers only ever see read-only
//! snapshots.

use crate::artifacts::{
    AnalysisReport, AnalysisTemplate, ExecutionOutcome, GraphSchema, RequirementsSummary, UseCase,
    WorkflowArtifacts,
};
use crate::message::Message;
use crate::status::{validate_transition, WorkflowStatus};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// State-model errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Status transition not in the allowed table
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },

    /// Result/error message without a matching dispatched task
    #[error("message {0} replies to an unknown task")]
    UnknownReplyTarget(String),
}

/// Per-step execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Progress record for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    /// Dispatch attempts so far (1 on first dispatch)
    pub attempt_count: u32,
    pub error_message: Option<String>,
    pub payload: Value,
}

impl StepResult {
    /// Fresh pending record for a step
    #[must_use]
    pub fn pending(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Pending,
            attempt_count: 0,
            error_message: None,
            payload: Value::Null,
        }
    }

    /// Whether the step has settled
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, StepStatus::Succeeded | StepStatus::Failed)
    }
}

/// One recorded worker failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFault {
    pub step_name: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl WorkerFault {
    /// Record a fault for a step
    #[must_use]
    pub fn new(step_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Artifact deposited by a settled step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactUpdate {
    Schema(GraphSchema),
    Requirements(RequirementsSummary),
    UseCases(Vec<UseCase>),
    Templates(Vec<AnalysisTemplate>),
    Outcome(ExecutionOutcome),
    Report(AnalysisReport),
}

/// The only write path into [`WorkflowState`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMutation {
    /// Workflow status transition (validated)
    StatusChanged { status: WorkflowStatus },
    /// A phase began dispatching
    PhaseStarted { phase: String },
    /// A step was dispatched (increments attempt_count)
    StepStarted { step: String },
    /// A step settled successfully
    StepSucceeded { step: String, payload: Value },
    /// A step attempt failed
    StepFailed { step: String, error: String },
    /// A message was appended to the log
    MessageAppended { message: Message },
    /// A worker fault was recorded
    FaultRecorded { worker: String, fault: WorkerFault },
    /// An artifact was stored
    ArtifactStored { update: ArtifactUpdate },
}

/// Versioned, serializable record of workflow progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: Uuid,
    pub status: WorkflowStatus,
    pub current_phase: Option<String>,
    /// Ordered, append-only set of settled step names
    pub completed_steps: Vec<String>,
    /// Step name -> progress record, in dispatch order
    pub step_results: IndexMap<String, StepResult>,
    /// Append-only message log
    pub messages: Vec<Message>,
    /// Worker name -> recorded faults
    pub errors: BTreeMap<String, Vec<WorkerFault>>,
    pub artifacts: WorkflowArtifacts,
    /// Strictly increases on every mutation
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Create state for a new workflow
    #[must_use]
    pub fn new() -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            status: WorkflowStatus::NotStarted,
            current_phase: None,
            completed_steps: Vec::new(),
            step_results: IndexMap::new(),
            messages: Vec::new(),
            errors: BTreeMap::new(),
            artifacts: WorkflowArtifacts::default(),
            version: 0,
            created_at: Utc::now(),
        }
    }

    /// Apply one mutation, returning the new version
    ///
    /// # Errors
    /// - `StateError::IllegalTransition` on a disallowed status change
    pub fn apply(&mut self, mutation: StateMutation) -> Result<u64, StateError> {
        match mutation {
            StateMutation::StatusChanged { status } => {
                validate_transition(self.status, status)?;
                self.status = status;
            }
            StateMutation::PhaseStarted { phase } => {
                self.current_phase = Some(phase);
            }
            StateMutation::StepStarted { step } => {
                let entry = self
                    .step_results
                    .entry(step.clone())
                    .or_insert_with(|| StepResult::pending(step));
                entry.status = StepStatus::Running;
                entry.attempt_count += 1;
            }
            StateMutation::StepSucceeded { step, payload } => {
                let entry = self
                    .step_results
                    .entry(step.clone())
                    .or_insert_with(|| StepResult::pending(step.clone()));
                entry.status = StepStatus::Succeeded;
                entry.error_message = None;
                entry.payload = payload;
                if !self.completed_steps.contains(&step) {
                    self.completed_steps.push(step);
                }
            }
            StateMutation::StepFailed { step, error } => {
                let entry = self
                    .step_results
                    .entry(step.clone())
                    .or_insert_with(|| StepResult::pending(step));
                entry.status = StepStatus::Failed;
                entry.error_message = Some(error);
            }
            StateMutation::MessageAppended { message } => {
                self.messages.push(message);
            }
            StateMutation::FaultRecorded { worker, fault } => {
                self.errors.entry(worker).or_default().push(fault);
            }
            StateMutation::ArtifactStored { update } => match update {
                ArtifactUpdate::Schema(schema) => self.artifacts.schema = Some(schema),
                ArtifactUpdate::Requirements(reqs) => self.artifacts.requirements = Some(reqs),
                ArtifactUpdate::UseCases(cases) => self.artifacts.use_cases = cases,
                ArtifactUpdate::Templates(templates) => self.artifacts.templates = templates,
                ArtifactUpdate::Outcome(outcome) => self.artifacts.outcomes.push(outcome),
                ArtifactUpdate::Report(report) => self.artifacts.reports.push(report),
            },
        }

        self.version += 1;
        Ok(self.version)
    }

    /// Read-only copy handed to workers and the concurrency engine
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> WorkflowState {
        self.clone()
    }

    /// Whether a step has already settled successfully
    #[inline]
    #[must_use]
    pub fn step_completed(&self, step: &str) -> bool {
        self.completed_steps.iter().any(|s| s == step)
    }

    /// Total faults recorded across all workers
    #[must_use]
    pub fn fault_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}
