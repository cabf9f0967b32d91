//! Public workflow facade
//!
//! [`AnalysisWorkflow`] wires clients, workers, supervisor, trace collector
//! and cancellation into one handle. `run` forces sequential dispatch for
//! every phase; `run_async` honors the configured parallelism for fan-out
//! phases. Either way the workflow always settles into a terminal or
//! paused state; worker failures never surface as `Err`.

use crate::checkpoint::CheckpointStore;
use crate::config::{DatabaseConfig, WorkflowOptions};
use crate::error::WorkflowError;
use crate::supervisor::{CancellationHandle, Supervisor};
use crate::trace::{TraceCollector, TraceSummary};
use crate::worker::{build_workers, ClientSet};
use reqflow_clients::DocumentSource;
use reqflow_model::{PhaseKind, PhasePlan, TraceEvent, WorkerRole, WorkflowState, WorkflowStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Coarse progress view over a running or restored workflow
///
/// `total_steps` grows as fan-out widths become knowable: before templates
/// exist the execution and reporting phases contribute zero steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowProgress {
    pub status: WorkflowStatus,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub current_phase: Option<String>,
}

/// End-to-end requirements-to-analysis workflow handle
pub struct AnalysisWorkflow {
    supervisor: Supervisor,
    trace: Arc<TraceCollector>,
    cancel: CancellationHandle,
    parallel: bool,
}

impl std::fmt::Debug for AnalysisWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisWorkflow")
            .field("supervisor", &self.supervisor)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

impl AnalysisWorkflow {
    /// Workflow over the given external-service clients
    #[must_use]
    pub fn new(clients: ClientSet, options: WorkflowOptions) -> Self {
        let trace = Arc::new(TraceCollector::new());
        let cancel = CancellationHandle::new();
        let workers = build_workers(&clients, trace.clone(), options.generation.clone());
        let parallel = options.enable_parallelism;
        let supervisor = Supervisor::new(workers, options, trace.clone(), cancel.clone());
        Self {
            supervisor,
            trace,
            cancel,
            parallel,
        }
    }

    /// Restore a workflow from a checkpoint file
    ///
    /// # Errors
    /// - [`CheckpointError`](crate::error::CheckpointError) variants,
    ///   wrapped in [`WorkflowError::Checkpoint`], when the file is
    ///   missing or corrupt
    pub async fn from_checkpoint(
        path: &Path,
        clients: ClientSet,
        options: WorkflowOptions,
    ) -> Result<Self, WorkflowError> {
        let state = CheckpointStore::load(path).await?;
        tracing::info!(
            workflow_id = %state.workflow_id,
            status = %state.status,
            version = state.version,
            "workflow restored from checkpoint"
        );
        let trace = Arc::new(TraceCollector::new());
        let cancel = CancellationHandle::new();
        let workers = build_workers(&clients, trace.clone(), options.generation.clone());
        let parallel = options.enable_parallelism;
        let supervisor =
            Supervisor::new(workers, options, trace.clone(), cancel.clone()).with_state(state);
        Ok(Self {
            supervisor,
            trace,
            cancel,
            parallel,
        })
    }

    /// Run all phases sequentially, one task at a time
    ///
    /// # Errors
    /// Only checkpoint and state programming faults; a failed workflow
    /// returns `Ok` with status `Failed`.
    pub async fn run(
        &mut self,
        documents: &[DocumentSource],
        database: &DatabaseConfig,
    ) -> Result<&WorkflowState, WorkflowError> {
        self.supervisor.run(documents, database, false).await?;
        Ok(self.supervisor.state())
    }

    /// Run all phases, fanning out parallel phases when parallelism is
    /// enabled in the options
    pub async fn run_async(
        &mut self,
        documents: &[DocumentSource],
        database: &DatabaseConfig,
    ) -> Result<&WorkflowState, WorkflowError> {
        self.supervisor
            .run(documents, database, self.parallel)
            .await?;
        Ok(self.supervisor.state())
    }

    /// Clear any pause signal and continue from the current state.
    ///
    /// Already-completed phases are skipped; an interrupted fan-out phase
    /// restarts whole.
    pub async fn resume(
        &mut self,
        documents: &[DocumentSource],
        database: &DatabaseConfig,
    ) -> Result<&WorkflowState, WorkflowError> {
        self.cancel.reset();
        self.run_async(documents, database).await
    }

    /// Snapshot of workflow progress
    #[must_use]
    pub fn progress(&self) -> WorkflowProgress {
        progress_of(self.supervisor.plan(), self.supervisor.state())
    }

    /// Persist the current state, returning the checkpoint path
    pub async fn export_checkpoint(&self) -> Result<PathBuf, WorkflowError> {
        self.supervisor.save_checkpoint().await
    }

    /// Persist the current state to an explicit path
    pub async fn export_checkpoint_to(&self, path: &Path) -> Result<(), WorkflowError> {
        self.supervisor.save_checkpoint_to(path).await
    }

    /// Handle for requesting a pause at the next phase boundary
    #[inline]
    #[must_use]
    pub fn cancel_handle(&self) -> CancellationHandle {
        self.cancel.clone()
    }

    /// Current workflow state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        self.supervisor.state()
    }

    /// Consume the handle, yielding the final state
    #[inline]
    #[must_use]
    pub fn into_state(self) -> WorkflowState {
        self.supervisor.into_state()
    }

    /// All trace events recorded so far
    #[must_use]
    pub fn trace_events(&self) -> Vec<TraceEvent> {
        self.trace.events()
    }

    /// Aggregated per-worker timing and cost metrics
    #[must_use]
    pub fn trace_summary(&self) -> TraceSummary {
        self.trace.summary()
    }
}

fn progress_of(plan: &PhasePlan, state: &WorkflowState) -> WorkflowProgress {
    let total_steps = plan
        .phases()
        .iter()
        .map(|phase| match phase.kind {
            PhaseKind::Sequential => 1,
            PhaseKind::FanOut => match phase.role {
                WorkerRole::TemplateExecution => state.artifacts.templates.len(),
                WorkerRole::ReportGeneration => state.artifacts.outcomes.len(),
                _ => 1,
            },
        })
        .sum();
    WorkflowProgress {
        status: state.status,
        completed_steps: state.completed_steps.len(),
        total_steps,
        current_phase: state.current_phase.clone(),
    }
}
