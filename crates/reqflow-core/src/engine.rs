//! Concurrency engine
//!
//! Executes a phase's independent tasks concurrently. Guarantees:
//! - every task is spawned before any is awaited (true fan-out);
//! - results come back in submission order regardless of completion order,
//!   so downstream numbering stays deterministic;
//! - one task's failure or panic never cancels siblings; the phase is
//!   judged only after all tasks settle.
//!
//! Tasks only read state snapshots and return messages; the supervisor
//! applies all writes strictly after `run_parallel` returns.

use crate::worker::{Worker, SUPERVISOR};
use reqflow_model::{Message, WorkflowState};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// One worker invocation against an isolated snapshot
pub struct TaskSpec {
    pub step_name: String,
    pub message: Message,
    pub worker: Arc<dyn Worker>,
    pub snapshot: Arc<WorkflowState>,
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpec")
            .field("step_name", &self.step_name)
            .field("message_id", &self.message.id)
            .finish_non_exhaustive()
    }
}

/// Fan-out/fan-in executor for parallel phases
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyEngine {
    /// 0 = unbounded
    max_concurrent: usize,
}

impl ConcurrencyEngine {
    /// Engine with a concurrency cap (0 for unbounded)
    #[inline]
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self { max_concurrent }
    }

    /// Run one task in its own tokio task, isolating panics
    pub async fn run_single(&self, task: TaskSpec) -> Message {
        let mut results = self.run_parallel(vec![task]).await;
        // run_parallel returns exactly one message per submitted task
        results.remove(0)
    }

    /// Launch all tasks, then join them in submission order
    pub async fn run_parallel(&self, tasks: Vec<TaskSpec>) -> Vec<Message> {
        let semaphore = (self.max_concurrent > 0)
            .then(|| Arc::new(Semaphore::new(self.max_concurrent)));

        let mut origins = Vec::with_capacity(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let semaphore = semaphore.clone();
            origins.push((task.worker.role(), task.message.id));
            handles.push(tokio::spawn(async move {
                let _permit = match &semaphore {
                    Some(s) => s.acquire().await.ok(),
                    None => None,
                };
                task.worker.process(&task.message, &task.snapshot).await
            }));
        }

        let joined = futures::future::join_all(handles).await;
        origins
            .into_iter()
            .zip(joined)
            .map(|((role, task_id), outcome)| match outcome {
                Ok(message) => message,
                Err(join_err) => {
                    tracing::error!(worker = %role, error = %join_err, "task panicked");
                    Message::error(
                        role.as_str(),
                        SUPERVISOR,
                        task_id,
                        json!({"error": format!("task aborted: {join_err}")}),
                    )
                }
            })
            .collect()
    }
}

impl Default for ConcurrencyEngine {
    fn default() -> Self {
        Self::new(0)
    }
}
