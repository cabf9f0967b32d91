//! Deterministic result ordering under parallel dispatch
//!
//! Fan-out results must land in submission order regardless of task
//! completion order, so two runs over the same inputs produce identical
//! artifact sequences.

use pretty_assertions::assert_eq;
use reqflow_core::prelude::*;
use reqflow_test_utils::{fixtures, init_tracing, mocks::mock_client_set};
use std::time::Duration;

fn options(dir: &tempfile::TempDir) -> WorkflowOptions {
    WorkflowOptions::new().with_checkpoint_dir(dir.path())
}

/// Latency inversely proportional to submission order: the first template
/// finishes last.
fn invert_latencies(execution: &reqflow_test_utils::MockExecutionClient) {
    execution.set_latency("TPL-1", Duration::from_millis(120));
    execution.set_latency("TPL-2", Duration::from_millis(60));
    execution.set_latency("TPL-3", Duration::ZERO);
}

#[tokio::test]
async fn outcomes_follow_submission_order_not_completion_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, execution) = mock_client_set();
    invert_latencies(&execution);

    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));
    let state = workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    let outcome_ids: Vec<&str> = state
        .artifacts
        .outcomes
        .iter()
        .map(|o| o.template_id.as_str())
        .collect();
    assert_eq!(outcome_ids, vec!["TPL-1", "TPL-2", "TPL-3"]);

    let report_ids: Vec<&str> = state
        .artifacts
        .reports
        .iter()
        .map(|r| r.template_id.as_str())
        .collect();
    assert_eq!(report_ids, vec!["TPL-1", "TPL-2", "TPL-3"]);

    // Fan-out steps settle in submission order too
    let execution_steps: Vec<&str> = state
        .completed_steps
        .iter()
        .filter(|s| s.starts_with("template_execution:"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        execution_steps,
        vec![
            "template_execution:1",
            "template_execution:2",
            "template_execution:3"
        ]
    );
}

#[tokio::test]
async fn concurrency_cap_preserves_order_and_result_set() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, execution) = mock_client_set();
    invert_latencies(&execution);

    let mut workflow =
        AnalysisWorkflow::new(clients, options(&dir).with_max_concurrent_tasks(1));
    let state = workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    let outcome_ids: Vec<&str> = state
        .artifacts
        .outcomes
        .iter()
        .map(|o| o.template_id.as_str())
        .collect();
    assert_eq!(outcome_ids, vec!["TPL-1", "TPL-2", "TPL-3"]);
}

#[tokio::test]
async fn sequential_and_parallel_runs_agree_on_artifacts() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let database = DatabaseConfig::new("retail");

    let (clients, _text, _schema, execution) = mock_client_set();
    invert_latencies(&execution);
    let mut parallel = AnalysisWorkflow::new(clients, options(&dir));
    let parallel_state = parallel
        .run_async(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();

    let (clients, _text, _schema, execution) = mock_client_set();
    invert_latencies(&execution);
    let mut sequential = AnalysisWorkflow::new(clients, options(&dir));
    let sequential_state = sequential
        .run(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();

    assert_eq!(parallel_state.status, WorkflowStatus::Completed);
    assert_eq!(sequential_state.status, WorkflowStatus::Completed);
    assert_eq!(parallel_state.artifacts, sequential_state.artifacts);
    assert_eq!(
        parallel_state.completed_steps,
        sequential_state.completed_steps
    );
}

#[tokio::test]
async fn disabling_parallelism_in_options_still_completes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, execution) = mock_client_set();
    invert_latencies(&execution);

    let mut workflow =
        AnalysisWorkflow::new(clients, options(&dir).with_parallelism(false));
    let state = workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.artifacts.outcomes.len(), 3);
}
