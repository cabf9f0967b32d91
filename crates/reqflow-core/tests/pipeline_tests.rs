//! End-to-end pipeline tests over scripted mock clients

use pretty_assertions::assert_eq;
use reqflow_core::prelude::*;
use reqflow_model::MessageKind;
use reqflow_test_utils::{fixtures, init_tracing, mocks::mock_client_set};

fn options(dir: &tempfile::TempDir) -> WorkflowOptions {
    WorkflowOptions::new().with_checkpoint_dir(dir.path())
}

#[tokio::test]
async fn happy_path_produces_all_artifacts() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));

    let database = DatabaseConfig::new("retail").with_store_target("warehouse/results");
    let state = workflow
        .run_async(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);

    let schema = state.artifacts.schema.as_ref().unwrap();
    assert_eq!(schema.node_types.len(), 3);
    assert!(!schema.summary.is_empty());

    let requirements = state.artifacts.requirements.as_ref().unwrap();
    assert_eq!(requirements.requirements.len(), 2);
    assert_eq!(state.artifacts.use_cases.len(), 2);
    assert_eq!(state.artifacts.templates.len(), 3);
    assert_eq!(state.artifacts.outcomes.len(), 3);
    assert_eq!(state.artifacts.reports.len(), 3);

    // 4 sequential steps + 3 executions + 3 reports
    assert_eq!(state.completed_steps.len(), 10);
    assert!(state.step_completed("schema_analysis"));
    assert!(state.step_completed("template_execution:3"));
    assert!(state.step_completed("report_generation:3"));
    assert!(state.errors.is_empty());

    // One deploy + load for the whole fan-out, not one per task
    assert_eq!(execution.deploy_calls(), 1);
    assert_eq!(execution.load_calls(), 1);

    // Every outcome was persisted to the configured target
    let stored = execution.stored();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|(target, _)| target == "warehouse/results"));
}

#[tokio::test]
async fn forced_sequential_run_matches_async_result() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));

    let database = DatabaseConfig::new("retail");
    let state = workflow
        .run(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.artifacts.outcomes.len(), 3);
    assert_eq!(state.artifacts.reports.len(), 3);
    // No store target configured: nothing persisted
    assert!(execution.stored().is_empty());
}

#[tokio::test]
async fn message_log_pairs_every_reply_with_its_task() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));

    let state = workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();

    assert!(!state.messages.is_empty());
    for message in &state.messages {
        match message.kind {
            MessageKind::Task => {
                assert_eq!(message.from_worker, "supervisor");
                assert!(message.reply_to.is_none());
            }
            MessageKind::Result | MessageKind::Error => {
                // Every reply answers a task that was logged before it
                let target = message.reply_to.expect("reply without target");
                let answered = state
                    .messages
                    .iter()
                    .take_while(|m| m.id != message.id)
                    .any(|m| m.id == target);
                assert!(answered, "reply {} precedes its task", message.id);
            }
        }
    }
}

#[tokio::test]
async fn progress_counts_steps_as_widths_become_known() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));

    let before = workflow.progress();
    assert_eq!(before.status, WorkflowStatus::NotStarted);
    assert_eq!(before.completed_steps, 0);
    assert_eq!(before.total_steps, 4);

    workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap();

    let after = workflow.progress();
    assert_eq!(after.status, WorkflowStatus::Completed);
    assert_eq!(after.completed_steps, 10);
    assert_eq!(after.total_steps, 10);
}

#[tokio::test]
async fn trace_records_usage_per_worker() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));

    workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap();

    let summary = workflow.trace_summary();
    assert!(summary.event_count > 0);
    assert!(summary.total_tokens > 0);
    assert!(summary.per_worker.contains_key("schema-analysis"));
    assert!(summary.per_worker.contains_key("report-generation"));
    // Phase timers are recorded under the supervisor
    assert!(summary.per_worker.contains_key("supervisor"));
    assert_eq!(summary.per_worker["supervisor"].calls, 6);
}
