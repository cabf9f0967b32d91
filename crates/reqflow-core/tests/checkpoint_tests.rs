//! Checkpoint, pause and resume tests

use pretty_assertions::assert_eq;
use reqflow_core::prelude::*;
use reqflow_core::{CheckpointError, CheckpointStore};
use reqflow_model::{
    ArtifactUpdate, ExecutionOutcome, StateMutation, WorkerFault, WorkflowState,
};
use reqflow_test_utils::{fixtures, init_tracing, mocks::mock_client_set};

fn options(dir: &tempfile::TempDir) -> WorkflowOptions {
    WorkflowOptions::new().with_checkpoint_dir(dir.path())
}

#[tokio::test]
async fn checkpoint_restores_the_exact_state() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));

    let state = workflow
        .run_async(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();
    assert_eq!(state.status, WorkflowStatus::Completed);

    let path = workflow.export_checkpoint().await.unwrap();
    let restored = CheckpointStore::load(&path).await.unwrap();
    assert_eq!(state, restored);

    // Export to an explicit path round-trips identically
    let exported = dir.path().join("export").join("final.json");
    workflow.export_checkpoint_to(&exported).await.unwrap();
    let restored = CheckpointStore::load(&exported).await.unwrap();
    assert_eq!(state, restored);
}

#[tokio::test]
async fn pause_before_first_phase_then_resume_completes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));
    let database = DatabaseConfig::new("retail");

    workflow.cancel_handle().cancel();
    let state = workflow
        .run_async(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();
    assert_eq!(state.status, WorkflowStatus::Paused);
    assert!(state.completed_steps.is_empty());

    let state = workflow
        .resume(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();
    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.completed_steps.len(), 10);
}

#[tokio::test]
async fn resume_from_checkpoint_skips_completed_phases() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    // A workflow paused after schema analysis settled
    let mut schema = fixtures::sample_schema();
    schema.summary = "Retail graph.".into();
    let mut paused = WorkflowState::new();
    paused
        .apply(StateMutation::StatusChanged {
            status: WorkflowStatus::InProgress,
        })
        .unwrap();
    paused
        .apply(StateMutation::StepStarted {
            step: "schema_analysis".into(),
        })
        .unwrap();
    paused
        .apply(StateMutation::StepSucceeded {
            step: "schema_analysis".into(),
            payload: serde_json::json!({"schema": schema}),
        })
        .unwrap();
    paused
        .apply(StateMutation::ArtifactStored {
            update: ArtifactUpdate::Schema(schema),
        })
        .unwrap();
    paused
        .apply(StateMutation::StatusChanged {
            status: WorkflowStatus::Paused,
        })
        .unwrap();
    let restored_version = paused.version;
    let path = CheckpointStore::new(dir.path()).save(&paused).await.unwrap();

    let (clients, _text, schema_client, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::from_checkpoint(&path, clients, options(&dir))
        .await
        .unwrap();
    assert_eq!(workflow.state().workflow_id, paused.workflow_id);

    let state = workflow
        .resume(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    // The completed phase was skipped, not re-dispatched
    assert_eq!(schema_client.calls(), 0);
    assert_eq!(state.step_results["schema_analysis"].attempt_count, 1);
    let schema_steps = state
        .completed_steps
        .iter()
        .filter(|s| s.as_str() == "schema_analysis")
        .count();
    assert_eq!(schema_steps, 1);
    assert_eq!(state.completed_steps.len(), 10);
    assert!(state.version > restored_version);
}

#[tokio::test]
async fn resume_past_a_settled_best_effort_phase_keeps_one_fault_per_step() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    // A workflow paused after template execution settled with one task
    // exhausted (tolerated: 1/3 under the threshold) and its fault recorded
    let mut schema = fixtures::sample_schema();
    schema.summary = "Retail graph.".into();
    let templates = fixtures::sample_templates();

    let mut paused = WorkflowState::new();
    paused
        .apply(StateMutation::StatusChanged {
            status: WorkflowStatus::InProgress,
        })
        .unwrap();
    for step in [
        "schema_analysis",
        "requirements_extraction",
        "use_case_generation",
        "template_generation",
    ] {
        paused
            .apply(StateMutation::StepStarted { step: step.into() })
            .unwrap();
        paused
            .apply(StateMutation::StepSucceeded {
                step: step.into(),
                payload: serde_json::json!({}),
            })
            .unwrap();
    }
    paused
        .apply(StateMutation::ArtifactStored {
            update: ArtifactUpdate::Schema(schema),
        })
        .unwrap();
    paused
        .apply(StateMutation::ArtifactStored {
            update: ArtifactUpdate::Requirements(fixtures::sample_requirements()),
        })
        .unwrap();
    paused
        .apply(StateMutation::ArtifactStored {
            update: ArtifactUpdate::UseCases(fixtures::sample_use_cases()),
        })
        .unwrap();
    paused
        .apply(StateMutation::ArtifactStored {
            update: ArtifactUpdate::Templates(templates.clone()),
        })
        .unwrap();

    for (step, template_id) in [("template_execution:1", "TPL-1"), ("template_execution:3", "TPL-3")]
    {
        paused
            .apply(StateMutation::StepStarted { step: step.into() })
            .unwrap();
        paused
            .apply(StateMutation::StepSucceeded {
                step: step.into(),
                payload: serde_json::json!({}),
            })
            .unwrap();
        paused
            .apply(StateMutation::ArtifactStored {
                update: ArtifactUpdate::Outcome(ExecutionOutcome {
                    template_id: template_id.into(),
                    job_id: format!("job-{template_id}"),
                    records: serde_json::json!([{"rows": 1}]),
                    duration_ms: 5,
                }),
            })
            .unwrap();
    }
    // The exhausted task: full attempt budget spent, one fault on record
    for _ in 0..3 {
        paused
            .apply(StateMutation::StepStarted {
                step: "template_execution:2".into(),
            })
            .unwrap();
        paused
            .apply(StateMutation::StepFailed {
                step: "template_execution:2".into(),
                error: "execution failed: scripted failure for TPL-2".into(),
            })
            .unwrap();
    }
    paused
        .apply(StateMutation::FaultRecorded {
            worker: "template-execution".into(),
            fault: WorkerFault::new(
                "template_execution:2",
                "execution failed: scripted failure for TPL-2",
            ),
        })
        .unwrap();
    paused
        .apply(StateMutation::StatusChanged {
            status: WorkflowStatus::Paused,
        })
        .unwrap();
    let path = CheckpointStore::new(dir.path()).save(&paused).await.unwrap();

    let (clients, _text, _schema, execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::from_checkpoint(&path, clients, options(&dir))
        .await
        .unwrap();
    let state = workflow
        .resume(&fixtures::sample_documents(), &DatabaseConfig::new("retail"))
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    // Re-judging the settled phase neither re-dispatches the exhausted
    // task nor duplicates its fault
    assert_eq!(state.step_results["template_execution:2"].attempt_count, 3);
    assert_eq!(state.errors["template-execution"].len(), 1);
    assert_eq!(state.fault_count(), 1);
    assert_eq!(execution.deploy_calls(), 0);
    assert_eq!(state.artifacts.reports.len(), 2);
}

#[tokio::test]
async fn resuming_a_terminal_workflow_is_a_no_op() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (clients, _text, _schema, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::new(clients, options(&dir));
    let database = DatabaseConfig::new("retail");

    let final_version = workflow
        .run_async(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .version;
    let path = workflow.export_checkpoint().await.unwrap();

    let (clients, text, schema_client, _execution) = mock_client_set();
    let mut workflow = AnalysisWorkflow::from_checkpoint(&path, clients, options(&dir))
        .await
        .unwrap();
    let state = workflow
        .run_async(&fixtures::sample_documents(), &database)
        .await
        .unwrap()
        .clone();

    assert_eq!(state.status, WorkflowStatus::Completed);
    assert_eq!(state.version, final_version);
    assert_eq!(schema_client.calls(), 0);
    assert_eq!(text.calls(reqflow_core::worker::prompts::REQUIREMENTS), 0);
}

#[tokio::test]
async fn corrupt_checkpoint_is_rejected_on_restore() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    tokio::fs::write(&path, b"{\"format_version\": 1, \"oops\":")
        .await
        .unwrap();

    let (clients, _text, _schema, _execution) = mock_client_set();
    let err = AnalysisWorkflow::from_checkpoint(&path, clients, options(&dir))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Checkpoint(CheckpointError::Corrupt(_))
    ));
}

#[tokio::test]
async fn missing_checkpoint_is_not_found() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-saved.json");

    let (clients, _text, _schema, _execution) = mock_client_set();
    let err = AnalysisWorkflow::from_checkpoint(&path, clients, options(&dir))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Checkpoint(CheckpointError::NotFound(_))
    ));
}
