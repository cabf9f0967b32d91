//! Checkpoint store
//!
//! Persists a versioned snapshot of [`WorkflowState`] after every phase,
//! keyed by workflow id. Writes are atomic (write to a temp file, then
//! rename) so a crash mid-write never yields a corrupt checkpoint. Loading
//! validates the format tag and fails with [`CheckpointError::Corrupt`] on
//! any anomaly rather than reconstructing partial state.
//!
//! Resume granularity is whole-phase: a parallel phase interrupted mid-run
//! restarts all of its tasks.

use crate::error::CheckpointError;
use chrono::{DateTime, Utc};
use reqflow_model::WorkflowState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Checkpoint file format tag; bumped on incompatible layout changes
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointEnvelope {
    format_version: u32,
    workflow_id: Uuid,
    saved_at: DateTime<Utc>,
    state: WorkflowState,
}

/// Filesystem-backed checkpoint store
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `dir` (created on first save)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Checkpoint path for a workflow id
    #[must_use]
    pub fn path_for(&self, workflow_id: Uuid) -> PathBuf {
        self.dir.join(format!("{workflow_id}.json"))
    }

    /// Persist a snapshot under the workflow's handle
    ///
    /// # Errors
    /// - `CheckpointError::Io` on filesystem failure
    /// - `CheckpointError::Serialize` if the state cannot be encoded
    pub async fn save(&self, state: &WorkflowState) -> Result<PathBuf, CheckpointError> {
        let path = self.path_for(state.workflow_id);
        self.save_to(state, &path).await?;
        Ok(path)
    }

    /// Persist a snapshot to an explicit path (checkpoint export)
    pub async fn save_to(
        &self,
        state: &WorkflowState,
        path: &Path,
    ) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let envelope = CheckpointEnvelope {
            format_version: CHECKPOINT_FORMAT_VERSION,
            workflow_id: state.workflow_id,
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let encoded = serde_json::to_vec_pretty(&envelope)?;

        // Atomic write-replace: never expose a half-written checkpoint.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::debug!(
            workflow_id = %state.workflow_id,
            version = state.version,
            path = %path.display(),
            "checkpoint saved"
        );
        Ok(())
    }

    /// Reload a snapshot, validating the format tag
    ///
    /// # Errors
    /// - `CheckpointError::NotFound` if no file exists at `path`
    /// - `CheckpointError::Corrupt` on any parse or validation anomaly
    pub async fn load(path: &Path) -> Result<WorkflowState, CheckpointError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(CheckpointError::Io(e)),
        };

        let envelope: CheckpointEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| CheckpointError::Corrupt(format!("unparseable checkpoint: {e}")))?;

        if envelope.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(CheckpointError::Corrupt(format!(
                "unsupported format version {} (expected {})",
                envelope.format_version, CHECKPOINT_FORMAT_VERSION
            )));
        }
        if envelope.workflow_id != envelope.state.workflow_id {
            return Err(CheckpointError::Corrupt(format!(
                "envelope workflow id {} does not match state {}",
                envelope.workflow_id, envelope.state.workflow_id
            )));
        }

        Ok(envelope.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqflow_model::{StateMutation, WorkflowStatus};

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut state = WorkflowState::new();
        state
            .apply(StateMutation::StatusChanged {
                status: WorkflowStatus::InProgress,
            })
            .unwrap();
        state
            .apply(StateMutation::StepSucceeded {
                step: "schema_analysis".into(),
                payload: serde_json::json!({"node_types": 2}),
            })
            .unwrap();

        let path = store.save(&state).await.unwrap();
        let restored = CheckpointStore::load(&path).await.unwrap();
        assert_eq!(state, restored);
    }

    #[tokio::test]
    async fn no_tmp_file_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let state = WorkflowState::new();

        let path = store.save(&state).await.unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn garbage_is_rejected_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = CheckpointStore::load(&path).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt(_)));
    }

    #[tokio::test]
    async fn wrong_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let state = WorkflowState::new();
        let path = store.save(&state).await.unwrap();

        // Tamper with the version tag
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let tampered = text.replace("\"format_version\": 1", "\"format_version\": 99");
        tokio::fs::write(&path, tampered).await.unwrap();

        let err = CheckpointStore::load(&path).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt(_)));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = CheckpointStore::load(Path::new("/nonexistent/ckpt.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::NotFound(_)));
    }
}
