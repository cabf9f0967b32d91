//! Workflow lifecycle state machine
//!
//! `NOT_STARTED -> IN_PROGRESS -> {COMPLETED | FAILED | PAUSED}`.
//! Completed and Failed are terminal; Paused workflows resume back into
//! InProgress from a checkpoint.

use crate::state::StateError;
use serde::{Deserialize, Serialize};

/// Overall workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Created, nothing dispatched yet
    NotStarted,
    /// At least one phase dispatched
    InProgress,
    /// Terminal: all phases settled successfully
    Completed,
    /// Terminal: a required phase exhausted its retry budget
    Failed,
    /// Interrupted at a phase boundary; resumable from checkpoint
    Paused,
}

impl WorkflowStatus {
    /// Whether this status accepts no further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Paused => "paused",
        };
        write!(f, "{s}")
    }
}

/// Transitions allowed out of `from`
pub fn allowed_transitions(from: WorkflowStatus) -> Vec<WorkflowStatus> {
    use WorkflowStatus::*;
    match from {
        NotStarted => vec![InProgress],
        InProgress => vec![InProgress, Completed, Failed, Paused],
        Paused => vec![InProgress],
        Completed => vec![],
        Failed => vec![],
    }
}

/// Validates a status transition
pub fn validate_transition(
    from: WorkflowStatus,
    to: WorkflowStatus,
) -> Result<(), StateError> {
    if allowed_transitions(from).into_iter().any(|s| s == to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_started_only_enters_in_progress() {
        assert!(validate_transition(WorkflowStatus::NotStarted, WorkflowStatus::InProgress).is_ok());
        assert!(validate_transition(WorkflowStatus::NotStarted, WorkflowStatus::Completed).is_err());
        assert!(validate_transition(WorkflowStatus::NotStarted, WorkflowStatus::Paused).is_err());
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for to in [
            WorkflowStatus::NotStarted,
            WorkflowStatus::InProgress,
            WorkflowStatus::Paused,
        ] {
            assert!(validate_transition(WorkflowStatus::Completed, to).is_err());
            assert!(validate_transition(WorkflowStatus::Failed, to).is_err());
        }
    }

    #[test]
    fn paused_resumes_into_in_progress() {
        assert!(validate_transition(WorkflowStatus::Paused, WorkflowStatus::InProgress).is_ok());
        assert!(validate_transition(WorkflowStatus::Paused, WorkflowStatus::Failed).is_err());
    }

    #[test]
    fn in_progress_self_transition_on_phase_advance() {
        assert!(validate_transition(WorkflowStatus::InProgress, WorkflowStatus::InProgress).is_ok());
    }
}
