//! Trace events
//!
//! Append-only timing/cost records owned by the trace collector. Never
//! mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timed event recorded for a worker operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Event classification, e.g. "worker_call" or "phase"
    pub event_type: String,
    /// Worker or component name
    pub worker: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// External-service token count attributed to this event
    pub tokens: u64,
    /// External-service cost attributed to this event
    pub cost_estimate: f64,
}

impl TraceEvent {
    /// Event spanning `started_at..ended_at` with no cost attribution
    #[must_use]
    pub fn timed(
        event_type: impl Into<String>,
        worker: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let duration_ms = (ended_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            event_type: event_type.into(),
            worker: worker.into(),
            started_at,
            ended_at,
            duration_ms,
            tokens: 0,
            cost_estimate: 0.0,
        }
    }

    /// Attach token/cost usage
    #[inline]
    #[must_use]
    pub fn with_usage(mut self, tokens: u64, cost_estimate: f64) -> Self {
        self.tokens = tokens;
        self.cost_estimate = cost_estimate;
        self
    }
}
