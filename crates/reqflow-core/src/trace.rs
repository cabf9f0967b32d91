//! Trace collector
//!
//! Records timed events per worker/operation for cost and time
//! observability. Append-only, non-blocking, and infallible: a tracing
//! anomaly is logged at `warn` and swallowed so observability can never
//! abort the workflow.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqflow_model::TraceEvent;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Aggregated metrics for one worker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerStats {
    pub calls: u64,
    pub total_duration_ms: u64,
    pub tokens: u64,
    pub cost_estimate: f64,
}

impl WorkerStats {
    /// Mean call duration in milliseconds
    #[must_use]
    pub fn mean_duration_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_duration_ms as f64 / self.calls as f64
        }
    }
}

/// Aggregated view over all recorded events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSummary {
    pub per_worker: BTreeMap<String, WorkerStats>,
    pub event_count: usize,
    pub total_duration_ms: u64,
    pub total_tokens: u64,
    pub total_cost_estimate: f64,
}

#[derive(Debug, Default)]
struct TraceInner {
    timers: HashMap<String, (Instant, DateTime<Utc>)>,
    events: Vec<TraceEvent>,
}

/// Append-only trace event collector
#[derive(Debug, Default)]
pub struct TraceCollector {
    inner: Mutex<TraceInner>,
}

impl TraceCollector {
    /// Create an empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a named timer. Restarting an active timer resets it.
    pub fn start_timer(&self, id: &str) {
        let mut inner = self.inner.lock();
        if inner.timers.contains_key(id) {
            tracing::warn!(timer = id, "timer restarted while active");
        }
        inner
            .timers
            .insert(id.to_string(), (Instant::now(), Utc::now()));
    }

    /// Stop a named timer, returning its elapsed duration.
    ///
    /// Stopping an unknown timer is logged and returns `None`.
    pub fn stop_timer(&self, id: &str) -> Option<Duration> {
        let mut inner = self.inner.lock();
        match inner.timers.remove(id) {
            Some((started, _)) => Some(started.elapsed()),
            None => {
                tracing::warn!(timer = id, "stop_timer without matching start");
                None
            }
        }
    }

    /// Stop a timer and record an event spanning it
    pub fn stop_and_record(&self, id: &str, event_type: &str, worker: &str) -> Option<Duration> {
        let removed = {
            let mut inner = self.inner.lock();
            inner.timers.remove(id)
        };
        match removed {
            Some((started, started_at)) => {
                let elapsed = started.elapsed();
                self.record_event(TraceEvent::timed(event_type, worker, started_at, Utc::now()));
                Some(elapsed)
            }
            None => {
                tracing::warn!(timer = id, "stop_and_record without matching start");
                None
            }
        }
    }

    /// Append one event
    pub fn record_event(&self, event: TraceEvent) {
        self.inner.lock().events.push(event);
    }

    /// Record a completed worker call with its usage
    pub fn record_call(
        &self,
        worker: &str,
        started_at: DateTime<Utc>,
        tokens: u64,
        cost_estimate: f64,
    ) {
        self.record_event(
            TraceEvent::timed("worker_call", worker, started_at, Utc::now())
                .with_usage(tokens, cost_estimate),
        );
    }

    /// Snapshot of all recorded events
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.inner.lock().events.clone()
    }

    /// Aggregate per-worker metrics
    #[must_use]
    pub fn summary(&self) -> TraceSummary {
        let inner = self.inner.lock();
        let mut summary = TraceSummary {
            event_count: inner.events.len(),
            ..Default::default()
        };
        for event in &inner.events {
            let stats = summary.per_worker.entry(event.worker.clone()).or_default();
            stats.calls += 1;
            stats.total_duration_ms += event.duration_ms;
            stats.tokens += event.tokens;
            stats.cost_estimate += event.cost_estimate;

            summary.total_duration_ms += event.duration_ms;
            summary.total_tokens += event.tokens;
            summary.total_cost_estimate += event.cost_estimate;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_round_trip() {
        let trace = TraceCollector::new();
        trace.start_timer("phase:schema_analysis");
        let elapsed = trace.stop_timer("phase:schema_analysis");
        assert!(elapsed.is_some());
    }

    #[test]
    fn stop_without_start_is_swallowed() {
        let trace = TraceCollector::new();
        assert!(trace.stop_timer("nope").is_none());
        assert!(trace.stop_and_record("nope", "phase", "supervisor").is_none());
        assert_eq!(trace.events().len(), 0);
    }

    #[test]
    fn summary_aggregates_per_worker() {
        let trace = TraceCollector::new();
        let now = Utc::now();
        trace.record_event(
            TraceEvent::timed("worker_call", "reporting", now, now).with_usage(100, 0.01),
        );
        trace.record_event(
            TraceEvent::timed("worker_call", "reporting", now, now).with_usage(50, 0.005),
        );
        trace.record_event(TraceEvent::timed("worker_call", "schema-analysis", now, now));

        let summary = trace.summary();
        assert_eq!(summary.event_count, 3);
        assert_eq!(summary.per_worker["reporting"].calls, 2);
        assert_eq!(summary.per_worker["reporting"].tokens, 150);
        assert_eq!(summary.per_worker["schema-analysis"].calls, 1);
        assert_eq!(summary.total_tokens, 150);
    }

    #[test]
    fn stop_and_record_appends_event() {
        let trace = TraceCollector::new();
        trace.start_timer("phase:reporting");
        trace.stop_and_record("phase:reporting", "phase", "supervisor");
        let events = trace.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "phase");
    }
}
