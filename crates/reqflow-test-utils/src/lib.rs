//! reqflow Test Utils - scripted mock clients and fixtures
//!
//! Mock implementations of the `reqflow-clients` contracts for integration
//! tests. The text-generation mock routes on the stable prompt openers each
//! worker uses, so a test drives the whole pipeline end to end without any
//! external service. Failures are scripted per call site ("fail the first N
//! calls"), which exercises retry and escalation paths deterministically.

#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use mocks::{mock_client_set, MockExecutionClient, MockSchemaClient, MockTextGeneration};

/// Install a test-friendly tracing subscriber (idempotent)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
