//! Outcome Reporter
//!
//! Turns the result of one mutation attempt into:
//! - one structured log record
//! - at most one user-facing event (failures only)
//! - a requeue decision for the caller
//!
//! The original error is always handed back unchanged. This is the only
//! component that writes to an [`EventSink`].

mod known;

pub use known::{recognize, ADD_NODE_LICENSE_FAIL};

use std::sync::Arc;

use crate::backend::ExecutionOutcome;
use crate::error::{ErrorClass, MutationError, MutationResult};
use crate::observability::{ClusterEvent, EventSink, LogSink};
use crate::request::OperationKind;

/// Generic failure reason for add node
pub const ADD_NODE_FAILED: &str = "AddNodeFailed";
pub const CREDENTIAL_RESOLUTION_FAILED: &str = "CredentialResolutionFailed";
pub const INVALID_MUTATION_REQUEST: &str = "InvalidMutationRequest";
pub const MUTATION_CANCELLED: &str = "MutationCancelled";

/// What the caller should do after an attempt
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// Try the attempt again later
    pub requeue: bool,

    /// Event reason recorded for a failure
    pub reason: Option<String>,

    /// The attempt's error, unchanged
    pub error: Option<MutationError>,

    /// Backend payload of a successful attempt
    pub outcome: Option<ExecutionOutcome>,
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Stable reason for an error class. Backend failures use the caller's
/// generic reason.
pub fn reason_for(class: ErrorClass, generic_reason: &str) -> &str {
    match class {
        ErrorClass::Credential => CREDENTIAL_RESOLUTION_FAILED,
        ErrorClass::InvalidRequest => INVALID_MUTATION_REQUEST,
        ErrorClass::Cancelled => MUTATION_CANCELLED,
        ErrorClass::Backend => generic_reason,
    }
}

/// Whether an error class should be retried by the caller.
pub fn should_requeue(class: ErrorClass) -> bool {
    match class {
        ErrorClass::Credential | ErrorClass::InvalidRequest => false,
        ErrorClass::Backend | ErrorClass::Cancelled => true,
    }
}

/// Logs and records the outcome of mutation attempts.
pub struct OutcomeReporter {
    events: Arc<dyn EventSink>,
    log: Arc<dyn LogSink>,
}

impl OutcomeReporter {
    pub fn new(events: Arc<dyn EventSink>, log: Arc<dyn LogSink>) -> Self {
        Self { events, log }
    }

    /// Report one attempt.
    pub fn report(
        &self,
        operation: OperationKind,
        generic_reason: &str,
        result: MutationResult<ExecutionOutcome>,
    ) -> ReportOutcome {
        match result {
            Ok(outcome) => {
                let summary = outcome.summary();
                self.log.info(
                    "MUTATION_SUCCEEDED",
                    &[
                        ("operation", operation.as_str()),
                        ("summary", summary.as_str()),
                    ],
                );
                ReportOutcome {
                    requeue: false,
                    reason: None,
                    error: None,
                    outcome: Some(outcome),
                }
            }
            Err(error) => self.report_failure(operation, generic_reason, error),
        }
    }

    fn report_failure(
        &self,
        operation: OperationKind,
        generic_reason: &str,
        error: MutationError,
    ) -> ReportOutcome {
        let class = error.class();
        let reason = match recognize(&error) {
            Some(known) => known,
            None => reason_for(class, generic_reason),
        };
        let message = error.to_string();

        let mut fields = vec![
            ("operation", operation.as_str()),
            ("class", class.as_str()),
            ("reason", reason),
            ("error", message.as_str()),
        ];
        let backend = error.backend_kind();
        if let Some(kind) = &backend {
            fields.push(("backend", kind.as_str()));
        }
        if let Some(stdout) = error.stdout() {
            fields.push(("stdout", stdout));
        }
        if let Some(stderr) = error.stderr() {
            fields.push(("stderr", stderr));
        }
        self.log.error("MUTATION_FAILED", &fields);

        self.events.record(&ClusterEvent::warning(
            operation.as_str(),
            reason,
            format!("{} failed: {}", operation, message),
        ));

        ReportOutcome {
            requeue: should_requeue(class),
            reason: Some(reason.to_string()),
            error: Some(error),
            outcome: None,
        }
    }
}
