//! Attempt State Machine
//!
//! Tracks one mutation attempt through the facade:
//!
//! ```text
//! Built -> Dispatched -> Succeeded
//!                     -> Failed
//! ```
//!
//! States are never persisted. Each transition is logged with the attempt
//! ID so a single attempt can be followed through the log.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::backend::BackendKind;
use crate::error::ErrorClass;
use crate::observability::LogSink;

/// A transition the state machine does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("forbidden attempt transition: {from} -> {to}")]
pub(crate) struct ForbiddenTransition {
    pub from: &'static str,
    pub to: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptState {
    /// Options are built; nothing has been sent
    Built,
    /// Handed to a backend
    Dispatched { backend: BackendKind },
    Succeeded { backend: BackendKind },
    Failed { backend: BackendKind, class: ErrorClass },
}

impl AttemptState {
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Built => "Built",
            Self::Dispatched { .. } => "Dispatched",
            Self::Succeeded { .. } => "Succeeded",
            Self::Failed { .. } => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Built -> Dispatched
    pub fn dispatch(self, backend: BackendKind) -> Result<Self, ForbiddenTransition> {
        match self {
            Self::Built => Ok(Self::Dispatched { backend }),
            other => Err(other.forbidden("Dispatched")),
        }
    }

    /// Dispatched -> Succeeded
    pub fn succeed(self) -> Result<Self, ForbiddenTransition> {
        match self {
            Self::Dispatched { backend } => Ok(Self::Succeeded { backend }),
            other => Err(other.forbidden("Succeeded")),
        }
    }

    /// Dispatched -> Failed
    pub fn fail(self, class: ErrorClass) -> Result<Self, ForbiddenTransition> {
        match self {
            Self::Dispatched { backend } => Ok(Self::Failed { backend, class }),
            other => Err(other.forbidden("Failed")),
        }
    }

    fn forbidden(&self, to: &'static str) -> ForbiddenTransition {
        ForbiddenTransition {
            from: self.state_name(),
            to,
        }
    }
}

/// Logged holder of an [`AttemptState`].
pub(crate) struct Attempt {
    id: Uuid,
    state: AttemptState,
    log: Arc<dyn LogSink>,
}

impl Attempt {
    /// Start an attempt whose options are already built.
    pub fn built(id: Uuid, log: Arc<dyn LogSink>) -> Self {
        let attempt = Self {
            id,
            state: AttemptState::Built,
            log,
        };
        attempt.log_state(None);
        attempt
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Apply a transition. A forbidden one is logged and leaves the state
    /// unchanged.
    pub fn advance<F>(&mut self, transition: F)
    where
        F: FnOnce(AttemptState) -> Result<AttemptState, ForbiddenTransition>,
    {
        let from = self.state.state_name();
        match transition(self.state.clone()) {
            Ok(next) => {
                self.state = next;
                self.log_state(Some(from));
            }
            Err(e) => {
                let attempt = self.id.to_string();
                let error = e.to_string();
                self.log.error(
                    "ATTEMPT_TRANSITION_REJECTED",
                    &[("attempt", attempt.as_str()), ("error", error.as_str())],
                );
            }
        }
    }

    fn log_state(&self, from: Option<&str>) {
        let attempt = self.id.to_string();
        let mut fields = vec![
            ("attempt", attempt.as_str()),
            ("state", self.state.state_name()),
        ];
        if let Some(from) = from {
            fields.push(("from", from));
        }
        match &self.state {
            AttemptState::Built => {}
            AttemptState::Dispatched { backend } | AttemptState::Succeeded { backend } => {
                fields.push(("backend", backend.as_str()));
            }
            AttemptState::Failed { backend, class } => {
                fields.push(("backend", backend.as_str()));
                fields.push(("class", class.as_str()));
            }
        }
        self.log.trace("ATTEMPT_STATE", &fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemoryLogSink;

    #[test]
    fn test_happy_path() {
        let state = AttemptState::Built
            .dispatch(BackendKind::Process)
            .and_then(AttemptState::succeed)
            .unwrap();

        assert_eq!(state, AttemptState::Succeeded { backend: BackendKind::Process });
        assert!(state.is_terminal());
    }

    #[test]
    fn test_cannot_finish_before_dispatch() {
        let err = AttemptState::Built.succeed().unwrap_err();
        assert_eq!(err.from, "Built");
        assert_eq!(err.to, "Succeeded");

        assert!(AttemptState::Built.fail(ErrorClass::Backend).is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let failed = AttemptState::Failed {
            backend: BackendKind::Structured,
            class: ErrorClass::Cancelled,
        };
        assert!(failed.clone().dispatch(BackendKind::Structured).is_err());
        assert!(failed.succeed().is_err());
    }

    #[test]
    fn test_attempt_logs_transitions() {
        let log = MemoryLogSink::new();
        let mut attempt = Attempt::built(Uuid::new_v4(), Arc::new(log.clone()));

        attempt.advance(|s| s.dispatch(BackendKind::Structured));
        attempt.advance(|s| s.fail(ErrorClass::Backend));

        let states: Vec<String> = log
            .find("ATTEMPT_STATE")
            .iter()
            .filter_map(|r| r.field("state").map(str::to_string))
            .collect();
        assert_eq!(states, vec!["Built", "Dispatched", "Failed"]);
        assert!(attempt.state().is_terminal());
    }

    #[test]
    fn test_forbidden_transition_keeps_state() {
        let log = MemoryLogSink::new();
        let mut attempt = Attempt::built(Uuid::new_v4(), Arc::new(log.clone()));

        attempt.advance(AttemptState::succeed);

        assert_eq!(attempt.state(), &AttemptState::Built);
        assert_eq!(log.find("ATTEMPT_TRANSITION_REJECTED").len(), 1);
    }
}
