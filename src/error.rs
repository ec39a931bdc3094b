//! Mutation Error Types
//!
//! Every failure of a cluster mutation attempt is one of four classes:
//! - credential resolution (fatal to the attempt)
//! - invalid request (caller must fix input)
//! - backend execution (backend identity and raw output preserved)
//! - cancellation (caller abort or deadline)
//!
//! Nothing in this layer retries. Errors are returned to the caller with
//! enough context to decide.

use std::fmt;

use thiserror::Error;

use crate::backend::BackendKind;

/// Result type for mutation operations
pub type MutationResult<T> = Result<T, MutationError>;

/// Why an attempt was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled the attempt
    Cancelled,
    /// The attempt outlived its deadline
    DeadlineExceeded,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::Cancelled => "cancelled by caller",
            CancelReason::DeadlineExceeded => "deadline exceeded",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutation errors
#[derive(Debug, Clone, Error)]
pub enum MutationError {
    #[error("credential resolution failed: {0}")]
    CredentialResolution(String),

    #[error("invalid mutation request: {0}")]
    InvalidRequest(String),

    #[error("{backend} backend failed: {cause}")]
    BackendExecution {
        backend: BackendKind,
        cause: String,
        stdout: Option<String>,
        stderr: Option<String>,
    },

    #[error("operation cancelled: {reason}")]
    Cancelled { reason: CancelReason },
}

/// Coarse classification used by the outcome reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Credential,
    InvalidRequest,
    Backend,
    Cancelled,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Credential => "credential",
            ErrorClass::InvalidRequest => "invalid_request",
            ErrorClass::Backend => "backend",
            ErrorClass::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MutationError {
    /// Create a credential resolution error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::CredentialResolution(message.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a backend execution error without captured output.
    pub fn backend(backend: BackendKind, cause: impl Into<String>) -> Self {
        Self::BackendExecution {
            backend,
            cause: cause.into(),
            stdout: None,
            stderr: None,
        }
    }

    /// Create a backend execution error that keeps the tool's output.
    pub fn backend_with_output(
        backend: BackendKind,
        cause: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::BackendExecution {
            backend,
            cause: cause.into(),
            stdout: Some(stdout.into()),
            stderr: Some(stderr.into()),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(reason: CancelReason) -> Self {
        Self::Cancelled { reason }
    }

    /// Classify the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::CredentialResolution(_) => ErrorClass::Credential,
            Self::InvalidRequest(_) => ErrorClass::InvalidRequest,
            Self::BackendExecution { .. } => ErrorClass::Backend,
            Self::Cancelled { .. } => ErrorClass::Cancelled,
        }
    }

    /// Backend that reported the failure, if any.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        match self {
            Self::BackendExecution { backend, .. } => Some(*backend),
            _ => None,
        }
    }

    /// Captured stdout of the process backend, if any.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::BackendExecution { stdout, .. } => stdout.as_deref(),
            _ => None,
        }
    }

    /// Captured stderr of the process backend, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::BackendExecution { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(MutationError::credential("x").class(), ErrorClass::Credential);
        assert_eq!(MutationError::invalid_request("x").class(), ErrorClass::InvalidRequest);
        assert_eq!(
            MutationError::backend(BackendKind::Process, "x").class(),
            ErrorClass::Backend
        );
        assert_eq!(
            MutationError::cancelled(CancelReason::DeadlineExceeded).class(),
            ErrorClass::Cancelled
        );
    }

    #[test]
    fn test_backend_error_keeps_output() {
        let err = MutationError::backend_with_output(
            BackendKind::Process,
            "admintools exited with status 1",
            "Error: node already exists",
            "",
        );

        assert_eq!(err.backend_kind(), Some(BackendKind::Process));
        assert_eq!(err.stdout(), Some("Error: node already exists"));
        assert_eq!(err.stderr(), Some(""));
        assert!(err.to_string().contains("process backend failed"));
    }

    #[test]
    fn test_cancelled_display() {
        let err = MutationError::cancelled(CancelReason::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "operation cancelled: cancelled by caller");
        assert!(err.stdout().is_none());
    }
}
