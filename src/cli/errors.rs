//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::error::MutationError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// The attempt ran and was reported as failed
    #[error("{reason}: {message} (requeue: {requeue})")]
    MutationFailed {
        reason: String,
        message: String,
        requeue: bool,
    },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "VADMIN_CLI_CONFIG_ERROR",
            Self::InvalidArgument(_) => "VADMIN_CLI_INVALID_ARGUMENT",
            Self::Mutation(_) | Self::MutationFailed { .. } => "VADMIN_CLI_MUTATION_FAILED",
            Self::Runtime(_) => "VADMIN_CLI_RUNTIME_ERROR",
            Self::Io(_) | Self::Json(_) => "VADMIN_CLI_IO_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            CliError::InvalidArgument("x".into()).code(),
            "VADMIN_CLI_INVALID_ARGUMENT"
        );
        assert_eq!(
            CliError::from(ConfigError::Invalid("x".into())).code(),
            "VADMIN_CLI_CONFIG_ERROR"
        );
        assert_eq!(
            CliError::from(MutationError::invalid_request("x")).code(),
            "VADMIN_CLI_MUTATION_FAILED"
        );
    }

    #[test]
    fn test_mutation_failed_display() {
        let err = CliError::MutationFailed {
            reason: "AddNodeFailed".into(),
            message: "process backend failed: exited with status 1".into(),
            requeue: true,
        };
        assert_eq!(
            err.to_string(),
            "AddNodeFailed: process backend failed: exited with status 1 (requeue: true)"
        );
    }
}
