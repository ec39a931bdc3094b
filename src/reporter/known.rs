//! Known backend failures
//!
//! Some failures of the command-line tool are recognizable from its output
//! and deserve a more specific reason than the caller's generic one.
//! Matching is a case-insensitive substring check over stdout, stderr and
//! the error message.

use crate::error::MutationError;

/// The license does not allow another node
pub const ADD_NODE_LICENSE_FAIL: &str = "AddNodeLicenseFail";

struct KnownFailure {
    reason: &'static str,
    patterns: &'static [&'static str],
}

const KNOWN_FAILURES: &[KnownFailure] = &[KnownFailure {
    reason: ADD_NODE_LICENSE_FAIL,
    patterns: &["current license permits", "cannot create another node"],
}];

/// Reason for a recognized backend failure, if the error is one.
pub fn recognize(error: &MutationError) -> Option<&'static str> {
    let MutationError::BackendExecution {
        cause,
        stdout,
        stderr,
        ..
    } = error
    else {
        return None;
    };

    let haystack = [Some(cause.as_str()), stdout.as_deref(), stderr.as_deref()]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect::<Vec<_>>();

    KNOWN_FAILURES
        .iter()
        .find(|known| {
            known
                .patterns
                .iter()
                .any(|p| haystack.iter().any(|text| text.contains(p)))
        })
        .map(|known| known.reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;

    #[test]
    fn test_license_limit_in_stdout() {
        let err = MutationError::backend_with_output(
            BackendKind::Process,
            "'-t db_add_node' exited with status 1",
            "Error: Cannot create another node. The current license permits 3 node(s)",
            "",
        );
        assert_eq!(recognize(&err), Some(ADD_NODE_LICENSE_FAIL));
    }

    #[test]
    fn test_unrecognized_backend_failure() {
        let err = MutationError::backend_with_output(
            BackendKind::Process,
            "exited with status 1",
            "Error: node v_vertdb_node0004 already exists",
            "",
        );
        assert_eq!(recognize(&err), None);
    }

    #[test]
    fn test_only_backend_errors_are_matched() {
        let err = MutationError::invalid_request("current license permits nothing");
        assert_eq!(recognize(&err), None);
    }
}
