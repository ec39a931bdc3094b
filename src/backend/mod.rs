//! Execution Backends
//!
//! One capability, [`MutationBackend`], with two implementations:
//! - [`StructuredBackend`]: in-process call into a [`ClusterLibrary`]
//! - [`ProcessBackend`]: `admintools` run on a cluster member through a
//!   [`CommandChannel`]
//!
//! The active backend is chosen once when the controller is constructed.
//! There is no fallback between backends.

mod process;
mod shell;
mod structured;

pub use process::{
    admintools_add_node_argv, ChannelError, CommandChannel, CommandOutput, ProcessBackend,
    ProcessSettings, DEFAULT_ADMINTOOLS_CONF, DEFAULT_ADMINTOOLS_PATH, DEFAULT_CONTAINER,
    DEFAULT_DUMP_MAX_BYTES,
};
pub use shell::ShellCommandChannel;
pub use structured::{ClusterLibrary, LibraryFailure, StructuredBackend};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::CallContext;
use crate::error::MutationResult;
use crate::options::AddNodeOptions;
use crate::BoxFuture;

/// Which execution strategy handles mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Structured,
    Process,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Structured => "structured",
            BackendKind::Process => "process",
        }
    }

    /// What the option builder must supply for this kind of backend.
    pub fn requirements(&self) -> BackendRequirements {
        match self {
            BackendKind::Structured => BackendRequirements {
                credentials: true,
                initiator_identity: false,
            },
            BackendKind::Process => BackendRequirements {
                credentials: false,
                initiator_identity: true,
            },
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structured" => Ok(BackendKind::Structured),
            "process" => Ok(BackendKind::Process),
            other => Err(format!(
                "unknown backend '{}': expected 'structured' or 'process'",
                other
            )),
        }
    }
}

/// Inputs a backend needs from the option builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendRequirements {
    /// TLS credentials and password must be resolved
    pub credentials: bool,
    /// The initiator's orchestration identity must be known
    pub initiator_identity: bool,
}

/// Metadata of a node added to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub address: String,
    pub subcluster: Option<String>,
    pub catalog_path: Option<String>,
}

/// Successful result of a backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Nodes reported by the clustering library
    NewNodes(Vec<NodeInfo>),
    /// Captured stdout of the command-line tool
    CommandOutput { stdout: String },
}

impl ExecutionOutcome {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        match self {
            ExecutionOutcome::NewNodes(nodes) => {
                let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
                format!("added {} node(s): {}", nodes.len(), names.join(","))
            }
            ExecutionOutcome::CommandOutput { stdout } => {
                let last = stdout.lines().rev().find(|l| !l.trim().is_empty());
                format!("command succeeded: {}", last.unwrap_or("<no output>").trim())
            }
        }
    }
}

/// Execution strategy for cluster mutations.
pub trait MutationBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn requirements(&self) -> BackendRequirements {
        self.kind().requirements()
    }

    /// Perform the add-node call.
    ///
    /// Must not invoke the underlying call if `ctx` is already cancelled.
    fn execute<'a>(
        &'a self,
        ctx: &'a CallContext,
        options: &'a AddNodeOptions,
    ) -> BoxFuture<'a, MutationResult<ExecutionOutcome>>;
}
