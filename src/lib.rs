//! vadmin - add nodes to a running database cluster
//!
//! One operation, two interchangeable backends:
//! - structured: an in-process clustering library
//! - process: the `admintools` CLI run on a cluster member
//!
//! [`ClusterOps`] builds options from a [`MutationRequest`], dispatches them
//! to the backend chosen at construction and reports the outcome as log
//! records, events and a requeue decision.

use std::future::Future;
use std::pin::Pin;

pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod observability;
pub mod ops;
pub mod options;
pub mod reporter;
pub mod request;

pub use backend::{BackendKind, ExecutionOutcome, MutationBackend, NodeInfo};
pub use config::OpsConfig;
pub use context::CallContext;
pub use error::{MutationError, MutationResult};
pub use ops::ClusterOps;
pub use reporter::{OutcomeReporter, ReportOutcome};
pub use request::{MutationRequest, OperationKind};

/// Boxed future returned by the crate's object-safe async traits
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
