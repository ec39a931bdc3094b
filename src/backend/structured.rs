//! Structured backend
//!
//! Calls the clustering control library in-process. The library call is
//! synchronous and may block for as long as the cluster's own coordination
//! takes, so it runs on the blocking pool. Cancellation abandons the wait;
//! the library call itself is opaque and is not interrupted. Its result is
//! still logged when it arrives, marked `late`.

use std::sync::Arc;

use thiserror::Error;

use super::{BackendKind, ExecutionOutcome, MutationBackend, NodeInfo};
use crate::context::CallContext;
use crate::error::{MutationError, MutationResult};
use crate::observability::LogSink;
use crate::options::AddNodeOptions;
use crate::BoxFuture;

/// Failure reported by the clustering library.
///
/// `partial` holds metadata of nodes that were added before the failure.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LibraryFailure {
    pub message: String,
    pub partial: Vec<NodeInfo>,
}

impl LibraryFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: Vec::new(),
        }
    }

    pub fn with_partial(mut self, partial: Vec<NodeInfo>) -> Self {
        self.partial = partial;
        self
    }
}

/// Clustering control library boundary.
pub trait ClusterLibrary: Send + Sync {
    /// Add the hosts in `options` to the database. Blocking.
    fn add_node(&self, options: &AddNodeOptions) -> Result<Vec<NodeInfo>, LibraryFailure>;
}

/// Backend that calls a [`ClusterLibrary`] directly.
pub struct StructuredBackend {
    library: Arc<dyn ClusterLibrary>,
    log: Arc<dyn LogSink>,
}

impl StructuredBackend {
    pub fn new(library: Arc<dyn ClusterLibrary>, log: Arc<dyn LogSink>) -> Self {
        Self { library, log }
    }

    async fn add_node(
        &self,
        ctx: &CallContext,
        options: &AddNodeOptions,
    ) -> MutationResult<Vec<NodeInfo>> {
        ctx.check()?;
        if !options.database.has_complete_credentials() {
            return Err(MutationError::invalid_request(
                "structured backend requires TLS key, cert and CA cert",
            ));
        }

        let attempt = ctx.attempt_id().to_string();
        self.log.info(
            "ADD_NODE_STARTED",
            &[
                ("attempt", attempt.as_str()),
                ("backend", BackendKind::Structured.as_str()),
                ("bootstrap_host", options.bootstrap_host.as_str()),
            ],
        );

        let library = Arc::clone(&self.library);
        let owned = options.clone();
        let mut handle = tokio::task::spawn_blocking(move || library.add_node(&owned));

        let joined = ctx
            .run(async {
                (&mut handle).await.map_err(|e| {
                    MutationError::backend(
                        BackendKind::Structured,
                        format!("cluster library task failed: {}", e),
                    )
                })
            })
            .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                if e.is_cancelled() {
                    // the call still runs; keep its result for diagnosis
                    let log = Arc::clone(&self.log);
                    tokio::spawn(async move {
                        match handle.await {
                            Ok(result) => log_done(log.as_ref(), &attempt, &result, true),
                            Err(join) => {
                                let error = join.to_string();
                                log.error(
                                    "ADD_NODE_DONE",
                                    &[
                                        ("attempt", attempt.as_str()),
                                        ("backend", BackendKind::Structured.as_str()),
                                        ("late", "true"),
                                        ("error", error.as_str()),
                                    ],
                                );
                            }
                        }
                    });
                }
                return Err(e);
            }
        };

        log_done(self.log.as_ref(), &attempt, &result, false);
        result.map_err(|failure| MutationError::backend(BackendKind::Structured, failure.message))
    }
}

/// Log the raw library result, including nodes added before a failure.
/// `late` marks results that arrived after the attempt was abandoned.
fn log_done(
    log: &dyn LogSink,
    attempt: &str,
    result: &Result<Vec<NodeInfo>, LibraryFailure>,
    late: bool,
) {
    let (nodes, error) = match result {
        Ok(nodes) => (nodes.as_slice(), ""),
        Err(failure) => (failure.partial.as_slice(), failure.message.as_str()),
    };
    let new_nodes = serde_json::to_string(nodes).unwrap_or_default();
    log.info(
        "ADD_NODE_DONE",
        &[
            ("attempt", attempt),
            ("backend", BackendKind::Structured.as_str()),
            ("new_nodes", new_nodes.as_str()),
            ("error", error),
            ("late", if late { "true" } else { "false" }),
        ],
    );
}

impl MutationBackend for StructuredBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Structured
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CallContext,
        options: &'a AddNodeOptions,
    ) -> BoxFuture<'a, MutationResult<ExecutionOutcome>> {
        Box::pin(async move {
            self.add_node(ctx, options)
                .await
                .map(ExecutionOutcome::NewNodes)
        })
    }
}
