//! Cluster Operations
//!
//! Entry point for cluster mutations. One call is one attempt:
//!
//! 1. build options (credentials first, when the backend needs them)
//! 2. dispatch to the backend selected at construction
//! 3. report the outcome
//!
//! `ClusterOps` holds no mutable state between calls and is safe to share
//! across tasks.

mod attempt;

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{
    BackendKind, ClusterLibrary, ExecutionOutcome, MutationBackend, ProcessBackend,
    ShellCommandChannel, StructuredBackend,
};
use crate::config::{ConfigError, ConfigResult, OpsConfig};
use crate::context::CallContext;
use crate::credentials::{
    CachingCredentialProvider, CredentialProvider, FileCredentialProvider, PasswordSource,
    UnconfiguredCredentialProvider,
};
use crate::error::MutationResult;
use crate::observability::{EventSink, LogSink};
use crate::options::{AddNodeOptions, OptionBuilder};
use crate::reporter::{OutcomeReporter, ReportOutcome, ADD_NODE_FAILED};
use crate::request::{MutationRequest, OperationKind, RequestOption};

use attempt::{Attempt, AttemptState};

/// Cluster mutation facade.
pub struct ClusterOps {
    builder: OptionBuilder,
    backend: Arc<dyn MutationBackend>,
    reporter: OutcomeReporter,
    log: Arc<dyn LogSink>,
    timeout: Option<Duration>,
}

impl ClusterOps {
    pub fn new(
        builder: OptionBuilder,
        backend: Arc<dyn MutationBackend>,
        reporter: OutcomeReporter,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            builder,
            backend,
            reporter,
            log,
            timeout: None,
        }
    }

    /// Bound every attempt by `timeout`. A caller deadline that is earlier
    /// still wins.
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Assemble the facade from configuration.
    ///
    /// The structured backend needs an embedded `library`; the process
    /// backend ignores it.
    pub fn from_config(
        config: &OpsConfig,
        library: Option<Arc<dyn ClusterLibrary>>,
        events: Arc<dyn EventSink>,
        log: Arc<dyn LogSink>,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let backend: Arc<dyn MutationBackend> = match config.backend {
            BackendKind::Structured => {
                let library = library.ok_or_else(|| {
                    ConfigError::Invalid(
                        "structured backend requires an embedded cluster library".into(),
                    )
                })?;
                Arc::new(StructuredBackend::new(library, Arc::clone(&log)))
            }
            BackendKind::Process => {
                let channel = ShellCommandChannel::new(config.exec_prefix.clone())
                    .with_config_path(config.admintools_conf_path.clone())
                    .with_config_container(config.container.clone());
                Arc::new(ProcessBackend::new(
                    Arc::new(channel),
                    config.process_settings(),
                    Arc::clone(&log),
                ))
            }
        };

        let builder = OptionBuilder::new(credential_provider(config))
            .with_superuser(config.superuser.clone());
        let reporter = OutcomeReporter::new(events, Arc::clone(&log));

        Ok(Self::new(builder, backend, reporter, log)
            .with_operation_timeout(config.operation_timeout()))
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Add the requested hosts to the database and report the outcome.
    pub async fn add_node<I>(&self, ctx: &CallContext, opts: I) -> ReportOutcome
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let result = match MutationRequest::new(OperationKind::AddNode, opts) {
            Ok(request) => self.execute(ctx, &request).await,
            Err(e) => Err(e),
        };
        self.reporter.report(OperationKind::AddNode, ADD_NODE_FAILED, result)
    }

    /// Build options for `request` as the active backend would see them.
    pub async fn build_options(
        &self,
        ctx: &CallContext,
        request: &MutationRequest,
    ) -> MutationResult<AddNodeOptions> {
        let ctx = self.bounded(ctx);
        self.builder
            .build(&ctx, request, self.backend.requirements())
            .await
    }

    /// Build and dispatch one attempt without reporting it.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request: &MutationRequest,
    ) -> MutationResult<ExecutionOutcome> {
        let ctx = self.bounded(ctx);
        let attempt_id = ctx.attempt_id().to_string();
        let hosts = request.hosts().join(",");
        self.log.info(
            "MUTATION_REQUESTED",
            &[
                ("attempt", attempt_id.as_str()),
                ("operation", request.kind().as_str()),
                ("backend", self.backend.kind().as_str()),
                ("initiator", request.initiator_ip()),
                ("hosts", hosts.as_str()),
            ],
        );

        let options = self
            .builder
            .build(&ctx, request, self.backend.requirements())
            .await?;

        let mut attempt = Attempt::built(ctx.attempt_id(), Arc::clone(&self.log));
        let kind = self.backend.kind();
        attempt.advance(|s| s.dispatch(kind));

        let result = self.backend.execute(&ctx, &options).await;

        match &result {
            Ok(_) => attempt.advance(AttemptState::succeed),
            Err(e) => {
                let class = e.class();
                attempt.advance(|s| s.fail(class));
            }
        }
        debug_assert!(attempt.state().is_terminal());
        result
    }

    fn bounded(&self, ctx: &CallContext) -> CallContext {
        match self.timeout {
            Some(timeout) => ctx.clone().with_timeout(timeout),
            None => ctx.clone(),
        }
    }
}

fn credential_provider(config: &OpsConfig) -> Arc<dyn CredentialProvider> {
    let Some(tls) = &config.tls else {
        return Arc::new(UnconfiguredCredentialProvider);
    };

    let password = match (&tls.password_file, &tls.password_env) {
        (Some(path), _) => PasswordSource::File(path.clone()),
        (None, Some(var)) => PasswordSource::Env(var.clone()),
        (None, None) => PasswordSource::None,
    };
    let files = FileCredentialProvider::new(
        tls.key_path.clone(),
        tls.cert_path.clone(),
        tls.ca_cert_path.clone(),
    )
    .with_password(password);

    match config.credential_cache_ttl() {
        Some(ttl) => Arc::new(CachingCredentialProvider::new(files, ttl)),
        None => Arc::new(files),
    }
}
