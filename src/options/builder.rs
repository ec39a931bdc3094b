//! Option Builder
//!
//! Translates a [`MutationRequest`] plus resolved credentials into
//! [`AddNodeOptions`]. Credentials are resolved only when the active backend
//! requires them, and always before anything is dispatched.
//! Reachability of hosts is not checked here.

use std::sync::Arc;

use super::{AddNodeOptions, DatabaseOptions};
use crate::backend::BackendRequirements;
use crate::context::CallContext;
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::{MutationError, MutationResult};
use crate::request::MutationRequest;

/// Database superuser used when none is configured
pub const DEFAULT_SUPERUSER: &str = "dbadmin";

/// Builds backend parameters from mutation requests.
pub struct OptionBuilder {
    credentials: Arc<dyn CredentialProvider>,
    superuser: String,
}

impl OptionBuilder {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credentials,
            superuser: DEFAULT_SUPERUSER.to_string(),
        }
    }

    /// Override the database superuser.
    pub fn with_superuser(mut self, name: impl Into<String>) -> Self {
        self.superuser = name.into();
        self
    }

    pub fn superuser(&self) -> &str {
        &self.superuser
    }

    /// Build the parameters for one attempt.
    ///
    /// Fails with `CredentialResolution` if the backend needs credentials
    /// and they cannot be resolved, and with `InvalidRequest` if a field
    /// the backend needs is missing.
    pub async fn build(
        &self,
        ctx: &CallContext,
        request: &MutationRequest,
        requirements: BackendRequirements,
    ) -> MutationResult<AddNodeOptions> {
        ctx.check()?;

        let credentials = if requirements.credentials {
            let credentials = ctx.run(self.credentials.cluster_credentials(ctx)).await?;
            credentials.validate()?;
            Some(credentials)
        } else {
            None
        };

        self.check_required(request, requirements)?;
        Ok(self.map_fields(request, credentials))
    }

    fn check_required(
        &self,
        request: &MutationRequest,
        requirements: BackendRequirements,
    ) -> MutationResult<()> {
        let mut missing = Vec::new();
        if request.database().trim().is_empty() {
            missing.push("database name");
        }
        if request.catalog_prefix().trim().is_empty() {
            missing.push("catalog path prefix");
        }
        if request.data_prefix().trim().is_empty() {
            missing.push("data path prefix");
        }
        if request.is_eon() {
            if request.depot_prefix().trim().is_empty() {
                missing.push("depot path prefix");
            }
            if request.subcluster().trim().is_empty() {
                missing.push("subcluster name");
            }
        }
        if self.superuser.trim().is_empty() {
            missing.push("superuser name");
        }
        if requirements.initiator_identity && request.initiator_name().is_none() {
            missing.push("initiator host identity");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MutationError::invalid_request(format!(
                "{} request is missing {}",
                request.kind(),
                missing.join(", ")
            )))
        }
    }

    fn map_fields(
        &self,
        request: &MutationRequest,
        credentials: Option<Arc<Credentials>>,
    ) -> AddNodeOptions {
        AddNodeOptions {
            bootstrap_host: request.initiator_ip().to_string(),
            initiator_name: request.initiator_name().cloned(),
            subcluster_name: non_empty(request.subcluster()),
            database: DatabaseOptions {
                name: request.database().to_string(),
                raw_hosts: request.hosts().to_vec(),
                ipv6: request.is_ipv6(),
                catalog_prefix: request.catalog_prefix().to_string(),
                data_prefix: request.data_prefix().to_string(),
                config_directory: None,
                depot_prefix: non_empty(request.depot_prefix()),
                is_eon: request.is_eon(),
                user_name: self.superuser.clone(),
                credentials,
                log_path: None,
                honor_user_input: request.honor_user_input(),
            },
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
