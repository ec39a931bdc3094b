//! File-backed credentials
//!
//! Reads PEM material from disk on every lookup. Wrap in
//! [`CachingCredentialProvider`](super::CachingCredentialProvider) to avoid
//! re-reading per attempt.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{CredentialProvider, Credentials};
use crate::context::CallContext;
use crate::error::{MutationError, MutationResult};
use crate::BoxFuture;

/// Where the superuser password comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordSource {
    /// No password configured
    None,
    /// Read from an environment variable
    Env(String),
    /// Read from a file; trailing newline is stripped
    File(PathBuf),
}

/// Reads TLS key, cert and CA cert from PEM files.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    key_path: PathBuf,
    cert_path: PathBuf,
    ca_cert_path: PathBuf,
    password: PasswordSource,
}

impl FileCredentialProvider {
    pub fn new(
        key_path: impl Into<PathBuf>,
        cert_path: impl Into<PathBuf>,
        ca_cert_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key_path: key_path.into(),
            cert_path: cert_path.into(),
            ca_cert_path: ca_cert_path.into(),
            password: PasswordSource::None,
        }
    }

    /// Set the password source.
    pub fn with_password(mut self, password: PasswordSource) -> Self {
        self.password = password;
        self
    }

    async fn load(&self) -> MutationResult<Credentials> {
        let key = read_pem("tls key", &self.key_path).await?;
        let cert = read_pem("tls cert", &self.cert_path).await?;
        let ca_cert = read_pem("ca cert", &self.ca_cert_path).await?;
        let password = self.read_password().await?;

        let credentials = Credentials::new(key, cert, ca_cert, password);
        credentials.validate()?;
        Ok(credentials)
    }

    async fn read_password(&self) -> MutationResult<String> {
        match &self.password {
            PasswordSource::None => Ok(String::new()),
            PasswordSource::Env(var) => std::env::var(var).map_err(|e| {
                MutationError::credential(format!("superuser password from ${}: {}", var, e))
            }),
            PasswordSource::File(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    MutationError::credential(format!(
                        "failed to read superuser password {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(raw.trim_end_matches(['\r', '\n']).to_string())
            }
        }
    }
}

async fn read_pem(what: &str, path: &Path) -> MutationResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        MutationError::credential(format!("failed to read {} {}: {}", what, path.display(), e))
    })
}

impl CredentialProvider for FileCredentialProvider {
    fn cluster_credentials<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> BoxFuture<'a, MutationResult<Arc<Credentials>>> {
        Box::pin(async move { ctx.run(self.load()).await.map(Arc::new) })
    }
}
