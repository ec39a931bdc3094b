//! Credential Provider
//!
//! Resolves the TLS key, certificate, CA certificate and superuser password
//! needed to authenticate to the cluster. Credentials are owned by the
//! provider and handed out read-only for one attempt; nothing in this crate
//! persists them.

mod cache;
mod file;

pub use cache::CachingCredentialProvider;
pub use file::{FileCredentialProvider, PasswordSource};

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::context::CallContext;
use crate::error::{MutationError, MutationResult};
use crate::BoxFuture;

/// TLS material and superuser password.
///
/// `Debug` never prints secret material.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: Vec<u8>,
    cert: Vec<u8>,
    ca_cert: Vec<u8>,
    password: String,
}

impl Credentials {
    pub fn new(
        key: impl Into<Vec<u8>>,
        cert: impl Into<Vec<u8>>,
        ca_cert: impl Into<Vec<u8>>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            cert: cert.into(),
            ca_cert: ca_cert.into(),
            password: password.into(),
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn cert(&self) -> &[u8] {
        &self.cert
    }

    pub fn ca_cert(&self) -> &[u8] {
        &self.ca_cert
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Names of the TLS parts that are empty.
    pub fn missing_parts(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.key.is_empty() {
            missing.push("key");
        }
        if self.cert.is_empty() {
            missing.push("cert");
        }
        if self.ca_cert.is_empty() {
            missing.push("ca_cert");
        }
        missing
    }

    /// Key, cert and CA cert are all present. The password may be empty.
    pub fn is_complete(&self) -> bool {
        self.missing_parts().is_empty()
    }

    /// Fail with `CredentialResolution` unless complete.
    pub fn validate(&self) -> MutationResult<()> {
        let missing = self.missing_parts();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MutationError::credential(format!(
                "incomplete TLS credentials: missing {}",
                missing.join(", ")
            )))
        }
    }

    /// Short SHA-256 fingerprint of the certificate, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.cert);
        digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("cert_fingerprint", &self.fingerprint())
            .field("ca_cert_len", &self.ca_cert.len())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of cluster credentials.
///
/// Must be safe for concurrent reads. Lookups may perform I/O and must
/// honor the call context.
pub trait CredentialProvider: Send + Sync {
    fn cluster_credentials<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> BoxFuture<'a, MutationResult<Arc<Credentials>>>;
}

/// Provider returning fixed credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Arc<Credentials>,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn cluster_credentials<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> BoxFuture<'a, MutationResult<Arc<Credentials>>> {
        Box::pin(async move {
            ctx.check()?;
            self.credentials.validate()?;
            Ok(Arc::clone(&self.credentials))
        })
    }
}

/// Provider used when no credential source is configured. Every lookup
/// fails, so only backends that never ask for credentials can run.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCredentialProvider;

impl CredentialProvider for UnconfiguredCredentialProvider {
    fn cluster_credentials<'a>(
        &'a self,
        _ctx: &'a CallContext,
    ) -> BoxFuture<'a, MutationResult<Arc<Credentials>>> {
        Box::pin(async { Err(MutationError::credential("no credential source is configured")) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_provider_fails() {
        let err = UnconfiguredCredentialProvider
            .cluster_credentials(&CallContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::CredentialResolution(_)));
    }

    fn complete() -> Credentials {
        Credentials::new(b"key".to_vec(), b"cert".to_vec(), b"ca".to_vec(), "secret")
    }

    #[test]
    fn test_complete_credentials() {
        let creds = complete();
        assert!(creds.is_complete());
        assert!(creds.validate().is_ok());
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn test_missing_parts_reported() {
        let creds = Credentials::new(Vec::new(), b"cert".to_vec(), Vec::new(), "");
        assert_eq!(creds.missing_parts(), vec!["key", "ca_cert"]);

        let err = creds.validate().unwrap_err();
        assert!(matches!(err, MutationError::CredentialResolution(_)));
        assert!(err.to_string().contains("key, ca_cert"));
    }

    #[test]
    fn test_empty_password_is_allowed() {
        let creds = Credentials::new(b"k".to_vec(), b"c".to_vec(), b"ca".to_vec(), "");
        assert!(creds.is_complete());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", complete());
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains(&complete().fingerprint()));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(complete().fingerprint(), complete().fingerprint());
        assert_eq!(complete().fingerprint().len(), 16);
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticCredentialProvider::new(complete());
        let ctx = CallContext::new();
        let creds = provider.cluster_credentials(&ctx).await.unwrap();
        assert_eq!(creds.cert(), b"cert");
    }

    #[tokio::test]
    async fn test_static_provider_honors_cancellation() {
        let provider = StaticCredentialProvider::new(complete());
        let ctx = CallContext::new();
        ctx.cancel();
        let err = provider.cluster_credentials(&ctx).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
