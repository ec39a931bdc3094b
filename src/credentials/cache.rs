//! Credential cache
//!
//! An explicit, injectable cache in front of another provider. Entries
//! expire after a TTL and can be dropped with [`invalidate`].
//! The lock is held only to read or replace the entry, never across the
//! inner lookup.
//!
//! [`invalidate`]: CachingCredentialProvider::invalidate

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::{CredentialProvider, Credentials};
use crate::context::CallContext;
use crate::error::MutationResult;
use crate::BoxFuture;

#[derive(Debug)]
struct CachedEntry {
    fetched_at: Instant,
    credentials: Arc<Credentials>,
}

/// TTL cache over a credential provider.
pub struct CachingCredentialProvider<P> {
    inner: P,
    ttl: Duration,
    entry: Mutex<Option<CachedEntry>>,
}

impl<P: CredentialProvider> CachingCredentialProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// Drop the cached entry; the next lookup goes to the inner provider.
    pub fn invalidate(&self) {
        if let Ok(mut entry) = self.entry.lock() {
            *entry = None;
        }
    }

    fn fresh(&self) -> Option<Arc<Credentials>> {
        let entry = self.entry.lock().ok()?;
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.credentials))
    }

    fn store(&self, credentials: &Arc<Credentials>) {
        if let Ok(mut entry) = self.entry.lock() {
            *entry = Some(CachedEntry {
                fetched_at: Instant::now(),
                credentials: Arc::clone(credentials),
            });
        }
    }
}

impl<P: CredentialProvider> CredentialProvider for CachingCredentialProvider<P> {
    fn cluster_credentials<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> BoxFuture<'a, MutationResult<Arc<Credentials>>> {
        Box::pin(async move {
            ctx.check()?;
            if let Some(credentials) = self.fresh() {
                return Ok(credentials);
            }

            let credentials = self.inner.cluster_credentials(ctx).await?;
            self.store(&credentials);
            Ok(credentials)
        })
    }
}
