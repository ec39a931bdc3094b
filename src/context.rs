//! Call Context
//!
//! Carried through one mutation attempt. Holds the attempt ID used to
//! correlate log records, the caller's cancellation token and an optional
//! deadline. Every blocking step (credential lookup, backend dispatch)
//! runs under [`CallContext::run`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{CancelReason, MutationError, MutationResult};

/// Context for a single mutation attempt
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Attempt ID for log correlation
    attempt_id: Uuid,

    /// Caller-owned cancellation
    cancel: CancellationToken,

    /// Absolute deadline, if any
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a context with a fresh token and no deadline
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Create a context bound to a caller-owned token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            cancel,
            deadline: None,
        }
    }

    /// Bound the attempt by a timeout from now.
    ///
    /// An earlier existing deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        self.with_deadline(at)
    }

    /// Bound the attempt by an absolute deadline.
    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < at => existing,
            _ => at,
        });
        self
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the attempt
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail with `Cancelled` if the attempt is already cancelled or expired
    pub fn check(&self) -> MutationResult<()> {
        if self.cancel.is_cancelled() {
            return Err(MutationError::cancelled(CancelReason::Cancelled));
        }
        if let Some(at) = self.deadline {
            if Instant::now() >= at {
                return Err(MutationError::cancelled(CancelReason::DeadlineExceeded));
            }
        }
        Ok(())
    }

    /// Run a future under this context.
    ///
    /// The future is never polled if the context is already cancelled.
    /// If cancellation or the deadline fires first, the future is dropped
    /// and `Cancelled` is returned.
    pub async fn run<F, T>(&self, fut: F) -> MutationResult<T>
    where
        F: Future<Output = MutationResult<T>>,
    {
        self.check()?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MutationError::cancelled(CancelReason::Cancelled)),
            _ = expired => Err(MutationError::cancelled(CancelReason::DeadlineExceeded)),
            result = fut => result,
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_passes_check() {
        let ctx = CallContext::new();
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancelled_context_fails_check() {
        let ctx = CallContext::new();
        ctx.cancel();

        let err = ctx.check().unwrap_err();
        assert!(matches!(
            err,
            MutationError::Cancelled { reason: CancelReason::Cancelled }
        ));
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let ctx = CallContext::new()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(60));

        let remaining = ctx.deadline().unwrap() - Instant::now();
        assert!(remaining <= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_run_does_not_poll_when_cancelled() {
        let ctx = CallContext::new();
        ctx.cancel();

        let mut polled = false;
        let result: MutationResult<()> = ctx
            .run(async {
                polled = true;
                Ok(())
            })
            .await;

        assert!(result.unwrap_err().is_cancelled());
        assert!(!polled);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(20));

        let result: MutationResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(MutationError::Cancelled { reason: CancelReason::DeadlineExceeded })
        ));
    }

    #[tokio::test]
    async fn test_run_cancelled_in_flight() {
        let ctx = CallContext::new();
        let token = ctx.cancellation_token().clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result: MutationResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(MutationError::Cancelled { reason: CancelReason::Cancelled })
        ));
    }

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
        let result = ctx.run(async { Ok::<_, MutationError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
