//! Cancellation capability for one in-flight job.
//!
//! A [`Cancellable`] captures how to stop one asynchronous job that is
//! currently live in this process. It is a capability object, not a status:
//! dropping it does not cancel anything, and cancelling it says nothing
//! about the remote execution backend (see
//! [`crate::canceller::ExecutionCanceller`] for that side).
//!
//! The handle for a logical job may be replaced between builds of the same
//! job (a retry supplies a new cancel function), which is why the registry
//! stores whole `Cancellable` values rather than raw tokens.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{JobError, Result};

type CancelFn = Box<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

enum CancelKind {
    Noop,
    Token(CancellationToken),
    Abort(AbortHandle),
    Func(CancelFn),
}

/// Cloneable handle that knows how to stop one in-flight job.
#[derive(Clone)]
pub struct Cancellable {
    kind: Arc<CancelKind>,
}

impl Cancellable {
    /// A cancellable that does nothing. Used for jobs tracked purely for
    /// bookkeeping.
    pub fn noop() -> Self {
        Self {
            kind: Arc::new(CancelKind::Noop),
        }
    }

    /// Cancels by triggering a [`CancellationToken`] the job cooperatively
    /// observes.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            kind: Arc::new(CancelKind::Token(token)),
        }
    }

    /// Cancels by aborting a spawned tokio task. Forceful: the task may not
    /// run cleanup.
    pub fn from_abort_handle(handle: AbortHandle) -> Self {
        Self {
            kind: Arc::new(CancelKind::Abort(handle)),
        }
    }

    /// Cancels by running an arbitrary async closure.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let func: CancelFn = Box::new(move || Box::pin(f()));
        Self {
            kind: Arc::new(CancelKind::Func(func)),
        }
    }

    /// Requests cancellation of the underlying job.
    ///
    /// Safe to call more than once; tokens and aborts are idempotent, and
    /// closures are expected to tolerate repeat calls.
    pub async fn cancel(&self) -> Result<()> {
        match self.kind.as_ref() {
            CancelKind::Noop => Ok(()),
            CancelKind::Token(token) => {
                token.cancel();
                Ok(())
            }
            CancelKind::Abort(handle) => {
                handle.abort();
                Ok(())
            }
            CancelKind::Func(f) => f().await.map_err(|e| match e {
                JobError::Cancel(msg) => JobError::Cancel(msg),
                other => JobError::Cancel(other.to_string()),
            }),
        }
    }
}

impl Default for Cancellable {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Cancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind.as_ref() {
            CancelKind::Noop => "Noop",
            CancelKind::Token(_) => "Token",
            CancelKind::Abort(_) => "Abort",
            CancelKind::Func(_) => "Func",
        };
        f.debug_struct("Cancellable").field("kind", &kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_noop_cancel() {
        Cancellable::noop().cancel().await.unwrap();
    }

    #[tokio::test]
    async fn test_token_cancel_is_idempotent() {
        let token = CancellationToken::new();
        let cancellable = Cancellable::from_token(token.clone());

        cancellable.cancel().await.unwrap();
        cancellable.cancel().await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_abort_cancel_stops_task() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
        });
        let cancellable = Cancellable::from_abort_handle(handle.abort_handle());

        cancellable.cancel().await.unwrap();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_fn_cancel_runs_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let cancellable = Cancellable::from_fn(move || {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        cancellable.cancel().await.unwrap();
        cancellable.clone().cancel().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fn_cancel_failure_maps_to_cancel_error() {
        let cancellable =
            Cancellable::from_fn(|| async { Err(JobError::Other("boom".to_string())) });

        match cancellable.cancel().await {
            Err(JobError::Cancel(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected cancel error, got {:?}", other),
        }
    }
}
