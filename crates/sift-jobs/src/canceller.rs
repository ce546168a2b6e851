//! Remote execution cancellation contract.

use async_trait::async_trait;
use sift_commons::JobId;

use crate::error::Result;

/// Collaborator capable of cancelling a job on the execution backend that
/// actually runs it.
///
/// A local [`crate::cancellable::Cancellable`] only stops in-process
/// bookkeeping and futures; the backend may still be computing and must be
/// told separately. Implementations must be safe to call with an unknown or
/// already-finished job id (treat it as a no-op).
#[async_trait]
pub trait ExecutionCanceller: Send + Sync {
    async fn cancel(&self, job_id: &JobId) -> Result<()>;
}

/// [`ExecutionCanceller`] for deployments without a remote execution
/// backend. Always succeeds.
#[derive(Debug, Default)]
pub struct NoopExecutionCanceller;

#[async_trait]
impl ExecutionCanceller for NoopExecutionCanceller {
    async fn cancel(&self, _job_id: &JobId) -> Result<()> {
        Ok(())
    }
}
