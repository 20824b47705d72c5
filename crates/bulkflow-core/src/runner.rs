//! Async driver that feeds a running job from a unit-of-work implementation.
//!
//! # Design
//! - The runner borrows the workflow mutably for the whole job, so a second
//!   job cannot start while one is in flight.
//! - The only suspension point is the pending unit of work. It races the job's
//!   cancellation token in a biased `select!`, and work that finishes after
//!   cancellation is discarded rather than applied.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use bulkflow_events::{ActionId, ItemId, JobId};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{WorkflowError, WorkflowResult};
use crate::executor::{CancelledJob, TickOutcome, align_outcomes};
use crate::model::{FailedItem, ItemOutcome};
use crate::workflow::Workflow;

/// Default cadence of [`SimulatedOperation`].
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(300);

/// Unit of work executed for each chunk of a batch job.
#[async_trait]
pub trait BatchOperation: Send + Sync {
    /// Process `items` for `action` and report one outcome per id, in order.
    ///
    /// Implementations may return early once `cancel` fires; whatever they
    /// return afterwards is discarded.
    async fn process(
        &self,
        action: &ActionId,
        items: &[ItemId],
        cancel: CancellationToken,
    ) -> Vec<ItemOutcome>;
}

/// Cancels a running job from another task.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    job_id: JobId,
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) const fn new(job_id: JobId, token: CancellationToken) -> Self {
        Self { job_id, token }
    }

    /// Job this handle cancels.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Request cancellation. Safe to call more than once.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Summary of a job driven by [`BatchRunner`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunReport {
    /// Every id was processed successfully.
    Completed {
        /// Job identifier.
        job_id: JobId,
        /// Action that ran.
        action: ActionId,
        /// Ids handed to the completion callback.
        items: Vec<ItemId>,
    },
    /// The job was cancelled at `at` of `total`.
    Cancelled {
        /// Job identifier.
        job_id: JobId,
        /// Action that was interrupted.
        action: ActionId,
        /// Processed count when cancellation was observed.
        at: usize,
        /// Items in the job snapshot.
        total: usize,
        /// Processed ids that succeeded before cancellation.
        succeeded: Vec<ItemId>,
        /// Processed ids that failed before cancellation, with reasons.
        failed: Vec<FailedItem>,
    },
    /// The job ran to the end with failures.
    Failed {
        /// Job identifier.
        job_id: JobId,
        /// Action that ran.
        action: ActionId,
        /// Ids processed successfully.
        succeeded: Vec<ItemId>,
        /// Ids that failed, with reasons.
        failed: Vec<FailedItem>,
    },
}

impl RunReport {
    /// Stable label used in logs, metrics, and CLI output.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }

    /// Job identifier.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        match self {
            Self::Completed { job_id, .. }
            | Self::Cancelled { job_id, .. }
            | Self::Failed { job_id, .. } => *job_id,
        }
    }

    fn cancelled(job: CancelledJob) -> Self {
        let at = job.current();
        Self::Cancelled {
            job_id: job.id,
            action: job.action,
            at,
            total: job.total,
            succeeded: job.succeeded,
            failed: job.failed,
        }
    }
}

/// Drives a running job chunk by chunk.
#[derive(Clone, Copy, Debug)]
pub struct BatchRunner {
    chunk_size: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BatchRunner {
    /// Runner that hands `chunk_size` ids to each unit of work (minimum one).
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Configured chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Run the workflow's current job until it completes, fails, or is
    /// cancelled through its [`CancelHandle`].
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotRunning`] when no job is running.
    pub async fn run(
        &self,
        workflow: &mut Workflow,
        operation: &dyn BatchOperation,
    ) -> WorkflowResult<RunReport> {
        let (job_id, action) = workflow
            .job()
            .map(|job| (job.id(), job.action().clone()))
            .ok_or(WorkflowError::NotRunning)?;
        let token = workflow.cancel_token();
        info!(job_id = %job_id, action = %action, chunk_size = self.chunk_size, "runner started");

        loop {
            let chunk = match workflow.job() {
                Some(job) => job.next_chunk(self.chunk_size).to_vec(),
                None => return Err(WorkflowError::NotRunning),
            };

            let outcomes = tokio::select! {
                biased;
                () = token.cancelled() => {
                    let cancelled = workflow.cancel()?;
                    return Ok(RunReport::cancelled(cancelled));
                }
                outcomes = operation.process(&action, &chunk, token.child_token()) => outcomes,
            };

            if token.is_cancelled() {
                debug!(job_id = %job_id, "discarding unit of work finished after cancellation");
                let cancelled = workflow.cancel()?;
                return Ok(RunReport::cancelled(cancelled));
            }

            match workflow.tick(job_id, &align_outcomes(outcomes, chunk.len())) {
                TickOutcome::Progressed { .. } => {}
                TickOutcome::Completed(completion) => {
                    return Ok(RunReport::Completed {
                        job_id,
                        action,
                        items: completion.items,
                    });
                }
                TickOutcome::Failed(failed) => {
                    return Ok(RunReport::Failed {
                        job_id,
                        action,
                        succeeded: failed.succeeded,
                        failed: failed.failed,
                    });
                }
                TickOutcome::Discarded => return Err(WorkflowError::NotRunning),
            }
        }
    }
}

/// Fixed-cadence operation: each chunk takes one period, and every id in it
/// succeeds unless it was marked as failing.
#[derive(Clone, Debug)]
pub struct SimulatedOperation {
    period: Duration,
    failing: BTreeSet<ItemId>,
}

impl Default for SimulatedOperation {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl SimulatedOperation {
    /// Simulation that waits `period` per chunk.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            failing: BTreeSet::new(),
        }
    }

    /// Make `ids` fail when processed.
    #[must_use]
    pub fn failing(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.failing.extend(ids);
        self
    }

    /// Cadence per chunk.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl BatchOperation for SimulatedOperation {
    async fn process(
        &self,
        _action: &ActionId,
        items: &[ItemId],
        cancel: CancellationToken,
    ) -> Vec<ItemOutcome> {
        tokio::select! {
            () = cancel.cancelled() => return Vec::new(),
            () = tokio::time::sleep(self.period) => {}
        }
        items
            .iter()
            .map(|id| {
                if self.failing.contains(id) {
                    ItemOutcome::failed("simulated failure")
                } else {
                    ItemOutcome::Succeeded
                }
            })
            .collect()
    }
}
