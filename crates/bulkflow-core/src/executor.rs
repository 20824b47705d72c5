//! Executor states and the batch job record.
//!
//! # Design
//! - One explicit enum owns every phase; `Completed` is never stored because a
//!   finished job immediately hands its result to the caller and returns to
//!   `Idle`.
//! - `BatchJob` fields are private so `current` can only move forward through
//!   [`BatchJob::record`].

use bulkflow_events::{ActionId, ItemId, JobId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::Action;
use crate::model::{FailedItem, ItemOutcome};

/// Reason attached to ids an operation did not report on.
pub const MISSING_OUTCOME_REASON: &str = "no outcome reported";

/// Phase of a bulk workflow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkflowState {
    /// No job and no dialog; selection is editable.
    #[default]
    Idle,
    /// A confirming action was chosen and waits for the user.
    AwaitingConfirmation {
        /// Action that will run on confirm.
        action: Action,
        /// Selection captured when the action was chosen.
        snapshot: Vec<ItemId>,
    },
    /// A batch job is processing its snapshot.
    Running(BatchJob),
    /// The last job finished with failures and the error affordance is shown.
    Failed(FailedJob),
}

impl WorkflowState {
    /// Stable state name used in logs and `Busy` errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::Running(_) => "running",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the workflow accepts selection changes and new actions.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// One execution of an action against a selection snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchJob {
    id: JobId,
    action: ActionId,
    items: Vec<ItemId>,
    current: usize,
    succeeded: Vec<ItemId>,
    failed: Vec<FailedItem>,
    started_at: DateTime<Utc>,
}

impl BatchJob {
    pub(crate) fn new(action: ActionId, items: Vec<ItemId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            items,
            current: 0,
            succeeded: Vec::new(),
            failed: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Action being executed.
    #[must_use]
    pub const fn action(&self) -> &ActionId {
        &self.action
    }

    /// Snapshot of ids taken when the job started.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Number of ids in the snapshot.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Number of ids processed so far.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Whether every id has been processed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current >= self.total()
    }

    /// Progress as a whole percentage; an empty job counts as done.
    #[must_use]
    pub fn percent_complete(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 100;
        }
        let percent = self.current.saturating_mul(100) / total;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }

    /// Label rendered under the progress bar, e.g. `2 of 3`.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{} of {}", self.current, self.total())
    }

    /// Next `size` unprocessed ids (at least one when any remain).
    #[must_use]
    pub fn next_chunk(&self, size: usize) -> &[ItemId] {
        let start = self.current.min(self.total());
        let end = start.saturating_add(size.max(1)).min(self.total());
        &self.items[start..end]
    }

    /// Ids already processed, in snapshot order.
    #[must_use]
    pub fn processed(&self) -> &[ItemId] {
        &self.items[..self.current.min(self.total())]
    }

    /// Ids processed successfully.
    #[must_use]
    pub fn succeeded(&self) -> &[ItemId] {
        &self.succeeded
    }

    /// Ids that failed, with reasons.
    #[must_use]
    pub fn failed(&self) -> &[FailedItem] {
        &self.failed
    }

    /// Whether any processed id failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// When the job entered `Running`.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Apply outcomes to the next pending ids in order. Extra outcomes beyond
    /// the snapshot are ignored. Returns how many ids advanced.
    pub(crate) fn record(&mut self, outcomes: &[ItemOutcome]) -> usize {
        let pending = self.total().saturating_sub(self.current);
        let applied = outcomes.len().min(pending);
        for outcome in &outcomes[..applied] {
            let id = self.items[self.current].clone();
            match outcome {
                ItemOutcome::Succeeded => self.succeeded.push(id),
                ItemOutcome::Failed { reason } => self.failed.push(FailedItem {
                    id,
                    reason: reason.clone(),
                }),
            }
            self.current += 1;
        }
        applied
    }

    pub(crate) fn into_failed(self) -> FailedJob {
        FailedJob {
            id: self.id,
            action: self.action,
            total: self.items.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            finished_at: Utc::now(),
        }
    }

    pub(crate) fn into_cancelled(self) -> CancelledJob {
        let current = self.current.min(self.items.len());
        let total = self.items.len();
        let mut processed = self.items;
        processed.truncate(current);
        CancelledJob {
            id: self.id,
            action: self.action,
            processed,
            succeeded: self.succeeded,
            failed: self.failed,
            total,
        }
    }
}

/// Job that finished with at least one failed id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    /// Job identifier.
    pub id: JobId,
    /// Action that was executed.
    pub action: ActionId,
    /// Number of ids in the job snapshot.
    pub total: usize,
    /// Ids processed successfully; these were removed from the selection.
    pub succeeded: Vec<ItemId>,
    /// Ids that failed; these stay selected for a retry.
    pub failed: Vec<FailedItem>,
    /// When the last id was processed.
    pub finished_at: DateTime<Utc>,
}

impl FailedJob {
    /// Failed ids without reasons.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failed.iter().map(|item| item.id.clone()).collect()
    }
}

/// Job that was cancelled before processing its whole snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CancelledJob {
    /// Job identifier.
    pub id: JobId,
    /// Action that was interrupted.
    pub action: ActionId,
    /// Ids processed before cancellation. Their work is not undone.
    pub processed: Vec<ItemId>,
    /// Processed ids that succeeded.
    pub succeeded: Vec<ItemId>,
    /// Processed ids that failed, with reasons.
    pub failed: Vec<FailedItem>,
    /// Number of ids in the job snapshot.
    pub total: usize,
}

impl CancelledJob {
    /// Processed count at the moment of cancellation.
    #[must_use]
    pub fn current(&self) -> usize {
        self.processed.len()
    }

    /// Failed ids without reasons.
    #[must_use]
    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failed.iter().map(|item| item.id.clone()).collect()
    }
}

/// Result handed to the completion callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Job identifier.
    pub job_id: JobId,
    /// Action that was executed.
    pub action: ActionId,
    /// Snapshot ids processed by the job.
    pub items: Vec<ItemId>,
}

/// What a single tick did to the workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The job advanced and still has pending ids.
    Progressed {
        /// Items processed so far.
        current: usize,
        /// Items in the job snapshot.
        total: usize,
    },
    /// The job finished cleanly; the workflow is back to `Idle`.
    Completed(Completion),
    /// The job finished with failures; the workflow is now `Failed`.
    Failed(FailedJob),
    /// No job was running (for example after a cancel), so the tick was dropped.
    Discarded,
}

/// Pad or truncate operation outcomes so they line up with `expected` ids.
#[must_use]
pub fn align_outcomes(mut outcomes: Vec<ItemOutcome>, expected: usize) -> Vec<ItemOutcome> {
    outcomes.truncate(expected);
    outcomes.resize_with(expected, || ItemOutcome::failed(MISSING_OUTCOME_REASON));
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(count: u64) -> BatchJob {
        BatchJob::new(
            ActionId::from("publish"),
            (1..=count).map(ItemId::from).collect(),
        )
    }

    #[test]
    fn record_advances_in_snapshot_order() {
        let mut job = job(3);
        assert_eq!(job.progress_label(), "0 of 3");
        assert_eq!(job.next_chunk(2), &[ItemId::from("1"), ItemId::from("2")]);
        assert_eq!(
            job.record(&[ItemOutcome::Succeeded, ItemOutcome::failed("locked")]),
            2
        );
        assert_eq!(job.current(), 2);
        assert_eq!(job.succeeded(), &[ItemId::from("1")]);
        assert_eq!(job.failed()[0].id, ItemId::from("2"));
        assert_eq!(job.percent_complete(), 66);
        assert_eq!(job.next_chunk(5), &[ItemId::from("3")]);
    }

    #[test]
    fn record_ignores_outcomes_past_the_snapshot() {
        let mut job = job(1);
        assert_eq!(
            job.record(&[ItemOutcome::Succeeded, ItemOutcome::Succeeded]),
            1
        );
        assert!(job.is_finished());
        assert!(job.next_chunk(1).is_empty());
        assert_eq!(job.percent_complete(), 100);
    }

    #[test]
    fn cancelled_job_keeps_processed_prefix() {
        let mut job = job(4);
        job.record(&[ItemOutcome::Succeeded]);
        let cancelled = job.into_cancelled();
        assert_eq!(cancelled.current(), 1);
        assert_eq!(cancelled.total, 4);
        assert_eq!(cancelled.processed, vec![ItemId::from("1")]);
    }

    #[test]
    fn cancelled_job_keeps_per_item_results() {
        let mut job = job(3);
        job.record(&[ItemOutcome::failed("locked"), ItemOutcome::Succeeded]);
        let cancelled = job.into_cancelled();
        assert_eq!(cancelled.current(), 2);
        assert_eq!(cancelled.succeeded, vec![ItemId::from("2")]);
        assert_eq!(cancelled.failed_ids(), vec![ItemId::from("1")]);
        assert_eq!(cancelled.failed[0].reason, "locked");
    }

    #[test]
    fn align_outcomes_pads_missing_entries() {
        let aligned = align_outcomes(vec![ItemOutcome::Succeeded], 3);
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[2], ItemOutcome::failed(MISSING_OUTCOME_REASON));
        assert_eq!(align_outcomes(aligned, 1), vec![ItemOutcome::Succeeded]);
    }

    #[test]
    fn state_names_are_stable() {
        assert_eq!(WorkflowState::Idle.name(), "idle");
        assert!(WorkflowState::default().is_idle());
        assert_eq!(WorkflowState::Running(job(1)).name(), "running");
    }
}
