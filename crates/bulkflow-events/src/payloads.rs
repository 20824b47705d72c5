//! Event payload types emitted by bulk workflows.

use chrono::{DateTime, Utc};

use crate::ids::{ActionId, ItemId, JobId};

/// Identifier assigned to each event published on the bus.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed workflow events surfaced to observers (progress bars, toasts, logs).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// The selection set changed size.
    SelectionChanged {
        /// Number of ids selected after the change.
        selected: usize,
    },
    /// Ids that no longer exist in the collection were dropped from the selection.
    StaleSelectionPruned {
        /// Ids removed from the selection.
        removed: Vec<ItemId>,
    },
    /// A confirming action was chosen and is waiting for the user.
    ConfirmationRequested {
        /// Action awaiting confirmation.
        action: ActionId,
        /// Number of ids captured for the pending job.
        selected: usize,
    },
    /// The user declined a pending confirmation.
    ConfirmationDeclined {
        /// Action that was declined.
        action: ActionId,
    },
    /// A batch job started running.
    JobStarted {
        /// Job identifier.
        job_id: JobId,
        /// Action being executed.
        action: ActionId,
        /// Number of ids in the job snapshot.
        total: usize,
    },
    /// A batch job processed another item or chunk.
    JobProgress {
        /// Job identifier.
        job_id: JobId,
        /// Items processed so far.
        current: usize,
        /// Items in the job snapshot.
        total: usize,
    },
    /// A batch job processed every item successfully.
    JobCompleted {
        /// Job identifier.
        job_id: JobId,
        /// Action that was executed.
        action: ActionId,
        /// Ids handed to the completion callback.
        items: Vec<ItemId>,
    },
    /// A running batch job was cancelled by the user.
    JobCancelled {
        /// Job identifier.
        job_id: JobId,
        /// Action that was interrupted.
        action: ActionId,
        /// Items processed before cancellation; the caller reconciles these.
        processed: Vec<ItemId>,
        /// Processed items that succeeded.
        succeeded: Vec<ItemId>,
        /// Processed items that failed.
        failed: Vec<ItemId>,
        /// Items in the job snapshot.
        total: usize,
    },
    /// A batch job finished with at least one failed item.
    JobFailed {
        /// Job identifier.
        job_id: JobId,
        /// Action that was executed.
        action: ActionId,
        /// Ids that were processed successfully.
        succeeded: Vec<ItemId>,
        /// Ids that failed.
        failed: Vec<ItemId>,
    },
    /// The error affordance for a failed job was dismissed.
    FailureDismissed {
        /// Job identifier.
        job_id: JobId,
    },
}

impl WorkflowEvent {
    /// Machine-friendly discriminator for subscribers and metrics labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SelectionChanged { .. } => "selection_changed",
            Self::StaleSelectionPruned { .. } => "stale_selection_pruned",
            Self::ConfirmationRequested { .. } => "confirmation_requested",
            Self::ConfirmationDeclined { .. } => "confirmation_declined",
            Self::JobStarted { .. } => "job_started",
            Self::JobProgress { .. } => "job_progress",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobCancelled { .. } => "job_cancelled",
            Self::JobFailed { .. } => "job_failed",
            Self::FailureDismissed { .. } => "failure_dismissed",
        }
    }

    /// Job identifier carried by job-scoped events.
    #[must_use]
    pub const fn job_id(&self) -> Option<JobId> {
        match self {
            Self::JobStarted { job_id, .. }
            | Self::JobProgress { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobCancelled { job_id, .. }
            | Self::JobFailed { job_id, .. }
            | Self::FailureDismissed { job_id } => Some(*job_id),
            _ => None,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the bus.
    pub id: EventId,
    /// Time the event was published.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub event: WorkflowEvent,
}
