//! Error types for bulk workflow operations.

use bulkflow_events::ActionId;
use thiserror::Error;

/// Errors raised while building an action catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two actions share the same identifier.
    #[error("duplicate action id")]
    DuplicateAction {
        /// Identifier declared more than once.
        action: ActionId,
    },
    /// An action was declared without a display label.
    #[error("action label must not be empty")]
    EmptyLabel {
        /// Identifier of the unlabeled action.
        action: ActionId,
    },
}

/// Primary error type for workflow transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// A batch job was requested with nothing selected.
    #[error("selection is empty")]
    EmptySelection,
    /// A confirming action was started without passing through confirmation.
    #[error("action requires confirmation")]
    ConfirmationRequired {
        /// Action that must be confirmed first.
        action: ActionId,
    },
    /// The action is not part of the workflow catalog.
    #[error("unknown action")]
    UnknownAction {
        /// Requested action identifier.
        action: ActionId,
    },
    /// The workflow is confirming, running, or showing a failure.
    #[error("workflow is busy")]
    Busy {
        /// Name of the state that rejected the request.
        state: &'static str,
    },
    /// Confirm/decline was requested with no pending confirmation.
    #[error("no confirmation is pending")]
    NotAwaitingConfirmation,
    /// Cancel or run was requested with no running job.
    #[error("no batch job is running")]
    NotRunning,
    /// Dismiss was requested while no failure is displayed.
    #[error("no failed job to dismiss")]
    NotFailed,
    /// Catalog construction failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Convenience alias for workflow results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
