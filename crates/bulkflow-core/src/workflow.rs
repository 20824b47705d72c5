//! Bulk workflow state machine: selection, confirmation, progress, and cancel.
//!
//! # Design
//! - A single `Workflow` owns its selection and executor state; the item
//!   collection stays with the caller and is passed in as visible ids.
//! - Every transition publishes a [`WorkflowEvent`] when an [`EventBus`] is
//!   attached and logs through `tracing`.
//! - Partial failure is a state (`Failed`), not an error.

use std::fmt;
use std::sync::Arc;

use bulkflow_events::{ActionId, EventBus, ItemId, JobId, WorkflowEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{Action, ActionCatalog};
use crate::error::{WorkflowError, WorkflowResult};
use crate::executor::{
    BatchJob, CancelledJob, Completion, FailedJob, TickOutcome, WorkflowState,
};
use crate::model::ItemOutcome;
use crate::runner::CancelHandle;
use crate::selection::Selection;

/// Callback invoked once per successful job with the snapshot ids and action.
pub type CompletionCallback = Box<dyn FnMut(&[ItemId], &ActionId) + Send>;

/// Result of choosing an action from the bulk action bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Choice {
    /// The action runs without confirmation; the job is now running.
    Started(JobId),
    /// The action needs confirmation; a dialog should be shown.
    AwaitingConfirmation,
}

/// Confirmation dialog contents for a pending action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConfirmation<'a> {
    /// Action that runs when confirmed.
    pub action: &'a Action,
    /// Ids captured when the action was chosen.
    pub snapshot: &'a [ItemId],
}

/// Bulk-operation workflow for one list screen.
pub struct Workflow {
    catalog: Arc<ActionCatalog>,
    selection: Selection,
    state: WorkflowState,
    events: Option<EventBus>,
    on_complete: Option<CompletionCallback>,
    cancel: CancellationToken,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("catalog", &self.catalog)
            .field("selection", &self.selection)
            .field("state", &self.state)
            .field("has_events", &self.events.is_some())
            .field("has_callback", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Create an idle workflow over `catalog`.
    #[must_use]
    pub fn new(catalog: impl Into<Arc<ActionCatalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            selection: Selection::new(),
            state: WorkflowState::Idle,
            events: None,
            on_complete: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Publish transitions on `bus`.
    #[must_use]
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Register the completion callback.
    #[must_use]
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&[ItemId], &ActionId) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Action catalog backing this workflow.
    #[must_use]
    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Current executor state.
    #[must_use]
    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Whether a dialog, job, or failure is active.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        !self.state.is_idle()
    }

    /// Number of selected ids.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.count()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selection.is_selected(id)
    }

    /// Whether every visible id is selected.
    #[must_use]
    pub fn is_all_selected(&self, visible: &[ItemId]) -> bool {
        self.selection.is_all_selected(visible)
    }

    /// Toggle one id.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Busy`] unless the workflow is idle.
    pub fn toggle(&mut self, id: ItemId) -> WorkflowResult<()> {
        self.ensure_idle()?;
        self.selection.toggle(id);
        self.selection_changed();
        Ok(())
    }

    /// Select every visible id.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Busy`] unless the workflow is idle.
    pub fn select_all(&mut self, visible: &[ItemId]) -> WorkflowResult<()> {
        self.ensure_idle()?;
        self.selection.select_all(visible);
        self.selection_changed();
        Ok(())
    }

    /// Header checkbox: select all visible ids, or clear when all are selected.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Busy`] unless the workflow is idle.
    pub fn toggle_all(&mut self, visible: &[ItemId]) -> WorkflowResult<()> {
        self.ensure_idle()?;
        self.selection.toggle_all(visible);
        self.selection_changed();
        Ok(())
    }

    /// Empty the selection.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Busy`] unless the workflow is idle.
    pub fn clear(&mut self) -> WorkflowResult<()> {
        self.ensure_idle()?;
        self.selection.clear();
        self.selection_changed();
        Ok(())
    }

    /// React to the caller's collection changing. Stale ids are dropped from
    /// the selection in any state; running jobs keep their own snapshot.
    pub fn sync_collection(&mut self, visible: &[ItemId]) -> Vec<ItemId> {
        let removed = self.selection.retain_visible(visible);
        if !removed.is_empty() {
            debug!(
                removed = removed.len(),
                state = self.state.name(),
                "pruned stale selection"
            );
            self.publish(WorkflowEvent::StaleSelectionPruned {
                removed: removed.clone(),
            });
            self.selection_changed();
        }
        removed
    }

    /// Actions to render; empty while busy or when nothing is selected.
    #[must_use]
    pub fn available_actions(&self) -> &[Action] {
        if self.is_busy() {
            return &[];
        }
        self.catalog.available(self.selection.count())
    }

    /// Choose an action from the bulk action bar.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Busy`] when not idle,
    /// [`WorkflowError::UnknownAction`] for ids outside the catalog, and
    /// [`WorkflowError::EmptySelection`] when nothing is selected.
    pub fn choose(&mut self, action_id: &ActionId) -> WorkflowResult<Choice> {
        let action = self.ready_action(action_id)?;
        if action.requires_confirmation() {
            let snapshot = self.selection.snapshot();
            info!(
                action = %action_id,
                selected = snapshot.len(),
                "awaiting confirmation"
            );
            self.publish(WorkflowEvent::ConfirmationRequested {
                action: action_id.clone(),
                selected: snapshot.len(),
            });
            self.state = WorkflowState::AwaitingConfirmation { action, snapshot };
            return Ok(Choice::AwaitingConfirmation);
        }
        let snapshot = self.selection.snapshot();
        Ok(Choice::Started(self.begin_job(action_id.clone(), snapshot)))
    }

    /// Start a non-confirming action programmatically.
    ///
    /// # Errors
    ///
    /// Same as [`Workflow::choose`], plus
    /// [`WorkflowError::ConfirmationRequired`] for confirming actions.
    pub fn start(&mut self, action_id: &ActionId) -> WorkflowResult<JobId> {
        let action = self.ready_action(action_id)?;
        if action.requires_confirmation() {
            return Err(WorkflowError::ConfirmationRequired {
                action: action_id.clone(),
            });
        }
        let snapshot = self.selection.snapshot();
        Ok(self.begin_job(action_id.clone(), snapshot))
    }

    /// Confirmation dialog contents, when one is pending.
    #[must_use]
    pub fn pending_confirmation(&self) -> Option<PendingConfirmation<'_>> {
        match &self.state {
            WorkflowState::AwaitingConfirmation { action, snapshot } => {
                Some(PendingConfirmation { action, snapshot })
            }
            _ => None,
        }
    }

    /// Confirm the pending action and run it over the snapshot taken at choose time.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAwaitingConfirmation`] when no dialog is open.
    pub fn confirm(&mut self) -> WorkflowResult<JobId> {
        match std::mem::take(&mut self.state) {
            WorkflowState::AwaitingConfirmation { action, snapshot } => {
                info!(action = %action.id(), "confirmation accepted");
                Ok(self.begin_job(action.id().clone(), snapshot))
            }
            other => {
                self.state = other;
                Err(WorkflowError::NotAwaitingConfirmation)
            }
        }
    }

    /// Decline the pending action. The selection is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotAwaitingConfirmation`] when no dialog is open.
    pub fn decline(&mut self) -> WorkflowResult<()> {
        match std::mem::take(&mut self.state) {
            WorkflowState::AwaitingConfirmation { action, .. } => {
                info!(action = %action.id(), "confirmation declined");
                self.publish(WorkflowEvent::ConfirmationDeclined {
                    action: action.id().clone(),
                });
                Ok(())
            }
            other => {
                self.state = other;
                Err(WorkflowError::NotAwaitingConfirmation)
            }
        }
    }

    /// Running job, if any.
    #[must_use]
    pub const fn job(&self) -> Option<&BatchJob> {
        match &self.state {
            WorkflowState::Running(job) => Some(job),
            _ => None,
        }
    }

    /// Failure shown by the error affordance, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&FailedJob> {
        match &self.state {
            WorkflowState::Failed(failed) => Some(failed),
            _ => None,
        }
    }

    /// Handle that cancels the running job from another task.
    #[must_use]
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.job()
            .map(|job| CancelHandle::new(job.id(), self.cancel.clone()))
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Apply the outcomes of one unit of work for `job_id` to its next
    /// pending ids.
    ///
    /// An empty slice leaves the job untouched. Ticks arriving when no job is
    /// running, or addressed to a job other than the running one (a late tick
    /// from a cancelled job), are dropped and reported as
    /// [`TickOutcome::Discarded`].
    pub fn tick(&mut self, job_id: JobId, outcomes: &[ItemOutcome]) -> TickOutcome {
        let WorkflowState::Running(job) = &mut self.state else {
            debug!(state = self.state.name(), %job_id, "discarding tick outside a running job");
            return TickOutcome::Discarded;
        };
        if job.id() != job_id {
            debug!(%job_id, running = %job.id(), "discarding tick for a stale job");
            return TickOutcome::Discarded;
        }
        if job.record(outcomes) == 0 {
            return TickOutcome::Progressed {
                current: job.current(),
                total: job.total(),
            };
        }
        let (current, total) = (job.current(), job.total());
        debug!(job_id = %job_id, current, total, "job progressed");
        self.publish(WorkflowEvent::JobProgress {
            job_id,
            current,
            total,
        });
        if current < total {
            return TickOutcome::Progressed { current, total };
        }
        self.finish_job()
    }

    /// Tick a single successful item for `job_id`, as a fixed-cadence timer
    /// would.
    pub fn advance(&mut self, job_id: JobId) -> TickOutcome {
        self.tick(job_id, &[ItemOutcome::Succeeded])
    }

    /// Cancel the running job. Processed items are not rolled back and the
    /// selection is left as it was before the job.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotRunning`] when no job is running.
    pub fn cancel(&mut self) -> WorkflowResult<CancelledJob> {
        match std::mem::take(&mut self.state) {
            WorkflowState::Running(job) => {
                self.cancel.cancel();
                let cancelled = job.into_cancelled();
                warn!(
                    job_id = %cancelled.id,
                    action = %cancelled.action,
                    current = cancelled.current(),
                    total = cancelled.total,
                    "job cancelled"
                );
                self.publish(WorkflowEvent::JobCancelled {
                    job_id: cancelled.id,
                    action: cancelled.action.clone(),
                    processed: cancelled.processed.clone(),
                    succeeded: cancelled.succeeded.clone(),
                    failed: cancelled.failed_ids(),
                    total: cancelled.total,
                });
                Ok(cancelled)
            }
            other => {
                self.state = other;
                Err(WorkflowError::NotRunning)
            }
        }
    }

    /// Close the failure affordance and return to idle.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFailed`] when no failure is shown.
    pub fn dismiss(&mut self) -> WorkflowResult<FailedJob> {
        match std::mem::take(&mut self.state) {
            WorkflowState::Failed(failed) => {
                info!(job_id = %failed.id, "failure dismissed");
                self.publish(WorkflowEvent::FailureDismissed { job_id: failed.id });
                Ok(failed)
            }
            other => {
                self.state = other;
                Err(WorkflowError::NotFailed)
            }
        }
    }

    fn ensure_idle(&self) -> WorkflowResult<()> {
        if self.state.is_idle() {
            Ok(())
        } else {
            Err(WorkflowError::Busy {
                state: self.state.name(),
            })
        }
    }

    fn ready_action(&self, action_id: &ActionId) -> WorkflowResult<Action> {
        self.ensure_idle()?;
        let action = self
            .catalog
            .get(action_id)
            .ok_or_else(|| WorkflowError::UnknownAction {
                action: action_id.clone(),
            })?;
        if self.selection.is_empty() {
            return Err(WorkflowError::EmptySelection);
        }
        Ok(action.clone())
    }

    fn begin_job(&mut self, action: ActionId, snapshot: Vec<ItemId>) -> JobId {
        let job = BatchJob::new(action, snapshot);
        let job_id = job.id();
        info!(job_id = %job_id, action = %job.action(), total = job.total(), "job started");
        self.publish(WorkflowEvent::JobStarted {
            job_id,
            action: job.action().clone(),
            total: job.total(),
        });
        self.cancel = CancellationToken::new();
        self.state = WorkflowState::Running(job);
        job_id
    }

    fn finish_job(&mut self) -> TickOutcome {
        let WorkflowState::Running(job) = std::mem::take(&mut self.state) else {
            return TickOutcome::Discarded;
        };
        if job.has_failures() {
            let failed = job.into_failed();
            self.selection.remove_all(&failed.succeeded);
            warn!(
                job_id = %failed.id,
                action = %failed.action,
                succeeded = failed.succeeded.len(),
                failed = failed.failed.len(),
                "job finished with failures"
            );
            self.publish(WorkflowEvent::JobFailed {
                job_id: failed.id,
                action: failed.action.clone(),
                succeeded: failed.succeeded.clone(),
                failed: failed.failed_ids(),
            });
            self.selection_changed();
            self.state = WorkflowState::Failed(failed.clone());
            return TickOutcome::Failed(failed);
        }

        let completion = Completion {
            job_id: job.id(),
            action: job.action().clone(),
            items: job.items().to_vec(),
        };
        self.selection.clear();
        self.selection_changed();
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&completion.items, &completion.action);
        }
        info!(
            job_id = %completion.job_id,
            action = %completion.action,
            items = completion.items.len(),
            "job completed"
        );
        self.publish(WorkflowEvent::JobCompleted {
            job_id: completion.job_id,
            action: completion.action.clone(),
            items: completion.items.clone(),
        });
        TickOutcome::Completed(completion)
    }

    fn selection_changed(&self) {
        self.publish(WorkflowEvent::SelectionChanged {
            selected: self.selection.count(),
        });
    }

    fn publish(&self, event: WorkflowEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}
