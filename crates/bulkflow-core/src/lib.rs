#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Bulk-operation workflow: multi-select, an action catalog, and a batch
//! executor with confirmation, progress, and cancellation.
//!
//! Layout: `selection.rs` (selected-id set), `catalog.rs` (actions and
//! confirmation prompts), `executor.rs` (states and job record),
//! `workflow.rs` (state machine), `runner.rs` (async driver with
//! cancellation), `model.rs` (items and outcomes), `error.rs`.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod model;
pub mod runner;
pub mod selection;
pub mod workflow;

pub use bulkflow_events::{ActionId, ItemId, JobId};
pub use catalog::{Action, ActionCatalog, ActionSpec, ActionVariant, ConfirmPrompt};
pub use error::{CatalogError, WorkflowError, WorkflowResult};
pub use executor::{
    BatchJob, CancelledJob, Completion, FailedJob, MISSING_OUTCOME_REASON, TickOutcome,
    WorkflowState, align_outcomes,
};
pub use model::{FailedItem, Item, ItemOutcome, visible_ids};
pub use runner::{
    BatchOperation, BatchRunner, CancelHandle, DEFAULT_TICK_INTERVAL, RunReport,
    SimulatedOperation,
};
pub use selection::Selection;
pub use workflow::{Choice, CompletionCallback, PendingConfirmation, Workflow};
