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

//! Event bus for bulk workflows.
//!
//! The bus provides a typed event enum, sequential identifiers, and support for
//! replaying recent events when observers reconnect. Internally it uses
//! `tokio::broadcast` with a bounded buffer; when the channel overflows, the
//! oldest events are dropped.
//!
//! Layout: `ids.rs` (item/action/job identifiers), `payloads.rs` (event enum and
//! envelope), `bus.rs` (`EventBus` + `EventStream`).

pub mod bus;
pub mod ids;
pub mod payloads;

pub use bus::{EventBus, EventStream};
pub use ids::{ActionId, ItemId, JobId};
pub use payloads::{DEFAULT_REPLAY_CAPACITY, EventEnvelope, EventId, WorkflowEvent};
