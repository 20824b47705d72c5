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

//! Settings for bulk workflow hosts.
//!
//! Layout: `model.rs` (typed settings), `defaults.rs` (default values and
//! ranges), `validate.rs` (JSON patch validation), `loader.rs` (file and
//! environment sources), `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, ENV_PREFIX, SettingsLoader, env_patch};
pub use model::{LogFormatSetting, TelemetrySettings, WorkflowSettings};
pub use validate::apply_patch;
