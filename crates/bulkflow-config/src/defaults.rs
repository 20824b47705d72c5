//! Default values and accepted ranges for workflow settings.

/// Progress cadence of the simulated batch operation, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 300;
/// Ids handed to each unit of work.
pub const DEFAULT_CHUNK_SIZE: usize = 1;
/// Actions rendered as inline buttons before the overflow menu.
pub const DEFAULT_INLINE_ACTIONS: usize = 3;
/// Envelopes kept for replay on the event bus.
pub const DEFAULT_EVENT_REPLAY_CAPACITY: usize = 1_024;
/// Log level applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub(crate) const TICK_INTERVAL_RANGE: (u64, u64) = (1, 60_000);
pub(crate) const CHUNK_SIZE_RANGE: (u64, u64) = (1, 10_000);
pub(crate) const INLINE_ACTIONS_RANGE: (u64, u64) = (0, 32);
pub(crate) const REPLAY_CAPACITY_RANGE: (u64, u64) = (1, 1_000_000);
