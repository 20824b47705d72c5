//! Typed workflow settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_CHUNK_SIZE, DEFAULT_EVENT_REPLAY_CAPACITY, DEFAULT_INLINE_ACTIONS, DEFAULT_LOG_LEVEL,
    DEFAULT_TICK_INTERVAL_MS,
};

/// Settings for one bulk workflow host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Cadence of the simulated operation, in milliseconds.
    pub tick_interval_ms: u64,
    /// Ids processed per unit of work.
    pub chunk_size: usize,
    /// Actions shown inline before the overflow menu.
    pub inline_actions: usize,
    /// Event envelopes retained for replay.
    pub event_replay_capacity: usize,
    /// Logging options.
    pub telemetry: TelemetrySettings,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            inline_actions: DEFAULT_INLINE_ACTIONS,
            event_replay_capacity: DEFAULT_EVENT_REPLAY_CAPACITY,
            telemetry: TelemetrySettings::default(),
        }
    }
}

impl WorkflowSettings {
    /// Tick cadence as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Logging options consumed by the telemetry crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format; `None` picks one based on the build profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormatSetting>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: None,
        }
    }
}

/// Log output format selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormatSetting {
    /// Human-readable output.
    Pretty,
    /// Structured JSON lines.
    Json,
}

impl LogFormatSetting {
    /// Parse the configuration spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = WorkflowSettings::default();
        assert_eq!(settings.tick_interval(), Duration::from_millis(300));
        assert_eq!(settings.chunk_size, 1);
        assert_eq!(settings.inline_actions, 3);
        assert_eq!(settings.event_replay_capacity, 1_024);
        assert_eq!(settings.telemetry.level, "info");
        assert!(settings.telemetry.log_format.is_none());
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!(LogFormatSetting::parse("JSON"), Some(LogFormatSetting::Json));
        assert_eq!(LogFormatSetting::parse(" pretty "), Some(LogFormatSetting::Pretty));
        assert_eq!(LogFormatSetting::parse("xml"), None);
    }
}
