//! Validation of settings documents.
//!
//! # Design
//! - Documents are applied as partial patches over the current settings, so a
//!   file only needs the fields it changes.
//! - Unknown keys are errors rather than silently ignored.

use serde_json::{Map, Value};

use crate::defaults::{
    CHUNK_SIZE_RANGE, INLINE_ACTIONS_RANGE, REPLAY_CAPACITY_RANGE, TICK_INTERVAL_RANGE,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{LogFormatSetting, WorkflowSettings};

pub(crate) const WORKFLOW_SECTION: &str = "workflow";
pub(crate) const TELEMETRY_SECTION: &str = "telemetry";

/// Apply a JSON patch to `settings`, validating every field it touches.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownField`] for keys outside the schema and
/// [`ConfigError::InvalidField`] when a value has the wrong type or range.
/// `settings` is left untouched on error.
pub fn apply_patch(settings: &mut WorkflowSettings, patch: &Value) -> ConfigResult<()> {
    let map = as_object(patch, WORKFLOW_SECTION, "<root>")?;
    let mut next = settings.clone();

    for (key, value) in map {
        match key.as_str() {
            "tick_interval_ms" => {
                next.tick_interval_ms = parse_in_range(value, key, TICK_INTERVAL_RANGE)?;
            }
            "chunk_size" => next.chunk_size = parse_usize(value, key, CHUNK_SIZE_RANGE)?,
            "inline_actions" => {
                next.inline_actions = parse_usize(value, key, INLINE_ACTIONS_RANGE)?;
            }
            "event_replay_capacity" => {
                next.event_replay_capacity = parse_usize(value, key, REPLAY_CAPACITY_RANGE)?;
            }
            "telemetry" => apply_telemetry(&mut next, value)?,
            other => return Err(ConfigError::unknown(WORKFLOW_SECTION, other)),
        }
    }

    *settings = next;
    Ok(())
}

fn apply_telemetry(settings: &mut WorkflowSettings, value: &Value) -> ConfigResult<()> {
    let map = as_object(value, TELEMETRY_SECTION, "telemetry")?;
    for (key, value) in map {
        match key.as_str() {
            "level" => settings.telemetry.level = parse_level(value)?,
            "log_format" => settings.telemetry.log_format = parse_log_format(value)?,
            other => return Err(ConfigError::unknown(TELEMETRY_SECTION, other)),
        }
    }
    Ok(())
}

fn as_object<'a>(
    value: &'a Value,
    section: &str,
    field: &str,
) -> ConfigResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ConfigError::invalid(section, field, Some(value.to_string()), "must be an object")
    })
}

fn parse_in_range(value: &Value, field: &str, (min, max): (u64, u64)) -> ConfigResult<u64> {
    let number = value.as_u64().ok_or_else(|| {
        ConfigError::invalid(
            WORKFLOW_SECTION,
            field,
            Some(value.to_string()),
            "must be a non-negative integer",
        )
    })?;
    if number < min || number > max {
        return Err(ConfigError::invalid(
            WORKFLOW_SECTION,
            field,
            Some(number.to_string()),
            "out of range",
        ));
    }
    Ok(number)
}

fn parse_usize(value: &Value, field: &str, range: (u64, u64)) -> ConfigResult<usize> {
    let number = parse_in_range(value, field, range)?;
    usize::try_from(number).map_err(|_| {
        ConfigError::invalid(
            WORKFLOW_SECTION,
            field,
            Some(number.to_string()),
            "does not fit the platform word size",
        )
    })
}

fn parse_level(value: &Value) -> ConfigResult<String> {
    let level = value.as_str().map(str::trim).unwrap_or_default();
    if level.is_empty() || level.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            TELEMETRY_SECTION,
            "level",
            Some(value.to_string()),
            "must be a non-empty filter directive",
        ));
    }
    Ok(level.to_string())
}

fn parse_log_format(value: &Value) -> ConfigResult<Option<LogFormatSetting>> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_str()
        .and_then(LogFormatSetting::parse)
        .map(Some)
        .ok_or_else(|| {
            ConfigError::invalid(
                TELEMETRY_SECTION,
                "log_format",
                Some(value.to_string()),
                "must be `pretty` or `json`",
            )
        })
}
