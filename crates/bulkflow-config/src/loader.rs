//! Settings loader: defaults, then an optional JSON document, then `BULKFLOW_*`
//! environment overrides.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::WorkflowSettings;
use crate::validate::{TELEMETRY_SECTION, WORKFLOW_SECTION, apply_patch};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "BULKFLOW_";

/// Environment variable naming the settings document. Read by the CLI, not
/// treated as an override.
pub const CONFIG_PATH_ENV: &str = "BULKFLOW_CONFIG";

/// Builder that resolves [`WorkflowSettings`] from its sources.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    path: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl SettingsLoader {
    /// Loader that yields defaults until sources are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from a JSON document.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Apply overrides from the given variables (only `BULKFLOW_*` keys are used).
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Apply overrides from the process environment.
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(std::env::vars())
    }

    /// Resolve the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`] when the document
    /// cannot be read, and validation errors for bad fields in either source.
    pub async fn load(&self) -> ConfigResult<WorkflowSettings> {
        let mut settings = WorkflowSettings::default();
        if let Some(path) = &self.path {
            let document = read_document(path).await?;
            apply_patch(&mut settings, &document)?;
            info!(path = %path.display(), "loaded settings document");
        }
        let overrides = env_patch(&self.env)?;
        if overrides.as_object().is_some_and(|map| !map.is_empty()) {
            apply_patch(&mut settings, &overrides)?;
        }
        debug!(
            tick_interval_ms = settings.tick_interval_ms,
            chunk_size = settings.chunk_size,
            inline_actions = settings.inline_actions,
            "settings resolved"
        );
        Ok(settings)
    }
}

async fn read_document(path: &Path) -> ConfigResult<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            operation: "settings.read",
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Translate `BULKFLOW_*` variables into a settings patch.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when a numeric override does not parse.
pub fn env_patch(vars: &[(String, String)]) -> ConfigResult<Value> {
    let mut root = Map::new();
    let mut telemetry = Map::new();

    for (key, raw) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        match name {
            "TICK_INTERVAL_MS" | "CHUNK_SIZE" | "INLINE_ACTIONS" | "EVENT_REPLAY_CAPACITY" => {
                let field = name.to_ascii_lowercase();
                let number = raw.trim().parse::<u64>().map_err(|_| {
                    ConfigError::invalid(
                        WORKFLOW_SECTION,
                        &field,
                        Some(raw.clone()),
                        "must be a non-negative integer",
                    )
                })?;
                root.insert(field, Value::from(number));
            }
            "LOG_LEVEL" => {
                telemetry.insert("level".to_string(), Value::from(raw.as_str()));
            }
            "LOG_FORMAT" => {
                telemetry.insert("log_format".to_string(), Value::from(raw.as_str()));
            }
            _ => debug!(variable = %key, "ignoring unrecognised environment override"),
        }
    }

    if !telemetry.is_empty() {
        root.insert(TELEMETRY_SECTION.to_string(), Value::Object(telemetry));
    }
    Ok(Value::Object(root))
}
