//! Shared command context, errors, and exit codes.

use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use bulkflow_config::{ConfigError, WorkflowSettings};
use bulkflow_core::WorkflowError;

use crate::cli::OutputFormat;

/// Error surfaced to the user, tagged with its exit code.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<WorkflowError> for CliError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::UnknownAction { action } => {
                Self::validation(format!("unknown action '{action}'"))
            }
            WorkflowError::ConfirmationRequired { action } => Self::validation(format!(
                "action '{action}' requires confirmation; pass --confirm or --decline"
            )),
            WorkflowError::Busy { state } => {
                Self::validation(format!("workflow is busy ({state})"))
            }
            WorkflowError::Catalog(err) => Self::failure(anyhow!("invalid action catalog: {err}")),
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidField {
                section,
                field,
                value,
                reason,
            } => Self::validation(format!(
                "invalid setting {section}.{field}{}: {reason}",
                value.map(|value| format!(" = {value}")).unwrap_or_default()
            )),
            ConfigError::UnknownField { section, field } => {
                Self::validation(format!("unknown setting {section}.{field}"))
            }
            other => Self::failure(other),
        }
    }
}

/// Settings and output preferences shared by every command.
pub(crate) struct AppContext {
    pub(crate) settings: WorkflowSettings,
    pub(crate) output: OutputFormat,
}
