//! Error types for telemetry operations.

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while wiring logging or exporting workflow metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("tracing subscriber could not be installed")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
    /// A workflow metric has an invalid name, help text, or label set.
    #[error("invalid definition for metric {metric}")]
    MetricDefinition {
        /// Metric whose definition was rejected.
        metric: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// A workflow metric clashed with a collector already in the registry.
    #[error("metric {metric} could not be registered")]
    MetricRegistration {
        /// Metric that failed to register.
        metric: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// Gathered metric families could not be written as Prometheus text.
    #[error("metrics could not be rendered as prometheus text")]
    Render {
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// The text encoder produced bytes that are not UTF-8.
    #[error("rendered metrics were not utf-8")]
    RenderedText {
        /// Underlying UTF-8 conversion error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn metric_errors_name_the_metric() {
        let err = TelemetryError::MetricRegistration {
            metric: "bulk_active_jobs",
            source: PrometheusError::AlreadyReg,
        };
        assert_eq!(err.to_string(), "metric bulk_active_jobs could not be registered");
        assert!(err.source().is_some());

        let err = TelemetryError::MetricDefinition {
            metric: "bulk_jobs_started_total",
            source: PrometheusError::Msg("bad label".to_string()),
        };
        assert!(err.to_string().ends_with("bulk_jobs_started_total"));
    }

    #[test]
    fn render_errors_keep_their_cause() {
        let utf8 = String::from_utf8(vec![0, 159]).unwrap_err();
        let err = TelemetryError::RenderedText { source: utf8 };
        assert_eq!(err.to_string(), "rendered metrics were not utf-8");
        assert!(err.source().is_some());
    }
}
