//! Prometheus-backed metrics for bulk workflows.
//!
//! # Design
//! - Collectors are fed from [`WorkflowEvent`]s so the workflow crate stays
//!   free of metrics plumbing.
//! - Item counters are recorded from terminal job events, where the final
//!   status of each processed id is known.

use std::sync::Arc;

use bulkflow_events::{EventStream, WorkflowEvent};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry for one workflow host.
#[derive(Clone, Debug)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    jobs_started_total: IntCounterVec,
    jobs_finished_total: IntCounterVec,
    items_processed_total: IntCounterVec,
    events_emitted_total: IntCounter,
    active_jobs: IntGauge,
    selection_size: IntGauge,
}

/// Snapshot of gauges and counters for reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Jobs currently running.
    pub active_jobs: i64,
    /// Ids selected after the latest selection change.
    pub selection_size: i64,
    /// Workflow events observed.
    pub events_emitted_total: u64,
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricDefinition { metric: name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricDefinition { metric: name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricRegistration { metric: name, source })
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn as_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

impl Metrics {
    /// Construct a new metrics registry with the workflow collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let jobs_started_total = counter_vec(
            "bulk_jobs_started_total",
            "Batch jobs started by action",
            &["action"],
        )?;
        let jobs_finished_total = counter_vec(
            "bulk_jobs_finished_total",
            "Batch jobs finished by action and outcome",
            &["action", "outcome"],
        )?;
        let items_processed_total = counter_vec(
            "bulk_items_processed_total",
            "Items processed by batch jobs by action and status",
            &["action", "status"],
        )?;
        let events_emitted_total = IntCounter::with_opts(Opts::new(
            "bulk_events_emitted_total",
            "Workflow events observed",
        ))
        .map_err(|source| TelemetryError::MetricDefinition {
            metric: "bulk_events_emitted_total",
            source,
        })?;
        let active_jobs = gauge("bulk_active_jobs", "Batch jobs currently running")?;
        let selection_size = gauge("bulk_selection_size", "Ids currently selected")?;

        register(&registry, "bulk_jobs_started_total", &jobs_started_total)?;
        register(&registry, "bulk_jobs_finished_total", &jobs_finished_total)?;
        register(&registry, "bulk_items_processed_total", &items_processed_total)?;
        register(&registry, "bulk_events_emitted_total", &events_emitted_total)?;
        register(&registry, "bulk_active_jobs", &active_jobs)?;
        register(&registry, "bulk_selection_size", &selection_size)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                jobs_started_total,
                jobs_finished_total,
                items_processed_total,
                events_emitted_total,
                active_jobs,
                selection_size,
            }),
        })
    }

    /// Update collectors from one workflow event.
    pub fn observe(&self, event: &WorkflowEvent) {
        let inner = &self.inner;
        inner.events_emitted_total.inc();
        match event {
            WorkflowEvent::SelectionChanged { selected } => {
                inner.selection_size.set(saturating_i64(*selected));
            }
            WorkflowEvent::JobStarted { action, .. } => {
                inner
                    .jobs_started_total
                    .with_label_values(&[action.as_str()])
                    .inc();
                inner.active_jobs.inc();
            }
            WorkflowEvent::JobCompleted { action, items, .. } => {
                self.finish(action.as_str(), "completed");
                self.items(action.as_str(), "succeeded", items.len());
            }
            WorkflowEvent::JobCancelled {
                action,
                succeeded,
                failed,
                ..
            } => {
                self.finish(action.as_str(), "cancelled");
                self.items(action.as_str(), "succeeded", succeeded.len());
                self.items(action.as_str(), "failed", failed.len());
            }
            WorkflowEvent::JobFailed {
                action,
                succeeded,
                failed,
                ..
            } => {
                self.finish(action.as_str(), "failed");
                self.items(action.as_str(), "succeeded", succeeded.len());
                self.items(action.as_str(), "failed", failed.len());
            }
            WorkflowEvent::StaleSelectionPruned { .. }
            | WorkflowEvent::ConfirmationRequested { .. }
            | WorkflowEvent::ConfirmationDeclined { .. }
            | WorkflowEvent::JobProgress { .. }
            | WorkflowEvent::FailureDismissed { .. } => {}
        }
    }

    fn finish(&self, action: &str, outcome: &str) {
        self.inner
            .jobs_finished_total
            .with_label_values(&[action, outcome])
            .inc();
        self.inner.active_jobs.dec();
    }

    fn items(&self, action: &str, status: &str, count: usize) {
        if count > 0 {
            self.inner
                .items_processed_total
                .with_label_values(&[action, status])
                .inc_by(as_u64(count));
        }
    }

    /// Record every event from `stream` until the bus is dropped.
    #[must_use]
    pub fn spawn_recorder(&self, mut stream: EventStream) -> JoinHandle<()> {
        let metrics = self.clone();
        tokio::spawn(async move {
            while let Some(envelope) = stream.next().await {
                metrics.observe(&envelope.event);
            }
        })
    }

    /// Jobs finished for `action` with `outcome`.
    #[must_use]
    pub fn jobs_finished(&self, action: &str, outcome: &str) -> u64 {
        self.inner
            .jobs_finished_total
            .with_label_values(&[action, outcome])
            .get()
    }

    /// Items processed for `action` with `status`.
    #[must_use]
    pub fn items_processed(&self, action: &str, status: &str) -> u64 {
        self.inner
            .items_processed_total
            .with_label_values(&[action, status])
            .get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderedText { source })
    }

    /// Take a point-in-time snapshot of the gauges and event counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_jobs: self.inner.active_jobs.get(),
            selection_size: self.inner.selection_size.get(),
            events_emitted_total: self.inner.events_emitted_total.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkflow_events::{ActionId, EventBus, ItemId};
    use uuid::Uuid;

    fn ids(values: &[u64]) -> Vec<ItemId> {
        values.iter().copied().map(ItemId::from).collect()
    }

    #[test]
    fn job_lifecycle_updates_counters() -> Result<()> {
        let metrics = Metrics::new()?;
        let job_id = Uuid::new_v4();
        let action = ActionId::from("archive");
        metrics.observe(&WorkflowEvent::SelectionChanged { selected: 3 });
        metrics.observe(&WorkflowEvent::JobStarted {
            job_id,
            action: action.clone(),
            total: 3,
        });
        assert_eq!(metrics.snapshot().active_jobs, 1);
        metrics.observe(&WorkflowEvent::JobFailed {
            job_id,
            action,
            succeeded: ids(&[1, 3]),
            failed: ids(&[2]),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_jobs, 0);
        assert_eq!(snapshot.selection_size, 3);
        assert_eq!(snapshot.events_emitted_total, 3);
        assert_eq!(metrics.jobs_finished("archive", "failed"), 1);
        assert_eq!(metrics.items_processed("archive", "succeeded"), 2);
        assert_eq!(metrics.items_processed("archive", "failed"), 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("bulk_jobs_started_total"));
        assert!(rendered.contains("bulk_items_processed_total"));
        assert!(rendered.contains("bulk_selection_size 3"));
        Ok(())
    }

    #[test]
    fn registering_a_metric_twice_names_it() -> Result<()> {
        let registry = Registry::new();
        let active = gauge("bulk_active_jobs", "Batch jobs currently running")?;
        register(&registry, "bulk_active_jobs", &active)?;
        let err = register(&registry, "bulk_active_jobs", &active).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::MetricRegistration {
                metric: "bulk_active_jobs",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn cancelled_jobs_count_processed_items_by_result() -> Result<()> {
        let metrics = Metrics::new()?;
        let job_id = Uuid::new_v4();
        let action = ActionId::from("publish");
        metrics.observe(&WorkflowEvent::JobStarted {
            job_id,
            action: action.clone(),
            total: 4,
        });
        metrics.observe(&WorkflowEvent::JobCancelled {
            job_id,
            action,
            processed: ids(&[1, 2]),
            succeeded: ids(&[2]),
            failed: ids(&[1]),
            total: 4,
        });

        assert_eq!(metrics.jobs_finished("publish", "cancelled"), 1);
        assert_eq!(metrics.items_processed("publish", "succeeded"), 1);
        assert_eq!(metrics.items_processed("publish", "failed"), 1);
        assert_eq!(metrics.snapshot().active_jobs, 0);
        Ok(())
    }

    #[tokio::test]
    async fn recorder_drains_the_stream_until_the_bus_closes() -> Result<()> {
        let metrics = Metrics::new()?;
        let bus = EventBus::new();
        let recorder = metrics.spawn_recorder(bus.subscribe(None));
        let job_id = Uuid::new_v4();
        bus.publish(WorkflowEvent::JobStarted {
            job_id,
            action: ActionId::from("publish"),
            total: 1,
        });
        bus.publish(WorkflowEvent::JobCompleted {
            job_id,
            action: ActionId::from("publish"),
            items: ids(&[7]),
        });
        drop(bus);
        assert!(recorder.await.is_ok());

        assert_eq!(metrics.jobs_finished("publish", "completed"), 1);
        assert_eq!(metrics.items_processed("publish", "succeeded"), 1);
        assert_eq!(metrics.snapshot().active_jobs, 0);
        Ok(())
    }
}
