//! Execute a bulk action over the mock products.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use bulkflow_core::{
    ActionId, BatchRunner, CancelHandle, Choice, ItemId, RunReport, SimulatedOperation, Workflow,
    WorkflowError, visible_ids,
};
use bulkflow_events::{EventBus, EventEnvelope, EventStream, WorkflowEvent};
use bulkflow_telemetry::{Metrics, MetricsSnapshot};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cli::{OutputFormat, RunArgs};
use crate::context::{AppContext, CliError, CliResult};
use crate::demo;
use crate::output::{render_events, render_run};

/// One completion callback invocation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(crate) struct CallbackRecord {
    pub(crate) action: ActionId,
    pub(crate) items: Vec<ItemId>,
}

/// How the requested action ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum RunStatus {
    /// The confirmation dialog was declined; nothing ran.
    Declined,
    /// The job ran and produced a report.
    Finished(RunReport),
}

/// Everything a run produced, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) action: ActionId,
    pub(crate) result: RunStatus,
    pub(crate) callbacks: Vec<CallbackRecord>,
    pub(crate) selection_remaining: Vec<ItemId>,
    pub(crate) metrics: MetricsSnapshot,
}

#[derive(Debug)]
struct Execution {
    summary: RunSummary,
    history: Vec<EventEnvelope>,
    metrics: Metrics,
}

pub(crate) async fn handle_run(ctx: &AppContext, args: &RunArgs) -> CliResult<()> {
    let live = ctx.output == OutputFormat::Table;
    let execution = execute(ctx, args, live).await?;
    render_run(&execution.summary, ctx.output)?;
    if args.metrics {
        let text = execution.metrics.render().map_err(CliError::failure)?;
        print!("{text}");
    }
    if let RunStatus::Finished(RunReport::Failed { failed, .. }) = &execution.summary.result {
        return Err(CliError::failure(anyhow!(
            "{} item(s) failed; they remain selected",
            failed.len()
        )));
    }
    Ok(())
}

pub(crate) async fn handle_events(ctx: &AppContext, args: &RunArgs) -> CliResult<()> {
    let execution = execute(ctx, args, false).await?;
    render_events(&execution.history, ctx.output)
}

async fn execute(ctx: &AppContext, args: &RunArgs, live: bool) -> CliResult<Execution> {
    let products = demo::products();
    let visible = visible_ids(&products);
    let catalog = demo::catalog().map_err(WorkflowError::from)?;
    let action = ActionId::from(args.action.trim());
    let selected = resolve_ids(&visible, &args.select, "--select")?;
    let failing = resolve_ids(&visible, &args.fail, "--fail")?;

    let bus = EventBus::with_capacity(ctx.settings.event_replay_capacity);
    let metrics = Metrics::new().map_err(CliError::failure)?;
    let recorder = metrics.spawn_recorder(bus.subscribe(None));
    let callbacks: Arc<Mutex<Vec<CallbackRecord>>> = Arc::default();
    let sink = Arc::clone(&callbacks);

    let mut workflow = Workflow::new(catalog)
        .with_events(bus.clone())
        .on_complete(move |items, action| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(CallbackRecord {
                    action: action.clone(),
                    items: items.to_vec(),
                });
        });

    if args.all {
        workflow.select_all(&visible)?;
    } else {
        for id in selected {
            workflow.toggle(id)?;
        }
    }

    let mut watcher = None;
    let result = match choose(&mut workflow, &action, args)? {
        Some(status) => status,
        None => {
            let handle = workflow
                .cancel_handle()
                .ok_or(WorkflowError::NotRunning)?;
            if args.cancel_after == Some(0) {
                handle.cancel();
            }
            watcher = Some(spawn_progress_watcher(
                bus.subscribe(bus.last_event_id()),
                handle,
                args.cancel_after,
                live,
            ));
            let operation =
                SimulatedOperation::new(ctx.settings.tick_interval()).failing(failing);
            let report = BatchRunner::new(ctx.settings.chunk_size)
                .run(&mut workflow, &operation)
                .await?;
            info!(job_id = %report.job_id(), outcome = report.outcome(), "bulk action finished");
            RunStatus::Finished(report)
        }
    };

    if workflow.failure().is_some() {
        workflow.dismiss()?;
    }
    let selection_remaining = workflow.selection().snapshot();
    let history = bus.history();
    drop(workflow);
    drop(bus);

    if let Some(watcher) = watcher {
        watcher
            .await
            .map_err(|err| CliError::failure(anyhow!("progress watcher stopped: {err}")))?;
    }
    recorder
        .await
        .map_err(|err| CliError::failure(anyhow!("metrics recorder stopped: {err}")))?;

    let callbacks = callbacks
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Ok(Execution {
        summary: RunSummary {
            action,
            result,
            callbacks,
            selection_remaining,
            metrics: metrics.snapshot(),
        },
        history,
        metrics,
    })
}

/// Choose the action and resolve any confirmation. Returns a status when the
/// run ends without a job.
fn choose(
    workflow: &mut Workflow,
    action: &ActionId,
    args: &RunArgs,
) -> CliResult<Option<RunStatus>> {
    match workflow.choose(action)? {
        Choice::Started(_) => Ok(None),
        Choice::AwaitingConfirmation => {
            if args.decline {
                workflow.decline()?;
                return Ok(Some(RunStatus::Declined));
            }
            if !args.confirm {
                workflow.decline()?;
                return Err(WorkflowError::ConfirmationRequired {
                    action: action.clone(),
                }
                .into());
            }
            if let Some(pending) = workflow.pending_confirmation()
                && let Some(prompt) = pending.action.prompt()
            {
                info!(
                    title = %prompt.title,
                    body = %prompt.body_for(pending.snapshot.len()),
                    "confirming"
                );
            }
            workflow.confirm()?;
            Ok(None)
        }
    }
}

fn spawn_progress_watcher(
    mut stream: EventStream,
    handle: CancelHandle,
    cancel_after: Option<usize>,
    print: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            if let WorkflowEvent::JobProgress { current, total, .. } = envelope.event {
                if print {
                    println!("progress: {current} of {total}");
                }
                if cancel_after.is_some_and(|limit| current >= limit) && !handle.is_cancelled() {
                    handle.cancel();
                }
            }
        }
    })
}

/// Parse product ids given on the command line, keeping first-seen order.
fn resolve_ids(visible: &[ItemId], raw: &[String], flag: &str) -> CliResult<Vec<ItemId>> {
    let mut resolved: Vec<ItemId> = Vec::with_capacity(raw.len());
    for value in raw {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let id = ItemId::from(value);
        if !visible.contains(&id) {
            return Err(CliError::validation(format!(
                "unknown product id '{value}' in {flag}"
            )));
        }
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkflow_config::WorkflowSettings;

    fn ctx(tick_interval_ms: u64) -> AppContext {
        AppContext {
            settings: WorkflowSettings {
                tick_interval_ms,
                ..WorkflowSettings::default()
            },
            output: OutputFormat::Json,
        }
    }

    fn args(action: &str) -> RunArgs {
        RunArgs {
            action: action.to_string(),
            select: Vec::new(),
            all: false,
            confirm: false,
            decline: false,
            cancel_after: None,
            fail: Vec::new(),
            metrics: false,
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn resolve_ids_dedupes_and_validates() {
        let visible = visible_ids(&demo::products());
        let ids = resolve_ids(&visible, &strings(&["2", " 4", "2", ""]), "--select")
            .expect("valid ids");
        assert_eq!(ids, vec![ItemId::from("2"), ItemId::from("4")]);
        let err = resolve_ids(&visible, &strings(&["99"]), "--select").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn confirmed_archive_invokes_the_callback_once() {
        let mut args = args("archive");
        args.select = strings(&["2", "4", "6"]);
        args.confirm = true;
        let execution = execute(&ctx(1), &args, false).await.expect("run");

        assert_eq!(
            execution.summary.callbacks,
            vec![CallbackRecord {
                action: ActionId::from("archive"),
                items: vec![ItemId::from("2"), ItemId::from("4"), ItemId::from("6")],
            }]
        );
        assert!(execution.summary.selection_remaining.is_empty());
        assert!(matches!(
            execution.summary.result,
            RunStatus::Finished(RunReport::Completed { .. })
        ));
        assert_eq!(execution.summary.metrics.active_jobs, 0);
    }

    #[tokio::test]
    async fn confirming_actions_need_a_decision() {
        let mut args = args("delete");
        args.all = true;
        let err = execute(&ctx(1), &args, false).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);

        args.decline = true;
        let execution = execute(&ctx(1), &args, false).await.expect("declined");
        assert!(matches!(execution.summary.result, RunStatus::Declined));
        assert_eq!(execution.summary.selection_remaining.len(), 6);
        assert!(execution.summary.callbacks.is_empty());
    }

    #[tokio::test]
    async fn failing_items_stay_selected() {
        let mut args = args("publish");
        args.select = strings(&["1", "3"]);
        args.fail = strings(&["3"]);
        let execution = execute(&ctx(1), &args, false).await.expect("run");

        assert_eq!(execution.summary.selection_remaining, vec![ItemId::from("3")]);
        assert!(execution.summary.callbacks.is_empty());
        let kinds: Vec<&str> = execution
            .history
            .iter()
            .map(|envelope| envelope.event.kind())
            .collect();
        assert!(kinds.contains(&"job_failed"));
        assert_eq!(kinds.last().copied(), Some("failure_dismissed"));
    }

    #[tokio::test]
    async fn cancel_after_zero_cancels_before_any_progress() {
        let mut args = args("publish");
        args.all = true;
        args.cancel_after = Some(0);
        let execution = execute(&ctx(50), &args, false).await.expect("run");

        assert!(matches!(
            execution.summary.result,
            RunStatus::Finished(RunReport::Cancelled { at: 0, total: 6, .. })
        ));
        assert_eq!(execution.summary.selection_remaining.len(), 6);
    }
}
