use std::sync::{Arc, Mutex};
use std::time::Duration;

use bulkflow_core::{
    Action, ActionCatalog, ActionId, ActionVariant, BatchRunner, Choice, ConfirmPrompt, Item,
    ItemId, ItemOutcome, RunReport, SimulatedOperation, TickOutcome, Workflow, WorkflowError,
    visible_ids,
};
use bulkflow_events::{EventBus, WorkflowEvent};

type Calls = Arc<Mutex<Vec<(Vec<ItemId>, ActionId)>>>;

fn products() -> Vec<Item> {
    (1_u64..=6)
        .map(|id| Item::new(id, format!("Product {id}")).with_sku(format!("SKU-{id:03}")))
        .collect()
}

fn catalog() -> anyhow::Result<ActionCatalog> {
    Ok(ActionCatalog::new(vec![
        Action::direct("publish", "Publish").with_variant(ActionVariant::Primary),
        Action::confirmed(
            "archive",
            "Archive",
            ConfirmPrompt::new("Archive products", "Archive {count} products?"),
        ),
        Action::confirmed(
            "delete",
            "Delete",
            ConfirmPrompt::new("Delete products", "Delete {count} products permanently?"),
        )
        .with_variant(ActionVariant::Destructive),
    ])?)
}

fn recording_workflow(bus: &EventBus) -> anyhow::Result<(Workflow, Calls)> {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);
    let workflow = Workflow::new(catalog()?)
        .with_events(bus.clone())
        .on_complete(move |ids, action| {
            if let Ok(mut calls) = sink.lock() {
                calls.push((ids.to_vec(), action.clone()));
            }
        });
    Ok((workflow, calls))
}

fn ids(values: &[u64]) -> Vec<ItemId> {
    values.iter().copied().map(ItemId::from).collect()
}

fn call_log(calls: &Calls) -> Vec<(Vec<ItemId>, ActionId)> {
    calls.lock().map(|calls| calls.clone()).unwrap_or_default()
}

#[test]
fn archive_scenario_runs_through_confirmation() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, calls) = recording_workflow(&bus)?;
    let items = products();
    assert_eq!(visible_ids(&items).len(), 6);

    for id in [2_u64, 4, 6] {
        workflow.toggle(ItemId::from(id))?;
    }
    let choice = workflow.choose(&ActionId::from("archive"))?;
    assert_eq!(choice, Choice::AwaitingConfirmation);
    let pending = workflow
        .pending_confirmation()
        .ok_or_else(|| anyhow::anyhow!("confirmation should be pending"))?;
    assert_eq!(pending.snapshot, ids(&[2, 4, 6]).as_slice());
    let body = pending.action.prompt().map(|prompt| prompt.body_for(3));
    assert_eq!(body.as_deref(), Some("Archive 3 products?"));

    let job_id = workflow.confirm()?;
    let job = workflow
        .job()
        .ok_or_else(|| anyhow::anyhow!("job should be running"))?;
    assert_eq!((job.current(), job.total()), (0, 3));

    assert!(matches!(workflow.advance(job_id), TickOutcome::Progressed { .. }));
    assert_eq!(workflow.job().map(|job| job.progress_label()), Some("1 of 3".to_string()));
    assert!(matches!(workflow.advance(job_id), TickOutcome::Progressed { .. }));
    assert!(matches!(workflow.advance(job_id), TickOutcome::Completed(_)));

    assert_eq!(
        call_log(&calls),
        vec![(ids(&[2, 4, 6]), ActionId::from("archive"))]
    );
    assert_eq!(workflow.selected_count(), 0);
    assert!(workflow.state().is_idle());

    let kinds: Vec<&'static str> = bus
        .history()
        .iter()
        .map(|envelope| envelope.event.kind())
        .collect();
    assert_eq!(
        kinds.iter().filter(|kind| **kind == "job_progress").count(),
        3
    );
    assert_eq!(kinds.last().copied(), Some("job_completed"));
    Ok(())
}

#[test]
fn job_over_n_ids_runs_exactly_n_ticks() -> anyhow::Result<()> {
    for n in 1_u64..=5 {
        let bus = EventBus::new();
        let (mut workflow, calls) = recording_workflow(&bus)?;
        let visible: Vec<ItemId> = (1..=n).map(ItemId::from).collect();
        workflow.select_all(&visible)?;
        let job_id = workflow.start(&ActionId::from("publish"))?;

        let mut ticks = 0;
        loop {
            ticks += 1;
            match workflow.advance(job_id) {
                TickOutcome::Progressed { current, total } => {
                    assert_eq!(current, ticks);
                    assert_eq!(total, visible.len());
                }
                TickOutcome::Completed(completion) => {
                    assert_eq!(completion.items, visible);
                    break;
                }
                other => anyhow::bail!("unexpected tick outcome {other:?}"),
            }
        }
        assert_eq!(ticks, visible.len());
        assert_eq!(workflow.selected_count(), 0);
        assert_eq!(call_log(&calls).len(), 1);
    }
    Ok(())
}

#[test]
fn cancelling_mid_job_keeps_the_selection() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3, 4]))?;
    let before = workflow.selected_count();
    let job_id = workflow.start(&ActionId::from("publish"))?;
    workflow.advance(job_id);
    workflow.advance(job_id);

    let cancelled = workflow.cancel()?;
    assert_eq!(cancelled.current(), 2);
    assert_eq!(cancelled.processed, ids(&[1, 2]));
    assert!(workflow.state().is_idle());
    assert_eq!(workflow.selected_count(), before);
    assert!(call_log(&calls).is_empty());
    assert_eq!(workflow.advance(job_id), TickOutcome::Discarded);

    let reported = bus.history().into_iter().find_map(|envelope| match envelope.event {
        WorkflowEvent::JobCancelled {
            processed,
            succeeded,
            total,
            ..
        } => Some((processed.len(), succeeded.len(), total)),
        _ => None,
    });
    assert_eq!(reported, Some((2, 2, 4)));
    Ok(())
}

#[test]
fn late_ticks_from_a_cancelled_job_do_not_reach_the_next_job() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, _calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3]))?;
    let first = workflow.start(&ActionId::from("publish"))?;
    workflow.advance(first);
    workflow.cancel()?;

    let second = workflow.start(&ActionId::from("publish"))?;
    assert_ne!(first, second);
    assert_eq!(
        workflow.tick(first, &[ItemOutcome::failed("late failure")]),
        TickOutcome::Discarded
    );
    let job = workflow
        .job()
        .ok_or_else(|| anyhow::anyhow!("second job should be running"))?;
    assert_eq!(job.id(), second);
    assert_eq!(job.current(), 0);
    assert!(job.failed().is_empty());

    assert_eq!(
        workflow.advance(second),
        TickOutcome::Progressed { current: 1, total: 3 }
    );
    Ok(())
}

#[test]
fn cancelled_job_reports_which_processed_ids_failed() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, _calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3]))?;
    let job_id = workflow.start(&ActionId::from("publish"))?;
    workflow.tick(job_id, &[ItemOutcome::failed("locked")]);
    workflow.advance(job_id);

    let cancelled = workflow.cancel()?;
    assert_eq!(cancelled.processed, ids(&[1, 2]));
    assert_eq!(cancelled.succeeded, ids(&[2]));
    assert_eq!(cancelled.failed_ids(), ids(&[1]));
    assert_eq!(cancelled.failed[0].reason, "locked");

    let reported = bus.history().into_iter().find_map(|envelope| match envelope.event {
        WorkflowEvent::JobCancelled { failed, .. } => Some(failed),
        _ => None,
    });
    assert_eq!(reported, Some(ids(&[1])));
    Ok(())
}

#[test]
fn declining_confirmation_changes_nothing() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3]))?;
    let before = workflow.selection().snapshot();

    workflow.choose(&ActionId::from("delete"))?;
    workflow.decline()?;

    assert!(workflow.state().is_idle());
    assert_eq!(workflow.selection().snapshot(), before);
    assert!(call_log(&calls).is_empty());
    assert!(workflow.job().is_none());
    Ok(())
}

#[test]
fn callback_receives_the_snapshot_even_if_the_collection_changes() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, calls) = recording_workflow(&bus)?;
    let items = products();
    workflow.select_all(&visible_ids(&items))?;
    workflow.toggle(ItemId::from(6_u64))?;
    let job_id = workflow.start(&ActionId::from("publish"))?;

    workflow.advance(job_id);
    let shrunk: Vec<ItemId> = visible_ids(&items[..2]);
    let removed = workflow.sync_collection(&shrunk);
    assert_eq!(removed, ids(&[3, 4, 5]));

    while matches!(workflow.advance(job_id), TickOutcome::Progressed { .. }) {}

    assert_eq!(
        call_log(&calls),
        vec![(ids(&[1, 2, 3, 4, 5]), ActionId::from("publish"))]
    );
    assert_eq!(workflow.selected_count(), 0);
    Ok(())
}

#[test]
fn toggling_is_rejected_while_running() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, _calls) = recording_workflow(&bus)?;
    workflow.toggle(ItemId::from(1_u64))?;
    workflow.start(&ActionId::from("publish"))?;
    assert_eq!(
        workflow.clear(),
        Err(WorkflowError::Busy { state: "running" })
    );
    assert_eq!(
        workflow.choose(&ActionId::from("publish")),
        Err(WorkflowError::Busy { state: "running" })
    );
    Ok(())
}

#[test]
fn chunked_ticks_advance_by_chunk() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, _calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3, 4, 5]))?;
    let job_id = workflow.start(&ActionId::from("publish"))?;
    let chunk = [ItemOutcome::Succeeded, ItemOutcome::Succeeded];
    assert_eq!(
        workflow.tick(job_id, &chunk),
        TickOutcome::Progressed { current: 2, total: 5 }
    );
    assert_eq!(
        workflow.tick(job_id, &chunk),
        TickOutcome::Progressed { current: 4, total: 5 }
    );
    assert!(matches!(workflow.tick(job_id, &chunk), TickOutcome::Completed(_)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn runner_reports_partial_failures() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3]))?;
    workflow.start(&ActionId::from("publish"))?;
    let operation =
        SimulatedOperation::new(Duration::from_millis(50)).failing([ItemId::from(2_u64)]);

    let report = BatchRunner::new(1).run(&mut workflow, &operation).await?;

    let RunReport::Failed {
        succeeded, failed, ..
    } = report
    else {
        anyhow::bail!("expected failed report");
    };
    assert_eq!(succeeded, ids(&[1, 3]));
    assert_eq!(failed.len(), 1);
    assert_eq!(workflow.failure().map(|failure| failure.failed_ids()), Some(ids(&[2])));
    assert_eq!(workflow.selection().snapshot(), ids(&[2]));
    assert!(call_log(&calls).is_empty());

    workflow.dismiss()?;
    assert!(workflow.state().is_idle());
    assert_eq!(workflow.selection().snapshot(), ids(&[2]));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn runner_cancel_from_another_task() -> anyhow::Result<()> {
    let bus = EventBus::new();
    let (mut workflow, calls) = recording_workflow(&bus)?;
    workflow.select_all(&ids(&[1, 2, 3, 4, 5]))?;
    workflow.choose(&ActionId::from("archive"))?;
    workflow.confirm()?;
    let handle = workflow
        .cancel_handle()
        .ok_or_else(|| anyhow::anyhow!("cancel handle"))?;

    let mut stream = bus.subscribe(bus.last_event_id());
    let watcher = tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            if let WorkflowEvent::JobProgress { current: 3, .. } = envelope.event {
                handle.cancel();
                break;
            }
        }
    });

    let report = BatchRunner::default()
        .run(&mut workflow, &SimulatedOperation::default())
        .await?;
    watcher.await?;

    assert!(matches!(report, RunReport::Cancelled { at: 3, total: 5, .. }));
    assert_eq!(workflow.selected_count(), 5);
    assert!(call_log(&calls).is_empty());
    Ok(())
}
