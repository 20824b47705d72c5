//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use bulkflow_core::{Action, ActionCatalog, ActionVariant, Item, ItemId, RunReport};
use bulkflow_events::EventEnvelope;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::run::{RunStatus, RunSummary};
use crate::context::{CliError, CliResult};

/// One row of the action listing.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ActionRow<'a> {
    id: &'a str,
    label: &'a str,
    icon: Option<&'a str>,
    variant: ActionVariant,
    placement: &'static str,
    confirm: bool,
}

pub(crate) fn action_rows(
    catalog: &ActionCatalog,
    inline: usize,
    selected: usize,
) -> Vec<ActionRow<'_>> {
    if catalog.available(selected).is_empty() {
        return Vec::new();
    }
    let (buttons, overflow) = catalog.partition(inline);
    buttons
        .iter()
        .map(|action| action_row(action, "inline"))
        .chain(overflow.iter().map(|action| action_row(action, "overflow")))
        .collect()
}

fn action_row<'a>(action: &'a Action, placement: &'static str) -> ActionRow<'a> {
    let spec = action.spec();
    ActionRow {
        id: spec.id.as_str(),
        label: &spec.label,
        icon: spec.icon.as_deref(),
        variant: spec.variant,
        placement,
        confirm: action.requires_confirmation(),
    }
}

pub(crate) fn render_actions(
    catalog: &ActionCatalog,
    inline: usize,
    selected: usize,
    format: OutputFormat,
) -> CliResult<()> {
    let rows = action_rows(catalog, inline, selected);
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("no actions available with {selected} selected");
                return Ok(());
            }
            println!(
                "{:<18} {:<18} {:<12} {:<9} CONFIRM",
                "ID", "LABEL", "VARIANT", "PLACEMENT"
            );
            for row in &rows {
                println!(
                    "{:<18} {:<18} {:<12} {:<9} {}",
                    row.id,
                    row.label,
                    variant_to_str(row.variant),
                    row.placement,
                    if row.confirm { "yes" } else { "no" }
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_items(items: &[Item], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(items)?,
        OutputFormat::Table => {
            println!("{:<6} {:<10} {:<10} NAME", "ID", "SKU", "STATUS");
            for item in items {
                println!(
                    "{:<6} {:<10} {:<10} {}",
                    item.id,
                    item.sku.as_deref().unwrap_or("-"),
                    item.status.as_deref().unwrap_or("-"),
                    item.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_run(summary: &RunSummary, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(summary)?,
        OutputFormat::Table => {
            println!("action: {}", summary.action);
            match &summary.result {
                RunStatus::Declined => println!("outcome: declined"),
                RunStatus::Finished(report) => render_report(report),
            }
            for record in &summary.callbacks {
                println!(
                    "callback: {} [{}]",
                    record.action,
                    join_ids(&record.items)
                );
            }
            println!("remaining selection: [{}]", join_ids(&summary.selection_remaining));
            println!(
                "events emitted: {}, active jobs: {}",
                summary.metrics.events_emitted_total, summary.metrics.active_jobs
            );
        }
    }
    Ok(())
}

fn render_report(report: &RunReport) {
    println!("job: {}", report.job_id());
    println!("outcome: {}", report.outcome());
    match report {
        RunReport::Completed { items, .. } => {
            println!("processed: {} of {}", items.len(), items.len());
        }
        RunReport::Cancelled {
            at, total, failed, ..
        } => {
            println!("processed: {at} of {total}");
            for item in failed {
                println!("  failed {}: {}", item.id, item.reason);
            }
        }
        RunReport::Failed {
            succeeded, failed, ..
        } => {
            println!(
                "processed: {} of {}",
                succeeded.len() + failed.len(),
                succeeded.len() + failed.len()
            );
            for item in failed {
                println!("  failed {}: {}", item.id, item.reason);
            }
        }
    }
}

/// Dump events as a pretty JSON array, or one JSON object per line.
pub(crate) fn render_events(events: &[EventEnvelope], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(events)?,
        OutputFormat::Table => {
            for envelope in events {
                let line = serde_json::to_string(envelope)
                    .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

#[must_use]
pub(crate) const fn variant_to_str(variant: ActionVariant) -> &'static str {
    match variant {
        ActionVariant::Neutral => "neutral",
        ActionVariant::Primary => "primary",
        ActionVariant::Destructive => "destructive",
    }
}

#[must_use]
pub(crate) fn join_ids(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
