//! Read-only listings: the action catalog and the mock products.

use bulkflow_core::WorkflowError;

use crate::cli::ActionsArgs;
use crate::context::{AppContext, CliResult};
use crate::demo;
use crate::output::{render_actions, render_items};

pub(crate) fn handle_actions(ctx: &AppContext, args: &ActionsArgs) -> CliResult<()> {
    let catalog = demo::catalog().map_err(WorkflowError::from)?;
    render_actions(
        &catalog,
        ctx.settings.inline_actions,
        args.selected,
        ctx.output,
    )
}

pub(crate) fn handle_items(ctx: &AppContext) -> CliResult<()> {
    render_items(&demo::products(), ctx.output)
}
