//! Argument parsing and command dispatch.

use std::path::PathBuf;

use bulkflow_config::{CONFIG_PATH_ENV, LogFormatSetting, SettingsLoader, WorkflowSettings};
use bulkflow_telemetry::{LogFormat, LoggingConfig, init_logging};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::actions::{handle_actions, handle_items};
use crate::commands::run::{handle_events, handle_run};
use crate::context::{AppContext, CliError, CliResult};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);

    let result = match bootstrap(&cli).await {
        Ok(ctx) => dispatch(cli.command, &ctx).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            tracing::debug!(command = command_name, "command finished");
            0
        }
        Err(err) => {
            let exit_code = err.exit_code();
            eprintln!("error: {}", err.display_message());
            tracing::debug!(command = command_name, exit_code, "command failed");
            exit_code
        }
    }
}

async fn bootstrap(cli: &Cli) -> CliResult<AppContext> {
    let mut loader = SettingsLoader::new().with_process_env();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let settings = loader.load().await?;
    install_logging(&settings, cli.log_level.as_deref())?;
    Ok(AppContext {
        settings,
        output: cli.output,
    })
}

fn install_logging(settings: &WorkflowSettings, level_override: Option<&str>) -> CliResult<()> {
    let format = match settings.telemetry.log_format {
        Some(LogFormatSetting::Json) => LogFormat::Json,
        Some(LogFormatSetting::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    };
    let config = LoggingConfig {
        level: level_override.unwrap_or(&settings.telemetry.level),
        format,
        build_sha: option_env!("BULKFLOW_BUILD_SHA").unwrap_or("dev"),
    };
    init_logging(&config).map_err(CliError::failure)
}

async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Actions(args) => handle_actions(ctx, &args),
        Command::Items => handle_items(ctx),
        Command::Run(args) => handle_run(ctx, &args).await,
        Command::Events(args) => handle_events(ctx, &args).await,
    }
}

#[derive(Parser)]
#[command(name = "bulkflow", about = "Run bulk actions over a mock product list")]
struct Cli {
    #[arg(long, global = true, env = CONFIG_PATH_ENV, help = "JSON settings document")]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Log filter directive (overrides the configured level, not RUST_LOG)"
    )]
    log_level: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the action catalog split into inline buttons and overflow menu.
    Actions(ActionsArgs),
    /// List the mock products.
    Items,
    /// Run a bulk action and print its progress and outcome.
    Run(RunArgs),
    /// Run a bulk action and dump the workflow event log as JSON.
    Events(RunArgs),
}

#[derive(Args)]
pub(crate) struct ActionsArgs {
    #[arg(
        long,
        default_value_t = 1,
        help = "Selection size used to decide which actions are available"
    )]
    pub(crate) selected: usize,
}

#[derive(Args, Clone)]
pub(crate) struct RunArgs {
    #[arg(help = "Action identifier (see `bulkflow actions`)")]
    pub(crate) action: String,
    #[arg(
        long = "select",
        value_delimiter = ',',
        help = "Product ids to select (comma separated)"
    )]
    pub(crate) select: Vec<String>,
    #[arg(long, conflicts_with = "select", help = "Select every product")]
    pub(crate) all: bool,
    #[arg(long, conflicts_with = "decline", help = "Accept the confirmation dialog")]
    pub(crate) confirm: bool,
    #[arg(long, help = "Decline the confirmation dialog")]
    pub(crate) decline: bool,
    #[arg(long, help = "Cancel once this many items have been processed")]
    pub(crate) cancel_after: Option<usize>,
    #[arg(
        long = "fail",
        value_delimiter = ',',
        help = "Product ids whose processing fails"
    )]
    pub(crate) fail: Vec<String>,
    #[arg(long, help = "Print Prometheus metrics after the run")]
    pub(crate) metrics: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Actions(_) => "actions",
        Command::Items => "items",
        Command::Run(_) => "run",
        Command::Events(_) => "events",
    }
}
