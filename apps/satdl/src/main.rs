//! satdl - Retrieval request manager for tax authority document downloads
//!
//! The CLI wires the credential store, the request ledger and the authority
//! client into a lifecycle manager, runs one command and writes the ledger
//! back before exiting.

mod cli;
mod commands;
mod display;
mod error;
mod events;
mod setup;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::commands::{execute_command, OperationResult};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::setup::AppContext;
use clap::Parser;
use satdl_config::Config;
use satdl_events::EventReceiver;
use satdl_types::{ColorChoice, OutputFormat};
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Precedence: file (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    init_tracing(json_output, cli.global.debug, &config.logs_dir());
    info!("Starting satdl v{}", env!("CARGO_PKG_VERSION"));

    let (event_sender, event_receiver) = satdl_events::channel();
    let mut ctx = AppContext::initialize(config, event_sender).await?;

    let color = ctx.config().general.color;
    let renderer = OutputRenderer::new(json_output, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.debug, json_output);

    let persist = cli.command.mutates_ledger();
    let result =
        execute_command_with_events(cli.command, &mut ctx, event_receiver, &mut event_handler)
            .await;

    // Failed verifications still update the ledger
    if persist {
        ctx.persist().await?;
    }

    renderer.render_result(&result?)?;
    info!("Command completed successfully");
    Ok(())
}

/// Run a command while rendering the events it emits
async fn execute_command_with_events(
    command: Commands,
    ctx: &mut AppContext,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Initialize tracing/logging
///
/// JSON output keeps the console clean. With `--debug` (or `RUST_LOG`)
/// structured JSON logs go to a timestamped file under `logs_dir`.
fn init_tracing(json_mode: bool, debug_flag: bool, logs_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if debug_enabled {
        if let Some(file) = open_log_file(logs_dir, !json_mode) {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        tracing_subscriber::EnvFilter::new(
                            "info,satdl=debug,satdl_lifecycle=debug",
                        )
                    }),
                )
                .init();
            return;
        }
    }

    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,satdl=warn,satdl_lifecycle=warn")
                }),
            )
            .init();
    }
}

fn open_log_file(logs_dir: &Path, announce: bool) -> Option<std::fs::File> {
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        if announce {
            eprintln!("Warning: Failed to create log directory: {e}");
        }
        return None;
    }

    let log_file = logs_dir.join(format!(
        "satdl-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    match std::fs::File::create(&log_file) {
        Ok(file) => {
            if announce {
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Some(file)
        }
        Err(e) => {
            if announce {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            None
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    if let Commands::Watch {
        interval: Some(secs),
        ..
    } = command
    {
        config.polling.interval_secs = *secs;
        config.polling.validate()?;
    }

    Ok(())
}
