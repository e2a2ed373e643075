//! Command execution

use crate::cli::{Commands, CredentialCommands};
use crate::error::CliError;
use crate::setup::AppContext;
use satdl_credentials::{CredentialFiles, CredentialRecord, LocalFileValidator};
use satdl_events::EventEmitter;
use satdl_lifecycle::{
    ActivityRecord, AutoVerifier, DownloadedPackage, HistoryFilter, RetrievalRequest,
    SweepReport,
};
use satdl_types::{DashboardStats, PackageId, RequestId};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Operation result that can be serialized for CLI output
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Stored credential
    Credential(CredentialRecord),
    /// A newly created request
    RequestCreated(RetrievalRequest),
    /// A request after a manual verification
    RequestVerified(RetrievalRequest),
    /// Outcome of a verification sweep
    Sweep(SweepReport),
    /// Request listing
    RequestList(Vec<RetrievalRequest>),
    /// Activity history
    History(Vec<ActivityRecord>),
    /// Dashboard counters
    Stats(DashboardStats),
    /// Packages written to the downloads directory
    Downloads(Vec<DownloadedPackage>),
    /// Packages found in the downloads directory
    Packages(Vec<DownloadedPackage>),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, satdl_errors::Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Execute the specified command
pub async fn execute_command(
    command: Commands,
    ctx: &mut AppContext,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Credentials(command) => execute_credentials(command, ctx).await,

        Commands::Create {
            kind,
            format,
            filter,
            start,
            end,
        } => {
            let manager = ctx.manager();
            let request_id = manager
                .create_request(kind, format, filter, start, end)
                .await?;
            let request = manager.get_request(&request_id).await?;
            Ok(OperationResult::RequestCreated(request))
        }

        Commands::Verify { request_id } => {
            let request_id = RequestId::new(request_id);
            let manager = ctx.manager();
            manager.verify_request(&request_id).await?;
            let request = manager.get_request(&request_id).await?;
            Ok(OperationResult::RequestVerified(request))
        }

        Commands::VerifyAll => {
            let report = ctx.manager().verify_all().await;
            Ok(OperationResult::Sweep(report))
        }

        Commands::List => Ok(OperationResult::RequestList(
            ctx.manager().list_requests().await,
        )),

        Commands::History {
            limit,
            kind,
            outcome,
            search,
            since,
            until,
        } => {
            let filter = HistoryFilter {
                kind,
                outcome,
                search,
                since,
                until,
            };
            let mut history = ctx.manager().history_filtered(&filter).await;
            if let Some(limit) = limit {
                history.truncate(limit);
            }
            Ok(OperationResult::History(history))
        }

        Commands::Stats => Ok(OperationResult::Stats(ctx.manager().stats().await)),

        Commands::Download {
            request_id,
            package_id,
        } => {
            let request_id = RequestId::new(request_id);
            let manager = ctx.manager();
            let downloaded = match package_id {
                Some(package_id) => vec![
                    ctx.downloader()
                        .download(manager, &request_id, &PackageId::new(package_id))
                        .await?,
                ],
                None => ctx.downloader().download_all(manager, &request_id).await?,
            };
            Ok(OperationResult::Downloads(downloaded))
        }

        Commands::Packages { search } => Ok(OperationResult::Packages(
            ctx.downloader().list_downloaded(search.as_deref()).await?,
        )),

        Commands::Watch { auto, .. } => watch(ctx, auto).await,
    }
}

async fn execute_credentials(
    command: CredentialCommands,
    ctx: &mut AppContext,
) -> Result<OperationResult, CliError> {
    match command {
        CredentialCommands::Validate { cer, key, password } => {
            let files = CredentialFiles {
                certificate: cer,
                private_key: key,
                password,
            };
            let store = ctx.credentials_mut();
            store
                .validate_and_store(&LocalFileValidator, &files)
                .await?;
            Ok(OperationResult::Credential(store.record().clone()))
        }
        CredentialCommands::Show => Ok(OperationResult::Credential(
            ctx.credentials().record().clone(),
        )),
        CredentialCommands::Clear => {
            ctx.credentials_mut().clear().await?;
            Ok(OperationResult::Success(
                "Stored credential cleared".to_string(),
            ))
        }
    }
}

/// Interactive session around the automatic sweep
///
/// Reads one-letter commands from stdin: `a` toggles the automatic sweep,
/// `v` verifies everything now, `q` quits. The ledger is saved after every
/// manual pass and once per sweep period.
async fn watch(ctx: &AppContext, auto: bool) -> Result<OperationResult, CliError> {
    let manager = ctx.manager();
    let period = ctx.config().polling.interval();
    let mut verifier = AutoVerifier::new(manager.clone(), period)?;
    if auto || ctx.config().polling.auto_verify {
        verifier.enable();
    }

    manager.emit_operation_started(
        "watch: [a] toggle automatic verification, [v] verify now, [q] quit",
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut save = interval_at(Instant::now() + period, period);
    save.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match line.trim() {
                    "a" | "auto" => {
                        if verifier.is_enabled() {
                            verifier.disable().await;
                        } else {
                            verifier.enable();
                        }
                    }
                    "v" | "verify" => {
                        manager.verify_all().await;
                        ctx.persist().await?;
                    }
                    "q" | "quit" => break,
                    "" => {}
                    other => manager.emit_warning(format!("unknown watch command: {other}")),
                },
                None => {
                    stdin_open = false;
                    if !verifier.is_enabled() {
                        break;
                    }
                }
            },

            _ = save.tick() => {
                // Retried next period and on exit
                if let Err(e) = ctx.persist().await {
                    manager.emit_error(format!("could not save request ledger: {e}"));
                }
            }
        }
    }

    verifier.disable().await;
    Ok(OperationResult::Success(
        "Watch session ended".to_string(),
    ))
}
