//! Command line interface definition

use clap::{Parser, Subcommand};
use satdl_types::{
    ActivityFilter, ActivityKind, ActivityOutcome, ColorChoice, DocumentFormat, NaiveDate,
    RequestKind,
};
use std::path::PathBuf;

/// satdl - Retrieval request manager for tax authority document downloads
#[derive(Parser)]
#[command(name = "satdl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retrieval request manager for tax authority document downloads")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the logs directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage the signing credential
    #[command(subcommand)]
    Credentials(CredentialCommands),

    /// Create a new retrieval request
    #[command(alias = "new")]
    Create {
        /// Issued or received documents
        #[arg(long, value_enum)]
        kind: RequestKind,

        /// Full documents or metadata only
        #[arg(long, value_enum, default_value = "full")]
        format: DocumentFormat,

        /// Document status filter applied by the authority
        #[arg(long, value_enum, default_value = "any")]
        filter: ActivityFilter,

        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },

    /// Check the status of one request with the authority
    Verify {
        /// Request identifier
        request_id: String,
    },

    /// Check every pending or processing request
    VerifyAll,

    /// List retrieval requests, most recent first
    #[command(alias = "ls")]
    List,

    /// Show the activity history
    History {
        /// Show at most this many entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Only entries of this kind
        #[arg(long, value_enum)]
        kind: Option<ActivityKind>,

        /// Only entries with this outcome
        #[arg(long, value_enum)]
        outcome: Option<ActivityOutcome>,

        /// Case-insensitive text matched against descriptions and ids
        #[arg(long)]
        search: Option<String>,

        /// Only entries on or after this day (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only entries on or before this day (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Show dashboard counters
    Stats,

    /// Download the packages of a ready request
    Download {
        /// Request identifier
        request_id: String,

        /// Package to download (all packages when omitted)
        package_id: Option<String>,
    },

    /// List packages already in the downloads directory
    Packages {
        /// Case-insensitive package or request id to match
        #[arg(long)]
        search: Option<String>,
    },

    /// Verify pending requests periodically until interrupted
    Watch {
        /// Seconds between sweeps (overrides polling.interval_secs)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Start with automatic verification enabled
        #[arg(long)]
        auto: bool,
    },
}

impl Commands {
    /// Whether the command can change the request ledger
    pub fn mutates_ledger(&self) -> bool {
        matches!(
            self,
            Self::Create { .. }
                | Self::Verify { .. }
                | Self::VerifyAll
                | Self::Download { .. }
                | Self::Watch { .. }
        )
    }
}

/// Credential subcommands
#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Validate a certificate/key pair and remember it
    Validate {
        /// Certificate file (.cer)
        #[arg(long, value_name = "PATH")]
        cer: PathBuf,

        /// Private key file (.key)
        #[arg(long, value_name = "PATH")]
        key: PathBuf,

        /// Private key password
        #[arg(long, env = "SATDL_KEY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the stored credential
    Show,

    /// Forget the stored credential
    Clear,
}
