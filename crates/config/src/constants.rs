//! File names and defaults used when a path is not configured
//!
//! Relative names are resolved against the per-user data directory
//! (`$XDG_DATA_HOME/satdl` or the platform equivalent).

pub const APP_DIR: &str = "satdl";
pub const CONFIG_FILE: &str = "config.toml";

pub const CREDENTIALS_FILE: &str = "credentials.json";
pub const LEDGER_FILE: &str = "requests.json";
pub const FIXTURE_FILE: &str = "authority.toml";

pub const DOWNLOADS_DIR: &str = "downloads";
pub const PACKAGES_DIR: &str = "packages";
pub const LOGS_DIR: &str = "logs";

/// Automatic sweep period: every five minutes
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
/// Pause between two status checks inside one sweep
pub const DEFAULT_CHECK_SPACING_MS: u64 = 500;
pub const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 30;
