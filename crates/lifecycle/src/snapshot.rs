use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use satdl_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{ActivityRecord, RetrievalRequest};

const LEDGER_VERSION: u32 = 1;

fn ledger_version() -> u32 {
    LEDGER_VERSION
}

/// Persisted form of the request collection and activity history
///
/// Both lists are stored most-recent-first, the order the manager keeps
/// them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLedger {
    #[serde(default = "ledger_version")]
    pub version: u32,
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requests: Vec<RetrievalRequest>,
    #[serde(default)]
    pub activity: Vec<ActivityRecord>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            saved_at: None,
            requests: Vec::new(),
            activity: Vec::new(),
            source: None,
        }
    }
}

impl RequestLedger {
    #[must_use]
    pub fn new(requests: Vec<RetrievalRequest>, activity: Vec<ActivityRecord>) -> Self {
        Self {
            saved_at: Some(Utc::now()),
            requests,
            activity,
            ..Self::default()
        }
    }

    /// Load a ledger; a missing file yields an empty one
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` when the file cannot be parsed, or
    /// a storage error when it cannot be read.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    source: Some(path.to_path_buf()),
                    ..Self::default()
                });
            }
            Err(e) => return Err(StorageError::from_io_with_path(&e, path).into()),
        };

        let mut ledger: Self =
            serde_json::from_str(&contents).map_err(|e| StorageError::Corrupted {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        if ledger.version > LEDGER_VERSION {
            return Err(StorageError::Corrupted {
                path: path.display().to_string(),
                message: format!("unsupported ledger version {}", ledger.version),
            }
            .into());
        }
        ledger.source = Some(path.to_path_buf());
        Ok(ledger)
    }

    /// Write the ledger as pretty JSON, replacing the file atomically
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &tmp))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, path))?;
        Ok(())
    }

    /// Check every request invariant and the uniqueness of request ids
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` describing the first violation.
    pub fn validate(&self) -> Result<(), Error> {
        let corrupted = |message: String| -> Error {
            StorageError::Corrupted {
                path: self
                    .source
                    .as_ref()
                    .map_or_else(|| "request ledger".to_string(), |p| p.display().to_string()),
                message,
            }
            .into()
        };

        let mut seen = HashSet::with_capacity(self.requests.len());
        for request in &self.requests {
            if !seen.insert(request.request_id()) {
                return Err(corrupted(format!(
                    "duplicate request id {}",
                    request.request_id()
                )));
            }
            if let Some(message) = request.invariant_violation() {
                return Err(corrupted(message));
            }
        }
        Ok(())
    }
}
