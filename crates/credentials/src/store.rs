use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use satdl_errors::{CredentialError, Error};
use satdl_events::{CredentialEvent, EventEmitter, EventSender};
use satdl_types::CredentialIdentity;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::validator::{extract_subject_id, CredentialFiles, CredentialValidator};
use crate::CredentialStore;

/// Persisted credential configuration
///
/// The password is never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default)]
    pub configured: bool,
    pub subject_id: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub certificate_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

impl CredentialRecord {
    fn identity(&self) -> Option<CredentialIdentity> {
        if !self.configured {
            return None;
        }
        match (&self.subject_id, self.validated_at) {
            (Some(subject_id), Some(validated_at)) => Some(CredentialIdentity {
                subject_id: subject_id.clone(),
                validated_at,
            }),
            _ => None,
        }
    }
}

/// Credential store backed by a JSON file
///
/// Nothing is read or written implicitly: callers `load` once and `save`
/// after every change.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    record: CredentialRecord,
    tx: Option<EventSender>,
}

impl EventEmitter for FileCredentialStore {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl FileCredentialStore {
    /// An empty store that will be saved to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            record: CredentialRecord::default(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Load the store from `path`; a missing file yields an empty store
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no credential store yet");
                return Ok(Self::new(path));
            }
            Err(e) => return Err(Error::io_with_path(&e, &path)),
        };

        let record: CredentialRecord =
            serde_json::from_str(&contents).map_err(|e| CredentialError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path,
            record,
            tx: None,
        })
    }

    /// Write the store back to its path
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file cannot be written.
    pub async fn save(&self) -> Result<(), Error> {
        let write_err = |path: &Path, e: &dyn std::fmt::Display| CredentialError::WriteError {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_err(parent, &e))?;
        }
        let contents = serde_json::to_string_pretty(&self.record)?;
        fs::write(&self.path, contents)
            .await
            .map_err(|e| write_err(&self.path, &e))?;
        Ok(())
    }

    /// Validate a credential and, on success, store and persist its identity
    ///
    /// A rejected credential leaves the previously stored identity untouched.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Rejected` when the validator refuses the
    /// credential, or any error raised while validating or saving.
    pub async fn validate_and_store<V>(
        &mut self,
        validator: &V,
        files: &CredentialFiles,
    ) -> Result<CredentialIdentity, Error>
    where
        V: CredentialValidator + ?Sized,
    {
        self.emit_credential(CredentialEvent::ValidationStarted {
            certificate: files.certificate.display().to_string(),
        });

        let accepted = match validator.validate(files).await {
            Ok(accepted) => accepted,
            Err(e) => {
                self.emit_credential(CredentialEvent::ValidationFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        if !accepted {
            let reason = "the authentication service rejected the credential".to_string();
            self.emit_credential(CredentialEvent::ValidationFailed {
                reason: reason.clone(),
            });
            return Err(CredentialError::Rejected { reason }.into());
        }

        let subject_id = extract_subject_id(&files.certificate)?;
        let validated_at = Utc::now();
        self.record = CredentialRecord {
            configured: true,
            subject_id: Some(subject_id.clone()),
            validated_at: Some(validated_at),
            certificate_path: Some(files.certificate.clone()),
            key_path: Some(files.private_key.clone()),
        };
        self.save().await?;

        tracing::info!(subject_id = %subject_id, "credential validated");
        self.emit_credential(CredentialEvent::Validated {
            subject_id: subject_id.clone(),
        });

        Ok(CredentialIdentity {
            subject_id,
            validated_at,
        })
    }

    /// Forget the stored credential and persist the empty record
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear(&mut self) -> Result<(), Error> {
        self.record = CredentialRecord::default();
        self.save().await?;
        self.emit_credential(CredentialEvent::Cleared);
        Ok(())
    }

    #[must_use]
    pub fn record(&self) -> &CredentialRecord {
        &self.record
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn identity(&self) -> Option<CredentialIdentity> {
        self.record.identity()
    }
}
