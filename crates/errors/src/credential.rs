//! Signing credential error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum CredentialError {
    #[error("credential file not found: {path}")]
    FileNotFound { path: String },

    #[error("credential rejected: {reason}")]
    Rejected { reason: String },

    #[error("failed to parse credential store {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("failed to write credential store {path}: {message}")]
    WriteError { path: String, message: String },
}

impl UserFacingError for CredentialError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Check the paths to the certificate (.cer) and private key (.key) files.")
            }
            Self::Rejected { .. } => Some("Check the credential password and files, then retry."),
            Self::ParseError { .. } => {
                Some("Run `satdl credentials clear` and validate the credential again.")
            }
            Self::WriteError { .. } => Some("Ensure the credential path is writable and retry."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::FileNotFound { .. } => "credential.file_not_found",
            Self::Rejected { .. } => "credential.rejected",
            Self::ParseError { .. } => "credential.parse_error",
            Self::WriteError { .. } => "credential.write_error",
        };
        Some(code)
    }
}
