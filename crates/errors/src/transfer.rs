//! Package transfer error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum TransferError {
    #[error("package not available: {package_id}")]
    PackageUnavailable { package_id: String },

    #[error("transfer of {package_id} failed: {message}")]
    Failed { package_id: String, message: String },

    #[error("invalid package id: {package_id}")]
    InvalidPackageId { package_id: String },
}

impl UserFacingError for TransferError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PackageUnavailable { .. } => {
                Some("The package may not be published yet; retry the download later.")
            }
            Self::Failed { .. } => Some("Retry the download."),
            Self::InvalidPackageId { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PackageUnavailable { .. } | Self::Failed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::PackageUnavailable { .. } => "transfer.package_unavailable",
            Self::Failed { .. } => "transfer.failed",
            Self::InvalidPackageId { .. } => "transfer.invalid_package_id",
        };
        Some(code)
    }
}
