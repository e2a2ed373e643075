//! Retrieval request error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RequestError {
    #[error("no validated signing credential is configured")]
    NotConfigured,

    #[error("invalid period: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("request not found: {id}")]
    NotFound { id: String },

    #[error("request {id} is not ready for download (state: {state})")]
    NotReady { id: String, state: String },

    #[error("package {package_id} does not belong to request {id}")]
    PackageNotFound { id: String, package_id: String },
}

impl UserFacingError for RequestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotConfigured => {
                Some("Validate your signing credential with `satdl credentials validate` first.")
            }
            Self::InvalidRange { .. } => Some("The period start date must not be after its end."),
            Self::NotFound { .. } => Some("Run `satdl list` to see the known request ids."),
            Self::NotReady { .. } => {
                Some("Verify the request until the authority reports it as ready.")
            }
            Self::PackageNotFound { .. } => {
                Some("Run `satdl list` to see the packages attached to each request.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotConfigured => "request.not_configured",
            Self::InvalidRange { .. } => "request.invalid_range",
            Self::NotFound { .. } => "request.not_found",
            Self::NotReady { .. } => "request.not_ready",
            Self::PackageNotFound { .. } => "request.package_not_found",
        };
        Some(code)
    }
}
