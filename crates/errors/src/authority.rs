//! Errors raised by the authority status-check collaborator

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AuthorityError {
    #[error("authority unavailable: {message}")]
    Unavailable { message: String },

    #[error("status check timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("invalid authority response: {message}")]
    InvalidResponse { message: String },
}

impl UserFacingError for AuthorityError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unavailable { .. } | Self::Timeout { .. } => {
                Some("The authority service did not answer; verify the request again later.")
            }
            Self::InvalidResponse { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unavailable { .. } => "authority.unavailable",
            Self::Timeout { .. } => "authority.timeout",
            Self::InvalidResponse { .. } => "authority.invalid_response",
        };
        Some(code)
    }
}
