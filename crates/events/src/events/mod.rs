use serde::{Deserialize, Serialize};

use crate::EventSource;
use satdl_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code from the error taxonomy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod credential;
pub mod general;
pub mod request;
pub mod sweep;
pub mod transfer;

pub use credential::*;
pub use general::*;
pub use request::*;
pub use sweep::*;
pub use transfer::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Retrieval request lifecycle events
    Request(RequestEvent),

    /// Verification sweep events
    Sweep(SweepEvent),

    /// Package download events
    Transfer(TransferEvent),

    /// Signing credential events
    Credential(CredentialEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Request(_) => EventSource::REQUEST,
            Self::Sweep(_) => EventSource::SWEEP,
            Self::Transfer(_) => EventSource::TRANSFER,
            Self::Credential(_) => EventSource::CREDENTIAL,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. })
            | Self::Transfer(TransferEvent::Failed { .. })
            | Self::Credential(CredentialEvent::ValidationFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Request(RequestEvent::VerificationFailed { .. }) => Level::WARN,

            Self::Sweep(SweepEvent::Completed { failed, .. }) if !failed.is_empty() => Level::WARN,

            Self::Request(
                RequestEvent::VerificationStarted { .. } | RequestEvent::VerificationSkipped { .. },
            ) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Request id the event is about, used as the correlation id
    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        match self {
            Self::Request(event) => Some(event.request_id().to_string()),
            Self::Transfer(
                TransferEvent::Started { request_id, .. }
                | TransferEvent::Completed { request_id, .. }
                | TransferEvent::Failed { request_id, .. },
            ) => Some(request_id.to_string()),
            _ => None,
        }
    }
}
