use serde::{Deserialize, Serialize};
use satdl_types::{DocumentFormat, LifecycleState, NaiveDate, RequestId, RequestKind};

use super::FailureContext;

/// Retrieval request lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RequestEvent {
    /// A new request was accepted in `Pending`
    Created {
        request_id: RequestId,
        kind: RequestKind,
        format: DocumentFormat,
        period_start: NaiveDate,
        period_end: NaiveDate,
    },

    /// A status check is about to contact the authority
    VerificationStarted { request_id: RequestId },

    /// The authority answered and the request was reconciled
    Verified {
        request_id: RequestId,
        from: LifecycleState,
        to: LifecycleState,
        message: String,
        packages: usize,
    },

    /// Verification of a terminal request was a no-op
    VerificationSkipped {
        request_id: RequestId,
        state: LifecycleState,
        reason: String,
    },

    /// The status check failed; the state was left unchanged
    VerificationFailed {
        request_id: RequestId,
        state: LifecycleState,
        failure: FailureContext,
    },
}

impl RequestEvent {
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::Created { request_id, .. }
            | Self::VerificationStarted { request_id }
            | Self::Verified { request_id, .. }
            | Self::VerificationSkipped { request_id, .. }
            | Self::VerificationFailed { request_id, .. } => request_id,
        }
    }
}
