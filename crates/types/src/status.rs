//! Authority status check request/response

use crate::{DocumentFormat, LifecycleState, PackageId, RequestId, RequestKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Everything the authority needs to answer a status check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    pub request_id: RequestId,
    pub kind: RequestKind,
    pub format: DocumentFormat,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// The authority's answer to a status check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: LifecycleState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub packages: Vec<PackageId>,
}

impl StatusReport {
    pub fn new(state: LifecycleState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            packages: Vec::new(),
        }
    }

    /// A `Ready` report carrying the published packages
    pub fn ready<I, P>(message: impl Into<String>, packages: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PackageId>,
    {
        Self {
            state: LifecycleState::Ready,
            message: message.into(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }
}
