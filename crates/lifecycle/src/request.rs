use chrono::{DateTime, NaiveDate, Utc};
use satdl_errors::AuthorityError;
use satdl_types::{
    ActivityFilter, DocumentFormat, LifecycleState, PackageId, RequestId, RequestKind,
    StatusQuery, StatusReport,
};
use serde::{Deserialize, Serialize};

use crate::transition::reconcile;

/// A retrieval request tracked by the lifecycle manager
///
/// Only the manager mutates requests; everyone else sees clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    request_id: RequestId,
    kind: RequestKind,
    format: DocumentFormat,
    activity_filter: ActivityFilter,
    period_start: NaiveDate,
    period_end: NaiveDate,
    created_at: DateTime<Utc>,
    state: LifecycleState,
    #[serde(default)]
    packages: Vec<PackageId>,
    #[serde(default)]
    last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_message: Option<String>,
}

impl RetrievalRequest {
    pub(crate) fn new(
        kind: RequestKind,
        format: DocumentFormat,
        activity_filter: ActivityFilter,
        period_start: NaiveDate,
        period_end: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: RequestId::generate(),
            kind,
            format,
            activity_filter,
            period_start,
            period_end,
            created_at,
            state: LifecycleState::Pending,
            packages: Vec::new(),
            last_checked_at: None,
            last_message: None,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    #[must_use]
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    #[must_use]
    pub fn activity_filter(&self) -> ActivityFilter {
        self.activity_filter
    }

    #[must_use]
    pub fn period_start(&self) -> NaiveDate {
        self.period_start
    }

    #[must_use]
    pub fn period_end(&self) -> NaiveDate {
        self.period_end
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Packages published for the request; non-empty only when `Ready`
    #[must_use]
    pub fn packages(&self) -> &[PackageId] {
        &self.packages
    }

    #[must_use]
    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// The status-check query describing this request
    #[must_use]
    pub fn query(&self) -> StatusQuery {
        StatusQuery {
            request_id: self.request_id.clone(),
            kind: self.kind,
            format: self.format,
            period_start: self.period_start,
            period_end: self.period_end,
        }
    }

    /// Apply an authority report, returning the state before the change
    ///
    /// On an invalid report nothing but the check timestamp changes.
    pub(crate) fn apply_report(
        &mut self,
        report: &StatusReport,
        checked_at: DateTime<Utc>,
    ) -> Result<LifecycleState, AuthorityError> {
        self.last_checked_at = Some(checked_at);
        let previous = self.state;
        let reconciled = reconcile(previous, report)?;

        if reconciled.state != previous {
            self.state = reconciled.state;
            self.packages = reconciled.packages;
        }
        self.last_message = Some(report.message.clone());
        Ok(previous)
    }

    /// Record a failed status check; the state is left as it was
    pub(crate) fn record_failure(&mut self, message: String, checked_at: DateTime<Utc>) {
        self.last_checked_at = Some(checked_at);
        self.last_message = Some(message);
    }

    /// Describe the first broken invariant, if any
    pub(crate) fn invariant_violation(&self) -> Option<String> {
        if self.period_start > self.period_end {
            return Some(format!(
                "request {} has period start {} after end {}",
                self.request_id, self.period_start, self.period_end
            ));
        }
        match (self.state == LifecycleState::Ready, self.packages.is_empty()) {
            (true, true) => Some(format!(
                "request {} is ready without packages",
                self.request_id
            )),
            (false, false) => Some(format!(
                "request {} carries packages in state {}",
                self.request_id, self.state
            )),
            _ => None,
        }
    }
}
