use chrono::{DateTime, Duration, NaiveDate, Utc};
use satdl_types::{
    ActivityKind, ActivityOutcome, DashboardStats, LifecycleState, PackageId, RequestId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RetrievalRequest;

/// One entry of the user-visible activity history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub state: Option<LifecycleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<PackageId>,
    pub outcome: ActivityOutcome,
}

impl ActivityRecord {
    pub(crate) fn new(
        kind: ActivityKind,
        outcome: ActivityOutcome,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            description: description.into(),
            timestamp,
            request_id: None,
            state: None,
            package_id: None,
            outcome,
        }
    }

    pub(crate) fn for_request(mut self, request_id: &RequestId, state: LifecycleState) -> Self {
        self.request_id = Some(request_id.clone());
        self.state = Some(state);
        self
    }

    pub(crate) fn for_package(mut self, package_id: &PackageId) -> Self {
        self.package_id = Some(package_id.clone());
        self
    }
}

/// Narrows the activity history; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub kind: Option<ActivityKind>,
    pub outcome: Option<ActivityOutcome>,
    /// Case-insensitive text matched against kind, description, request id
    /// and package id
    pub search: Option<String>,
    /// First day included (UTC)
    pub since: Option<NaiveDate>,
    /// Last day included (UTC)
    pub until: Option<NaiveDate>,
}

impl HistoryFilter {
    #[must_use]
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        if self.kind.is_some_and(|kind| kind != record.kind) {
            return false;
        }
        if self.outcome.is_some_and(|outcome| outcome != record.outcome) {
            return false;
        }

        let day = record.timestamp.date_naive();
        if self.since.is_some_and(|since| day < since) || self.until.is_some_and(|until| day > until) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                let contains = |text: &str| text.to_lowercase().contains(&term);
                contains(&record.kind.to_string())
                    || contains(&record.description)
                    || record.request_id.as_ref().is_some_and(|id| contains(id.as_str()))
                    || record.package_id.as_ref().is_some_and(|id| contains(id.as_str()))
            }
        }
    }
}

/// Window in which error activities count as recent
const RECENT_ERROR_WINDOW_HOURS: i64 = 24;

pub(crate) fn dashboard_stats(
    requests: &[RetrievalRequest],
    activity: &[ActivityRecord],
    now: DateTime<Utc>,
) -> DashboardStats {
    let cutoff = now - Duration::hours(RECENT_ERROR_WINDOW_HOURS);

    DashboardStats {
        total_requests: requests.len(),
        active_requests: requests.iter().filter(|r| r.state().is_active()).count(),
        ready_requests: requests
            .iter()
            .filter(|r| r.state() == LifecycleState::Ready)
            .count(),
        packages_downloaded: activity
            .iter()
            .filter(|a| a.kind == ActivityKind::Download && a.outcome == ActivityOutcome::Success)
            .count(),
        recent_errors: activity
            .iter()
            .filter(|a| a.outcome == ActivityOutcome::Error && a.timestamp >= cutoff)
            .count(),
        success_rate: success_rate(activity),
    }
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(activity: &[ActivityRecord]) -> Option<f64> {
    if activity.is_empty() {
        return None;
    }
    let succeeded = activity
        .iter()
        .filter(|a| a.outcome == ActivityOutcome::Success)
        .count();
    Some(succeeded as f64 * 100.0 / activity.len() as f64)
}
