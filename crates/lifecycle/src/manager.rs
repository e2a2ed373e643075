//! The request lifecycle manager

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashSet;
use satdl_credentials::CredentialStore;
use satdl_errors::{AuthorityError, Error, RequestError};
use satdl_events::{
    EventEmitter, EventSender, FailureContext, RequestEvent, SweepEvent, SweepFailureSummary,
};
use satdl_types::{
    ActivityFilter, ActivityKind, ActivityOutcome, DashboardStats, DocumentFormat,
    LifecycleState, PackageId, RequestId, RequestKind, StatusQuery, StatusReport,
};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::history::dashboard_stats;
use crate::sweep::{SweepFailure, SweepReport};
use crate::{ActivityRecord, AuthorityClient, HistoryFilter, RequestLedger, RetrievalRequest};

/// Pause between status checks within one sweep
const DEFAULT_SPACING: Duration = Duration::from_millis(500);
/// Upper bound for a single status check
const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning knobs for the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Minimum gap between consecutive status checks in a sweep
    pub spacing: Duration,
    /// Time allowed for one status check before it counts as unavailable
    pub status_timeout: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

/// Owns the retrieval requests and every change to their state
///
/// Requests are kept most-recent-first. The collection lock is never held
/// while the authority is being asked.
pub struct LifecycleManager {
    credentials: Arc<dyn CredentialStore>,
    authority: Arc<dyn AuthorityClient>,
    options: ManagerOptions,
    requests: RwLock<Vec<RetrievalRequest>>,
    activity: RwLock<Vec<ActivityRecord>>,
    in_flight: DashSet<RequestId>,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("options", &self.options)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for LifecycleManager {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Removes a request from the in-flight set when verification ends
struct InFlight<'a> {
    set: &'a DashSet<RequestId>,
    id: RequestId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

impl LifecycleManager {
    /// Create a manager with an empty collection
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        authority: Arc<dyn AuthorityClient>,
        options: ManagerOptions,
    ) -> Self {
        Self {
            credentials,
            authority,
            options,
            requests: RwLock::new(Vec::new()),
            activity: RwLock::new(Vec::new()),
            in_flight: DashSet::new(),
            tx: None,
        }
    }

    /// Rebuild a manager from a persisted ledger
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupted` if any stored request breaks an
    /// invariant.
    pub fn restore(
        credentials: Arc<dyn CredentialStore>,
        authority: Arc<dyn AuthorityClient>,
        options: ManagerOptions,
        ledger: RequestLedger,
    ) -> Result<Self, Error> {
        ledger.validate()?;
        let manager = Self::new(credentials, authority, options);
        Ok(Self {
            requests: RwLock::new(ledger.requests),
            activity: RwLock::new(ledger.activity),
            ..manager
        })
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn options(&self) -> ManagerOptions {
        self.options
    }

    /// The credential gate consulted by creation and download
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }

    /// Create a new request in `Pending`
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotConfigured` when no validated credential is
    /// available (checked first) and `RequestError::InvalidRange` when the
    /// period start is after its end.
    pub async fn create_request(
        &self,
        kind: RequestKind,
        format: DocumentFormat,
        activity_filter: ActivityFilter,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<RequestId, Error> {
        if !self.credentials.is_validated() {
            return Err(RequestError::NotConfigured.into());
        }
        if period_start > period_end {
            return Err(RequestError::InvalidRange {
                start: period_start.to_string(),
                end: period_end.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let request =
            RetrievalRequest::new(kind, format, activity_filter, period_start, period_end, now);
        let request_id = request.request_id().clone();

        self.requests.write().await.insert(0, request);
        self.record_activity(
            ActivityRecord::new(
                ActivityKind::Request,
                ActivityOutcome::Success,
                format!("Retrieval request for {kind} documents ({format}) from {period_start} to {period_end}"),
                now,
            )
            .for_request(&request_id, LifecycleState::Pending),
        )
        .await;

        tracing::info!(request_id = %request_id, %kind, %format, "retrieval request created");
        self.emit_request(RequestEvent::Created {
            request_id: request_id.clone(),
            kind,
            format,
            period_start,
            period_end,
        });

        Ok(request_id)
    }

    /// Ask the authority for the status of one request and reconcile it
    ///
    /// Terminal requests are returned as they are without contacting the
    /// authority, as are requests whose verification is already running.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotFound` for an unknown id. A failed or timed
    /// out status check returns the authority error after recording it on
    /// the request; the state is not changed.
    pub async fn verify_request(&self, request_id: &RequestId) -> Result<LifecycleState, Error> {
        let query = {
            let requests = self.requests.read().await;
            let request = find(&requests, request_id)?;
            if request.state().is_terminal() {
                self.emit_request(RequestEvent::VerificationSkipped {
                    request_id: request_id.clone(),
                    state: request.state(),
                    reason: "request is in a terminal state".to_string(),
                });
                return Ok(request.state());
            }
            if !self.in_flight.insert(request_id.clone()) {
                self.emit_request(RequestEvent::VerificationSkipped {
                    request_id: request_id.clone(),
                    state: request.state(),
                    reason: "verification already in progress".to_string(),
                });
                return Ok(request.state());
            }
            request.query()
        };
        let _in_flight = InFlight {
            set: &self.in_flight,
            id: request_id.clone(),
        };

        self.emit_request(RequestEvent::VerificationStarted {
            request_id: request_id.clone(),
        });
        let outcome = self.check_status(&query).await;
        let checked_at = Utc::now();

        let mut requests = self.requests.write().await;
        let request = find_mut(&mut requests, request_id)?;

        let applied = outcome.and_then(|report| {
            request
                .apply_report(&report, checked_at)
                .map(|previous| (previous, report))
                .map_err(Error::from)
        });

        match applied {
            Ok((previous, report)) => {
                let state = request.state();
                let packages = request.packages().len();
                drop(requests);
                self.verified(request_id, previous, state, packages, report, checked_at)
                    .await;
                Ok(state)
            }
            Err(error) => {
                request.record_failure(error.to_string(), checked_at);
                let state = request.state();
                drop(requests);
                self.verification_failed(request_id, state, &error, checked_at)
                    .await;
                Err(error)
            }
        }
    }

    async fn verified(
        &self,
        request_id: &RequestId,
        previous: LifecycleState,
        state: LifecycleState,
        packages: usize,
        report: StatusReport,
        checked_at: DateTime<Utc>,
    ) {
        tracing::info!(
            request_id = %request_id,
            from = %previous,
            to = %state,
            "request verified"
        );
        self.record_activity(
            ActivityRecord::new(
                ActivityKind::Verification,
                verification_outcome(state),
                verification_description(state, packages, &report),
                checked_at,
            )
            .for_request(request_id, state),
        )
        .await;
        self.emit_request(RequestEvent::Verified {
            request_id: request_id.clone(),
            from: previous,
            to: state,
            message: report.message,
            packages,
        });
    }

    async fn verification_failed(
        &self,
        request_id: &RequestId,
        state: LifecycleState,
        error: &Error,
        checked_at: DateTime<Utc>,
    ) {
        tracing::warn!(request_id = %request_id, error = %error, "status check failed");
        self.record_activity(
            ActivityRecord::new(
                ActivityKind::Verification,
                ActivityOutcome::Error,
                format!("Verification failed: {error}"),
                checked_at,
            )
            .for_request(request_id, state),
        )
        .await;
        self.emit_request(RequestEvent::VerificationFailed {
            request_id: request_id.clone(),
            state,
            failure: FailureContext::from_error(error),
        });
    }

    /// Verify every `Pending` or `Processing` request, one at a time
    ///
    /// Failures are collected into the report instead of aborting the pass.
    pub async fn verify_all(&self) -> SweepReport {
        self.sweep(false).await
    }

    pub(crate) async fn sweep(&self, automatic: bool) -> SweepReport {
        let started = Instant::now();
        let candidates: Vec<RequestId> = self
            .requests
            .read()
            .await
            .iter()
            .filter(|r| r.state().is_active())
            .map(|r| r.request_id().clone())
            .collect();

        self.emit_sweep(SweepEvent::Started {
            candidates: candidates.len(),
            automatic,
        });

        let mut report = SweepReport::default();
        for (index, request_id) in candidates.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.options.spacing).await;
            }

            match self.verify_request(request_id).await {
                Ok(state) => report.record(request_id.clone(), state),
                Err(error) => {
                    tracing::warn!(
                        request_id = %request_id,
                        error = %error,
                        automatic,
                        "verification failed during sweep"
                    );
                    match self.get_request(request_id).await {
                        Ok(request) => report.record(request_id.clone(), request.state()),
                        // Requests are never removed, so this is a desync
                        Err(lookup) => tracing::error!(
                            request_id = %request_id,
                            error = %lookup,
                            "request disappeared during sweep; no outcome recorded"
                        ),
                    }
                    report.failures.push(SweepFailure::new(request_id.clone(), &error));
                }
            }
        }

        let duration = started.elapsed();
        tracing::info!(
            checked = candidates.len(),
            failed = report.failures.len(),
            automatic,
            "verification sweep finished"
        );
        self.emit_sweep(SweepEvent::Completed {
            checked: candidates.len(),
            failed: report
                .failures
                .iter()
                .map(|f| SweepFailureSummary {
                    request_id: f.request_id.clone(),
                    message: f.message.clone(),
                })
                .collect(),
            duration,
            automatic,
        });

        report
    }

    /// Snapshot of every request, most recent first
    pub async fn list_requests(&self) -> Vec<RetrievalRequest> {
        self.requests.read().await.clone()
    }

    /// Snapshot of one request
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotFound` for an unknown id.
    pub async fn get_request(&self, request_id: &RequestId) -> Result<RetrievalRequest, Error> {
        let requests = self.requests.read().await;
        find(&requests, request_id).cloned()
    }

    /// Activity history, most recent first
    pub async fn history(&self) -> Vec<ActivityRecord> {
        self.activity.read().await.clone()
    }

    /// Activity history entries accepted by `filter`, most recent first
    pub async fn history_filtered(&self, filter: &HistoryFilter) -> Vec<ActivityRecord> {
        self.activity
            .read()
            .await
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    /// Dashboard counters computed from the current collection and history
    pub async fn stats(&self) -> DashboardStats {
        let requests = self.requests.read().await;
        let activity = self.activity.read().await;
        dashboard_stats(&requests, &activity, Utc::now())
    }

    /// Capture the collection and history for persistence
    pub async fn snapshot(&self) -> RequestLedger {
        RequestLedger::new(self.list_requests().await, self.history().await)
    }

    pub(crate) async fn record_download(
        &self,
        request: &RetrievalRequest,
        package_id: &PackageId,
        outcome: Result<&str, &Error>,
    ) {
        let (outcome, description) = match outcome {
            Ok(file_name) => (
                ActivityOutcome::Success,
                format!("Downloaded package {package_id} as {file_name}"),
            ),
            Err(error) => (
                ActivityOutcome::Error,
                format!("Download of package {package_id} failed: {error}"),
            ),
        };
        self.record_activity(
            ActivityRecord::new(ActivityKind::Download, outcome, description, Utc::now())
                .for_request(request.request_id(), request.state())
                .for_package(package_id),
        )
        .await;
    }

    async fn record_activity(&self, record: ActivityRecord) {
        self.activity.write().await.insert(0, record);
    }

    async fn check_status(&self, query: &StatusQuery) -> Result<StatusReport, Error> {
        let timeout = self.options.status_timeout;
        match tokio::time::timeout(timeout, self.authority.check_status(query)).await {
            Ok(result) => result,
            Err(_) => Err(AuthorityError::Timeout {
                seconds: timeout.as_secs(),
            }
            .into()),
        }
    }
}

fn find<'a>(
    requests: &'a [RetrievalRequest],
    request_id: &RequestId,
) -> Result<&'a RetrievalRequest, Error> {
    requests
        .iter()
        .find(|r| r.request_id() == request_id)
        .ok_or_else(|| {
            RequestError::NotFound {
                id: request_id.to_string(),
            }
            .into()
        })
}

fn find_mut<'a>(
    requests: &'a mut [RetrievalRequest],
    request_id: &RequestId,
) -> Result<&'a mut RetrievalRequest, Error> {
    requests
        .iter_mut()
        .find(|r| r.request_id() == request_id)
        .ok_or_else(|| {
            RequestError::NotFound {
                id: request_id.to_string(),
            }
            .into()
        })
}

fn verification_outcome(state: LifecycleState) -> ActivityOutcome {
    match state {
        LifecycleState::Ready => ActivityOutcome::Success,
        LifecycleState::Rejected | LifecycleState::Expired | LifecycleState::Failed => {
            ActivityOutcome::Error
        }
        LifecycleState::Pending | LifecycleState::Processing | LifecycleState::CompletedEmpty => {
            ActivityOutcome::Info
        }
    }
}

fn verification_description(
    state: LifecycleState,
    packages: usize,
    report: &StatusReport,
) -> String {
    let summary = match state {
        LifecycleState::Ready => format!("Request ready with {packages} package(s)"),
        LifecycleState::CompletedEmpty => "Request completed without documents".to_string(),
        LifecycleState::Pending | LifecycleState::Processing => {
            format!("Request still {state}")
        }
        LifecycleState::Rejected | LifecycleState::Expired | LifecycleState::Failed => {
            format!("Request {state}")
        }
    };
    if report.message.is_empty() {
        summary
    } else {
        format!("{summary}: {}", report.message)
    }
}
