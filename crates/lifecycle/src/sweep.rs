//! Verification sweeps, manual and periodic

use std::sync::Arc;
use std::time::Duration;

use satdl_errors::{ConfigError, Error};
use satdl_events::{EventEmitter, SweepEvent};
use satdl_types::{LifecycleState, RequestId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::LifecycleManager;

/// Resulting state of one request checked by a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub request_id: RequestId,
    pub state: LifecycleState,
}

/// A request whose status check failed during a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub request_id: RequestId,
    pub message: String,
    /// The authority could not be reached or did not answer in time
    pub external_unavailable: bool,
}

impl SweepFailure {
    pub(crate) fn new(request_id: RequestId, error: &Error) -> Self {
        Self {
            request_id,
            message: error.to_string(),
            external_unavailable: error.is_external_unavailable(),
        }
    }
}

/// Result of one sweep pass
///
/// `outcomes` follows the listing order of the checked requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub outcomes: Vec<SweepOutcome>,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub(crate) fn record(&mut self, request_id: RequestId, state: LifecycleState) {
        self.outcomes.push(SweepOutcome { request_id, state });
    }

    /// State a request ended the pass in, if it was checked
    #[must_use]
    pub fn state_of(&self, request_id: &RequestId) -> Option<LifecycleState> {
        self.outcomes
            .iter()
            .find(|o| &o.request_id == request_id)
            .map(|o| o.state)
    }

    #[must_use]
    pub fn checked(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Running {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic verification sweep
///
/// Once enabled, a background task runs a sweep every `period`, starting
/// one period after enabling. Late ticks are not caught up. Disabling waits
/// for a pass that is already running to finish.
pub struct AutoVerifier {
    manager: Arc<LifecycleManager>,
    period: Duration,
    running: Option<Running>,
}

impl std::fmt::Debug for AutoVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoVerifier")
            .field("period", &self.period)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl AutoVerifier {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero period.
    pub fn new(manager: Arc<LifecycleManager>, period: Duration) -> Result<Self, Error> {
        if period.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(Self {
            manager,
            period,
            running: None,
        })
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.running.is_some()
    }

    /// Start the periodic sweep; a no-op when already enabled
    ///
    /// Must be called from within a tokio runtime.
    pub fn enable(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (stop, mut stop_rx) = watch::channel(false);
        let manager = Arc::clone(&self.manager);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // A pending stop beats a tick that came due during a long pass
                    biased;

                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                        tracing::debug!("automatic verification tick");
                        manager.sweep(true).await;
                    }
                }
            }
        });

        tracing::info!(period_secs = period.as_secs(), "automatic verification enabled");
        self.manager.emit_sweep(SweepEvent::AutoEnabled { period });
        self.running = Some(Running { stop, handle });
    }

    /// Stop the periodic sweep; a no-op when already disabled
    ///
    /// A pass in progress runs to completion before this returns.
    pub async fn disable(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        // The task only exits after seeing this, so a failed send means it is already gone
        let _ = running.stop.send(true);
        if let Err(e) = running.handle.await {
            tracing::warn!(error = %e, "automatic verification task ended abnormally");
        }

        tracing::info!("automatic verification disabled");
        self.manager.emit_sweep(SweepEvent::AutoDisabled);
    }
}

impl Drop for AutoVerifier {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            // Detached: the task stops at its next select without being awaited
            let _ = running.stop.send(true);
        }
    }
}
