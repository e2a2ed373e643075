use serde::{Deserialize, Serialize};
use satdl_types::RequestId;
use std::time::Duration;

/// Verification sweep events (manual "verify all" and the automatic timer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SweepEvent {
    /// A sweep pass started
    Started { candidates: usize, automatic: bool },

    /// A sweep pass finished; failures are reported once, here
    Completed {
        checked: usize,
        failed: Vec<SweepFailureSummary>,
        duration: Duration,
        automatic: bool,
    },

    /// The automatic sweep was switched on
    AutoEnabled { period: Duration },

    /// The automatic sweep was switched off
    AutoDisabled,
}

/// One failed request inside a sweep summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFailureSummary {
    pub request_id: RequestId,
    pub message: String,
}
