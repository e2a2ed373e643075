//! Reconciliation of a reported state against the current one

use satdl_errors::AuthorityError;
use satdl_types::{LifecycleState, PackageId, StatusReport};

/// State a request moves to when the authority reports `reported`
///
/// Terminal states never change. A request the authority has already
/// picked up does not fall back to `Pending`.
#[must_use]
pub fn next_state(current: LifecycleState, reported: LifecycleState) -> LifecycleState {
    use LifecycleState::{
        CompletedEmpty, Expired, Failed, Pending, Processing, Ready, Rejected,
    };

    match (current, reported) {
        (Ready | CompletedEmpty | Rejected | Expired | Failed, _) => current,
        (Processing, Pending) => Processing,
        (Pending, Pending) => Pending,
        (Pending | Processing, Processing) => Processing,
        (Pending | Processing, Ready | CompletedEmpty | Rejected | Expired | Failed) => reported,
    }
}

/// Outcome of reconciling a status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reconciled {
    pub state: LifecycleState,
    pub packages: Vec<PackageId>,
}

/// Validate a report and compute the resulting state and packages
///
/// A `Ready` report without packages is refused. Packages attached to any
/// other report are dropped.
pub(crate) fn reconcile(
    current: LifecycleState,
    report: &StatusReport,
) -> Result<Reconciled, AuthorityError> {
    if report.state == LifecycleState::Ready && report.packages.is_empty() {
        return Err(AuthorityError::InvalidResponse {
            message: "request reported ready without any package".to_string(),
        });
    }

    let state = next_state(current, report.state);
    let packages = if state == LifecycleState::Ready && current != LifecycleState::Ready {
        let mut packages = Vec::with_capacity(report.packages.len());
        for package in &report.packages {
            if !packages.contains(package) {
                packages.push(package.clone());
            }
        }
        packages
    } else {
        Vec::new()
    };

    Ok(Reconciled { state, packages })
}
