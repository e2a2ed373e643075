//! Activity history and dashboard summary types

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of user-visible activity was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Request,
    Verification,
    Download,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Verification => write!(f, "verification"),
            Self::Download => write!(f, "download"),
        }
    }
}

/// Outcome attached to an activity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityOutcome {
    Success,
    Error,
    Info,
}

impl clap::ValueEnum for ActivityKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Request, Self::Verification, Self::Download]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Request => clap::builder::PossibleValue::new("request"),
            Self::Verification => clap::builder::PossibleValue::new("verification"),
            Self::Download => clap::builder::PossibleValue::new("download"),
        })
    }
}

impl fmt::Display for ActivityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

impl clap::ValueEnum for ActivityOutcome {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Success, Self::Error, Self::Info]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Success => clap::builder::PossibleValue::new("success"),
            Self::Error => clap::builder::PossibleValue::new("error"),
            Self::Info => clap::builder::PossibleValue::new("info"),
        })
    }
}

/// Summary counters for the dashboard view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_requests: usize,
    /// Requests still in `Pending` or `Processing`
    pub active_requests: usize,
    pub ready_requests: usize,
    pub packages_downloaded: usize,
    /// Error activities recorded in the last 24 hours
    pub recent_errors: usize,
    /// Percentage of recorded activities that succeeded; `None` without history
    #[serde(default)]
    pub success_rate: Option<f64>,
}
