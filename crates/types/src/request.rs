//! Retrieval request vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a retrieval request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh identifier (`REQ-<uuid>`)
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("REQ-{}", Uuid::new_v4().simple()))
    }

    /// Wrap an identifier issued elsewhere (authority, ledger, CLI argument)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque identifier of a package published by the authority
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Direction of the requested documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Documents issued by the credential holder
    Issued,
    /// Documents received by the credential holder
    Received,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issued => write!(f, "issued"),
            Self::Received => write!(f, "received"),
        }
    }
}

impl clap::ValueEnum for RequestKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Issued, Self::Received]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Issued => clap::builder::PossibleValue::new("issued"),
            Self::Received => clap::builder::PossibleValue::new("received"),
        })
    }
}

/// What the authority returns for each document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// The complete signed document
    FullDocument,
    /// Only the metadata rows
    MetadataOnly,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullDocument => write!(f, "full"),
            Self::MetadataOnly => write!(f, "metadata"),
        }
    }
}

impl clap::ValueEnum for DocumentFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::FullDocument, Self::MetadataOnly]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::FullDocument => clap::builder::PossibleValue::new("full").alias("xml"),
            Self::MetadataOnly => clap::builder::PossibleValue::new("metadata"),
        })
    }
}

/// Scope filter applied by the authority when producing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityFilter {
    Active,
    Cancelled,
    Any,
}

impl fmt::Display for ActivityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl clap::ValueEnum for ActivityFilter {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Active, Self::Cancelled, Self::Any]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Active => clap::builder::PossibleValue::new("active"),
            Self::Cancelled => clap::builder::PossibleValue::new("cancelled"),
            Self::Any => clap::builder::PossibleValue::new("any"),
        })
    }
}

/// Lifecycle state of a retrieval request
///
/// `Pending` is the initial state. `Ready`, `CompletedEmpty`, `Rejected`,
/// `Expired` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Pending,
    Processing,
    Ready,
    CompletedEmpty,
    Rejected,
    Expired,
    Failed,
}

impl LifecycleState {
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Processing,
        Self::Ready,
        Self::CompletedEmpty,
        Self::Rejected,
        Self::Expired,
        Self::Failed,
    ];

    /// No transition leaves a terminal state
    #[must_use]
    pub fn is_terminal(self) -> bool {
        match self {
            Self::Pending | Self::Processing => false,
            Self::Ready | Self::CompletedEmpty | Self::Rejected | Self::Expired | Self::Failed => {
                true
            }
        }
    }

    /// States that the verification sweep still polls
    #[must_use]
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::CompletedEmpty => "completed_empty",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_partition() {
        let terminal: Vec<_> = LifecycleState::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal.len(), 5);
        assert!(LifecycleState::Pending.is_active());
        assert!(LifecycleState::Processing.is_active());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("REQ-"));
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&LifecycleState::CompletedEmpty).unwrap();
        assert_eq!(json, r#""completed_empty""#);
    }
}
