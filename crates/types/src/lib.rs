#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for satdl
//!
//! This crate provides the vocabulary shared by every other crate: request
//! identifiers, the closed lifecycle state enumeration, the authority's
//! status report, and credential identity.

pub mod activity;
pub mod credential;
pub mod request;
pub mod status;

// Re-export commonly used types
pub use activity::{ActivityKind, ActivityOutcome, DashboardStats};
pub use chrono::{DateTime, NaiveDate, Utc};
pub use credential::CredentialIdentity;
pub use request::{ActivityFilter, DocumentFormat, LifecycleState, PackageId, RequestId, RequestKind};
pub use status::{StatusQuery, StatusReport};

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    #[default]
    Tty,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}
