#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Retrieval request lifecycle for satdl
//!
//! The [`LifecycleManager`] owns the collection of retrieval requests and is
//! the only component allowed to change their state. It creates requests
//! (gated on a validated credential), reconciles them against the
//! authority's status reports, and runs verification sweeps either on
//! demand or periodically through an [`AutoVerifier`].
//!
//! The authority and the package source are reached through the
//! [`AuthorityClient`] and [`PackageTransfer`] traits; the bundled
//! [`FixtureAuthority`] and [`DirectoryTransfer`] answer from local files.

mod authority;
mod fixture;
mod history;
mod manager;
mod request;
mod snapshot;
mod sweep;
mod transfer;
mod transition;

pub use authority::AuthorityClient;
pub use fixture::{FixtureAuthority, FixtureResponse};
pub use history::{ActivityRecord, HistoryFilter};
pub use manager::{LifecycleManager, ManagerOptions};
pub use request::RetrievalRequest;
pub use snapshot::RequestLedger;
pub use sweep::{AutoVerifier, SweepFailure, SweepOutcome, SweepReport};
pub use transfer::{DirectoryTransfer, DownloadedPackage, Downloader, PackageTransfer};
pub use transition::next_state;
