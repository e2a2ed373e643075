#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Signing credential store for satdl
//!
//! Request creation is gated on a validated signing credential. The
//! lifecycle manager only ever sees the narrow [`CredentialStore`] view;
//! loading, validating and persisting the credential lives here.

mod memory;
mod store;
mod validator;

pub use memory::MemoryCredentialStore;
pub use store::{CredentialRecord, FileCredentialStore};
pub use validator::{extract_subject_id, CredentialFiles, CredentialValidator, LocalFileValidator};

use satdl_types::CredentialIdentity;

/// Read-only gate consulted before a request is created
pub trait CredentialStore: Send + Sync {
    /// True when a credential has been validated and its identity is known
    fn is_validated(&self) -> bool {
        self.identity().is_some()
    }

    /// Identity of the validated credential, if any
    fn identity(&self) -> Option<CredentialIdentity>;
}
