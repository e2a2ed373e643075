use std::sync::RwLock;

use chrono::Utc;
use satdl_types::CredentialIdentity;

use crate::CredentialStore;

/// Credential store kept only in memory
///
/// Used by hosts that validate credentials elsewhere, and by tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    identity: RwLock<Option<CredentialIdentity>>,
}

impl MemoryCredentialStore {
    /// A store with no validated credential
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// A store holding a credential validated now
    pub fn validated(subject_id: impl Into<String>) -> Self {
        let store = Self::default();
        store.set(Some(CredentialIdentity {
            subject_id: subject_id.into(),
            validated_at: Utc::now(),
        }));
        store
    }

    /// Replace the held identity
    pub fn set(&self, identity: Option<CredentialIdentity>) {
        match self.identity.write() {
            Ok(mut guard) => *guard = identity,
            Err(poisoned) => *poisoned.into_inner() = identity,
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn identity(&self) -> Option<CredentialIdentity> {
        match self.identity.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_validation() {
        let store = MemoryCredentialStore::unconfigured();
        assert!(!store.is_validated());

        store.set(Some(CredentialIdentity {
            subject_id: "XAXX010101000".into(),
            validated_at: Utc::now(),
        }));
        assert!(store.is_validated());
        assert_eq!(store.identity().unwrap().subject_id, "XAXX010101000");

        store.set(None);
        assert!(!store.is_validated());
    }
}
