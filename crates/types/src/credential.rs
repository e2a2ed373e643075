//! Signing credential identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a validated signing credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialIdentity {
    /// Tax id of the credential holder
    pub subject_id: String,
    /// When the credential was last validated
    pub validated_at: DateTime<Utc>,
}
