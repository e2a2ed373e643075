use serde::{Deserialize, Serialize};

/// Signing credential events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CredentialEvent {
    ValidationStarted { certificate: String },

    Validated { subject_id: String },

    ValidationFailed { reason: String },

    Cleared,
}
