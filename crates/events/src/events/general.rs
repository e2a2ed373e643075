use serde::{Deserialize, Serialize};

/// General events that do not belong to a request, sweep or transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Something the user should notice; the operation continues
    Warning { message: String },

    /// A failure outside any single request
    Error { message: String },

    /// A long-running operation began
    OperationStarted { operation: String },
}

impl GeneralEvent {
    /// Create a warning event
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    /// Create an error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
