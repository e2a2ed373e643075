use serde::{Deserialize, Serialize};
use satdl_types::{PackageId, RequestId};
use std::path::PathBuf;

use super::FailureContext;

/// Package download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransferEvent {
    Started {
        request_id: RequestId,
        package_id: PackageId,
    },

    Completed {
        request_id: RequestId,
        package_id: PackageId,
        path: PathBuf,
        bytes: u64,
    },

    Failed {
        request_id: RequestId,
        package_id: PackageId,
        failure: FailureContext,
    },
}
