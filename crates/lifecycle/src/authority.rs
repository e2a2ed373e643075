use satdl_errors::Error;
use satdl_types::{StatusQuery, StatusReport};

/// Status-check endpoint of the tax authority
///
/// Implementations report `AuthorityError::Unavailable` when the service
/// cannot be reached. The manager applies its own timeout around every call.
#[async_trait::async_trait]
pub trait AuthorityClient: Send + Sync {
    async fn check_status(&self, query: &StatusQuery) -> Result<StatusReport, Error>;
}
