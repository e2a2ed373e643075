use std::collections::HashMap;
use std::path::Path;

use satdl_errors::{AuthorityError, ConfigError, Error};
use satdl_types::{LifecycleState, PackageId, RequestId, StatusQuery, StatusReport};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::AuthorityClient;

const DEFAULT_MESSAGE: &str = "request accepted; awaiting authority";

/// One scripted answer in a fixture file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureResponse {
    pub request_id: RequestId,
    pub state: LifecycleState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub packages: Vec<PackageId>,
    /// Answer with an outage instead of a report
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    responses: Vec<FixtureResponse>,
}

/// Authority that answers from a TOML fixture
///
/// ```toml
/// [[responses]]
/// request_id = "REQ-..."
/// state = "ready"
/// message = "packages published"
/// packages = ["PKG-1"]
/// ```
///
/// Requests without an entry are reported as `Processing`.
#[derive(Debug, Clone, Default)]
pub struct FixtureAuthority {
    responses: HashMap<RequestId, FixtureResponse>,
}

impl FixtureAuthority {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file; a missing file yields an empty fixture
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path).await {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no authority fixture, answering processing");
                Ok(Self::default())
            }
            Err(e) => Err(Error::io_with_path(&e, path)),
        }
    }

    /// Parse fixture contents
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` when the TOML is malformed.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let file: FixtureFile = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        let mut fixture = Self::default();
        for response in file.responses {
            fixture.insert(response);
        }
        Ok(fixture)
    }

    /// Add or replace the scripted answer for a request
    pub fn insert(&mut self, response: FixtureResponse) {
        self.responses.insert(response.request_id.clone(), response);
    }
}

#[async_trait::async_trait]
impl AuthorityClient for FixtureAuthority {
    async fn check_status(&self, query: &StatusQuery) -> Result<StatusReport, Error> {
        let Some(response) = self.responses.get(&query.request_id) else {
            return Ok(StatusReport::new(LifecycleState::Processing, DEFAULT_MESSAGE));
        };

        if response.unavailable {
            return Err(AuthorityError::Unavailable {
                message: if response.message.is_empty() {
                    "service unavailable".to_string()
                } else {
                    response.message.clone()
                },
            }
            .into());
        }

        Ok(StatusReport {
            state: response.state,
            message: response.message.clone(),
            packages: response.packages.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satdl_types::{DocumentFormat, NaiveDate, RequestKind};

    fn query(id: &str) -> StatusQuery {
        StatusQuery {
            request_id: RequestId::new(id),
            kind: RequestKind::Issued,
            format: DocumentFormat::MetadataOnly,
            period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        }
    }

    #[tokio::test]
    async fn answers_from_toml() {
        let fixture = FixtureAuthority::from_toml_str(
            r#"
[[responses]]
request_id = "REQ-1"
state = "ready"
message = "published"
packages = ["PKG-1", "PKG-2"]

[[responses]]
request_id = "REQ-2"
state = "processing"
unavailable = true
"#,
        )
        .unwrap();

        let report = fixture.check_status(&query("REQ-1")).await.unwrap();
        assert_eq!(report.state, LifecycleState::Ready);
        assert_eq!(report.packages.len(), 2);

        let err = fixture.check_status(&query("REQ-2")).await.unwrap_err();
        assert!(err.is_external_unavailable());

        let report = fixture.check_status(&query("REQ-3")).await.unwrap();
        assert_eq!(report.state, LifecycleState::Processing);
        assert_eq!(report.message, DEFAULT_MESSAGE);
    }

    #[test]
    fn malformed_fixture_is_parse_error() {
        let err = FixtureAuthority::from_toml_str("[[responses]]\nstate = 3").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }
}
