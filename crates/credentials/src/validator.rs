use std::path::{Path, PathBuf};

use regex::Regex;
use satdl_errors::{CredentialError, Error};
use tokio::fs;

/// Placeholder subject id used when the certificate name carries none
const FALLBACK_SUBJECT_ID: &str = "RFC123456789";

/// The files and secret a credential validation needs
#[derive(Debug, Clone)]
pub struct CredentialFiles {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub password: String,
}

/// External authentication service that accepts or rejects a credential
#[async_trait::async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Returns `Ok(true)` when the credential is accepted.
    ///
    /// `Err` is reserved for failures to perform the check at all
    /// (missing files, unreachable service).
    async fn validate(&self, files: &CredentialFiles) -> Result<bool, Error>;
}

/// Validator that only checks the files locally
///
/// Both files must exist and be non-empty and the password must be set.
/// No cryptographic verification happens here.
#[derive(Debug, Clone, Default)]
pub struct LocalFileValidator;

impl LocalFileValidator {
    async fn non_empty(path: &Path) -> Result<bool, Error> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CredentialError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into())
            }
            Err(e) => Err(Error::io_with_path(&e, path)),
        }
    }
}

#[async_trait::async_trait]
impl CredentialValidator for LocalFileValidator {
    async fn validate(&self, files: &CredentialFiles) -> Result<bool, Error> {
        let certificate_ok = Self::non_empty(&files.certificate).await?;
        let key_ok = Self::non_empty(&files.private_key).await?;
        Ok(certificate_ok && key_ok && !files.password.is_empty())
    }
}

/// Derive the holder's tax id from the certificate file name
///
/// # Errors
///
/// Returns an error only if the built-in pattern fails to compile.
pub fn extract_subject_id(certificate: &Path) -> Result<String, Error> {
    let re = Regex::new(r"([A-Z&Ñ]{3,4}\d{6}[A-Z\d]{3})")
        .map_err(|e| Error::internal(e.to_string()))?;
    let name = certificate
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Ok(re
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| FALLBACK_SUBJECT_ID.to_string(), |m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_id_from_file_name() {
        let id = extract_subject_id(Path::new("/certs/XAXX010101000_fiel.cer")).unwrap();
        assert_eq!(id, "XAXX010101000");

        let id = extract_subject_id(Path::new("/certs/GODE561231GR8.cer")).unwrap();
        assert_eq!(id, "GODE561231GR8");
    }

    #[test]
    fn subject_id_fallback() {
        let id = extract_subject_id(Path::new("/certs/mycert.cer")).unwrap();
        assert_eq!(id, FALLBACK_SUBJECT_ID);
    }

    #[tokio::test]
    async fn local_validator_checks_files_and_password() {
        let dir = tempfile::tempdir().unwrap();
        let cer = dir.path().join("XAXX010101000.cer");
        let key = dir.path().join("XAXX010101000.key");
        std::fs::write(&cer, b"cert").unwrap();
        std::fs::write(&key, b"key").unwrap();

        let validator = LocalFileValidator;
        let mut files = CredentialFiles {
            certificate: cer,
            private_key: key.clone(),
            password: "secret".into(),
        };
        assert!(validator.validate(&files).await.unwrap());

        files.password.clear();
        assert!(!validator.validate(&files).await.unwrap());

        files.password = "secret".into();
        std::fs::write(&key, b"").unwrap();
        assert!(!validator.validate(&files).await.unwrap());

        files.private_key = dir.path().join("missing.key");
        let err = validator.validate(&files).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Credential(CredentialError::FileNotFound { .. })
        ));
    }
}
