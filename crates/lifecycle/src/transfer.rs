//! Package download

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use satdl_errors::{Error, RequestError, StorageError, TransferError};
use satdl_events::{EventEmitter, EventSender, FailureContext, TransferEvent};
use satdl_types::{LifecycleState, PackageId, RequestId};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{LifecycleManager, RetrievalRequest};

/// Source of package contents published by the authority
#[async_trait::async_trait]
pub trait PackageTransfer: Send + Sync {
    async fn fetch(&self, package_id: &PackageId) -> Result<Vec<u8>, Error>;
}

/// Package source reading `<package_id>.zip` from a local directory
#[derive(Debug, Clone)]
pub struct DirectoryTransfer {
    root: PathBuf,
}

impl DirectoryTransfer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl PackageTransfer for DirectoryTransfer {
    async fn fetch(&self, package_id: &PackageId) -> Result<Vec<u8>, Error> {
        check_package_id(package_id)?;
        let path = self.root.join(format!("{package_id}.zip"));
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TransferError::PackageUnavailable {
                    package_id: package_id.to_string(),
                }
                .into())
            }
            Err(e) => Err(TransferError::Failed {
                package_id: package_id.to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }
}

/// A package written to the downloads directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedPackage {
    pub package_id: PackageId,
    pub request_id: RequestId,
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub downloaded_at: DateTime<Utc>,
}

/// Downloads the packages of `Ready` requests
pub struct Downloader {
    transfer: Arc<dyn PackageTransfer>,
    downloads_dir: PathBuf,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("downloads_dir", &self.downloads_dir)
            .finish_non_exhaustive()
    }
}

impl EventEmitter for Downloader {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl Downloader {
    pub fn new(transfer: Arc<dyn PackageTransfer>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            transfer,
            downloads_dir: downloads_dir.into(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// File name a package is stored under
    #[must_use]
    pub fn file_name(request_id: &RequestId, package_id: &PackageId) -> String {
        format!("{package_id}_{request_id}.zip")
    }

    /// Download one package of a ready request
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotConfigured` without a validated credential,
    /// `RequestError::NotFound`, `RequestError::NotReady` or
    /// `RequestError::PackageNotFound` when the request cannot supply the
    /// package, and transfer or storage errors when fetching or writing fails.
    pub async fn download(
        &self,
        manager: &LifecycleManager,
        request_id: &RequestId,
        package_id: &PackageId,
    ) -> Result<DownloadedPackage, Error> {
        let request = Self::ready_request(manager, request_id).await?;
        if !request.packages().contains(package_id) {
            return Err(RequestError::PackageNotFound {
                id: request_id.to_string(),
                package_id: package_id.to_string(),
            }
            .into());
        }
        self.fetch_one(manager, &request, package_id).await
    }

    /// Download every package of a ready request, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Same as [`Downloader::download`].
    pub async fn download_all(
        &self,
        manager: &LifecycleManager,
        request_id: &RequestId,
    ) -> Result<Vec<DownloadedPackage>, Error> {
        let request = Self::ready_request(manager, request_id).await?;
        let mut downloaded = Vec::with_capacity(request.packages().len());
        for package_id in request.packages() {
            downloaded.push(self.fetch_one(manager, &request, package_id).await?);
        }
        Ok(downloaded)
    }

    /// Packages already stored in the downloads directory, newest first
    ///
    /// Only files named like [`Downloader::file_name`] are listed. `search`
    /// matches package or request ids, ignoring case. A missing directory
    /// lists nothing.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory or a file's metadata cannot
    /// be read.
    pub async fn list_downloaded(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<DownloadedPackage>, Error> {
        let mut rd = match fs::read_dir(&self.downloads_dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_io_with_path(&e, &self.downloads_dir).into()),
        };
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut packages = Vec::new();
        while let Some(entry) = rd
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.downloads_dir))?
        {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((package_id, request_id)) = parse_file_name(file_name) else {
                continue;
            };
            if let Some(needle) = &needle {
                if !package_id.as_str().to_lowercase().contains(needle.as_str())
                    && !request_id.as_str().to_lowercase().contains(needle.as_str())
                {
                    continue;
                }
            }

            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &path))?;
            if !metadata.is_file() {
                continue;
            }
            let downloaded_at = metadata
                .modified()
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
            packages.push(DownloadedPackage {
                file_name: file_name.to_string(),
                package_id,
                request_id,
                path: path.clone(),
                size: metadata.len(),
                downloaded_at,
            });
        }

        packages.sort_by(|a, b| {
            b.downloaded_at
                .cmp(&a.downloaded_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(packages)
    }

    async fn ready_request(
        manager: &LifecycleManager,
        request_id: &RequestId,
    ) -> Result<RetrievalRequest, Error> {
        if !manager.credentials().is_validated() {
            return Err(RequestError::NotConfigured.into());
        }
        let request = manager.get_request(request_id).await?;
        if request.state() != LifecycleState::Ready {
            return Err(RequestError::NotReady {
                id: request_id.to_string(),
                state: request.state().to_string(),
            }
            .into());
        }
        Ok(request)
    }

    async fn fetch_one(
        &self,
        manager: &LifecycleManager,
        request: &RetrievalRequest,
        package_id: &PackageId,
    ) -> Result<DownloadedPackage, Error> {
        let request_id = request.request_id();
        self.emit_transfer(TransferEvent::Started {
            request_id: request_id.clone(),
            package_id: package_id.clone(),
        });

        match self.write_package(request_id, package_id).await {
            Ok(downloaded) => {
                tracing::info!(
                    request_id = %request_id,
                    package_id = %package_id,
                    bytes = downloaded.size,
                    "package downloaded"
                );
                manager
                    .record_download(request, package_id, Ok(downloaded.file_name.as_str()))
                    .await;
                self.emit_transfer(TransferEvent::Completed {
                    request_id: request_id.clone(),
                    package_id: package_id.clone(),
                    path: downloaded.path.clone(),
                    bytes: downloaded.size,
                });
                Ok(downloaded)
            }
            Err(error) => {
                tracing::warn!(
                    request_id = %request_id,
                    package_id = %package_id,
                    error = %error,
                    "package download failed"
                );
                manager
                    .record_download(request, package_id, Err(&error))
                    .await;
                self.emit_transfer(TransferEvent::Failed {
                    request_id: request_id.clone(),
                    package_id: package_id.clone(),
                    failure: FailureContext::from_error(&error),
                });
                Err(error)
            }
        }
    }

    async fn write_package(
        &self,
        request_id: &RequestId,
        package_id: &PackageId,
    ) -> Result<DownloadedPackage, Error> {
        check_package_id(package_id)?;
        let bytes = self.transfer.fetch(package_id).await?;

        fs::create_dir_all(&self.downloads_dir)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.downloads_dir))?;
        let file_name = Self::file_name(request_id, package_id);
        let path = self.downloads_dir.join(&file_name);
        fs::write(&path, &bytes)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &path))?;

        Ok(DownloadedPackage {
            package_id: package_id.clone(),
            request_id: request_id.clone(),
            file_name,
            path,
            size: bytes.len() as u64,
            downloaded_at: Utc::now(),
        })
    }
}

/// Split `<package_id>_<request_id>.zip`; request ids never contain `_`
fn parse_file_name(file_name: &str) -> Option<(PackageId, RequestId)> {
    let stem = file_name.strip_suffix(".zip")?;
    let (package_id, request_id) = stem.rsplit_once('_')?;
    if package_id.is_empty() || request_id.is_empty() {
        return None;
    }
    let package_id = PackageId::new(package_id);
    check_package_id(&package_id).ok()?;
    Some((package_id, RequestId::new(request_id)))
}

/// Package ids become file names; refuse anything that could leave the directory
fn check_package_id(package_id: &PackageId) -> Result<(), Error> {
    let id = package_id.as_str();
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !id.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(TransferError::InvalidPackageId {
            package_id: id.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_ids_cannot_escape() {
        assert!(check_package_id(&PackageId::new("PKG-001_01")).is_ok());
        assert!(check_package_id(&PackageId::new("../etc/passwd")).is_err());
        assert!(check_package_id(&PackageId::new("a/b")).is_err());
        assert!(check_package_id(&PackageId::new("")).is_err());
    }

    #[test]
    fn stored_names_split_on_last_underscore() {
        let (package, request) = parse_file_name("PKG_001_REQ-abc.zip").unwrap();
        assert_eq!(package, PackageId::new("PKG_001"));
        assert_eq!(request, RequestId::new("REQ-abc"));
        assert!(parse_file_name("notes.txt").is_none());
        assert!(parse_file_name("_REQ-abc.zip").is_none());
        assert!(parse_file_name("PKG-1.zip").is_none());
    }

    #[tokio::test]
    async fn listing_reads_the_downloads_directory() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(
            Arc::new(DirectoryTransfer::new(dir.path())),
            dir.path().join("downloads"),
        );
        assert!(downloader.list_downloaded(None).await.unwrap().is_empty());

        let downloads = dir.path().join("downloads");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::write(downloads.join("PKG-1_REQ-a.zip"), b"12345").unwrap();
        std::fs::write(downloads.join("PKG-2_REQ-b.zip"), b"1").unwrap();
        std::fs::write(downloads.join("readme.txt"), b"ignored").unwrap();

        let all = downloader.list_downloaded(None).await.unwrap();
        assert_eq!(all.len(), 2);
        let first = all.iter().find(|p| p.package_id.as_str() == "PKG-1").unwrap();
        assert_eq!(first.request_id, RequestId::new("REQ-a"));
        assert_eq!(first.size, 5);

        let matched = downloader.list_downloaded(Some("req-B")).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].package_id, PackageId::new("PKG-2"));
    }

    #[tokio::test]
    async fn directory_transfer_reports_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PKG-1.zip"), b"zip").unwrap();
        let transfer = DirectoryTransfer::new(dir.path());

        assert_eq!(transfer.fetch(&PackageId::new("PKG-1")).await.unwrap(), b"zip");
        let err = transfer.fetch(&PackageId::new("PKG-2")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transfer(TransferError::PackageUnavailable { .. })
        ));
    }
}
