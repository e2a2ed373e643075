//! Application setup: collaborators, persisted state, component wiring

use crate::error::CliError;
use satdl_config::Config;
use satdl_credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use satdl_events::EventSender;
use satdl_lifecycle::{
    DirectoryTransfer, Downloader, FixtureAuthority, LifecycleManager, ManagerOptions,
    RequestLedger,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a command needs, built once per invocation
pub struct AppContext {
    config: Config,
    credentials: FileCredentialStore,
    manager: Arc<LifecycleManager>,
    downloader: Downloader,
    state_path: PathBuf,
}

impl AppContext {
    /// Load the credential store, the request ledger and the fixture authority
    pub async fn initialize(config: Config, tx: EventSender) -> Result<Self, CliError> {
        info!("Initializing satdl components");

        let credentials = FileCredentialStore::load(config.credentials_path())
            .await?
            .with_event_sender(tx.clone());
        debug!(
            path = %credentials.path().display(),
            validated = credentials.is_validated(),
            "credential store loaded"
        );

        let authority = FixtureAuthority::load(&config.fixture_path()).await?;
        let state_path = config.state_path();
        let ledger = RequestLedger::load(&state_path).await?;
        debug!(
            path = %state_path.display(),
            requests = ledger.requests.len(),
            "request ledger loaded"
        );

        let manager = Self::build_manager(&config, &credentials, authority, ledger, tx.clone())?;
        let downloader = Downloader::new(
            Arc::new(DirectoryTransfer::new(config.packages_dir())),
            config.downloads_dir(),
        )
        .with_event_sender(tx);

        Ok(Self {
            config,
            credentials,
            manager,
            downloader,
            state_path,
        })
    }

    fn build_manager(
        config: &Config,
        credentials: &FileCredentialStore,
        authority: FixtureAuthority,
        ledger: RequestLedger,
        tx: EventSender,
    ) -> Result<Arc<LifecycleManager>, CliError> {
        let gate = MemoryCredentialStore::unconfigured();
        gate.set(credentials.identity());
        let options = ManagerOptions {
            spacing: config.polling.spacing(),
            status_timeout: config.polling.status_timeout(),
        };
        let manager = LifecycleManager::restore(Arc::new(gate), Arc::new(authority), options, ledger)?
            .with_event_sender(tx);
        Ok(Arc::new(manager))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &Arc<LifecycleManager> {
        &self.manager
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn credentials(&self) -> &FileCredentialStore {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut FileCredentialStore {
        &mut self.credentials
    }

    /// Write the request ledger back to disk
    pub async fn persist(&self) -> Result<(), CliError> {
        self.manager.snapshot().await.save(&self.state_path).await?;
        debug!(path = %self.state_path.display(), "request ledger saved");
        Ok(())
    }
}
