pub mod completion;
pub mod config;
pub mod kyc;
pub mod nominee;
pub mod password;
pub mod profile;
pub mod referrals;
pub mod register;
pub mod session;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use client::{
    Actions, ApiClient, BootstrapReport, Bootstrapper, FileCredentialStore, SessionStore,
};
use shared::{config::ClientConfig, models::Profile};
use tracing::debug;

use crate::console::ConsoleNotifier;

/// Everything a command needs: resolved config, the session and the
/// actions bound to it.
pub struct AppContext {
    pub config: ClientConfig,
    pub actions: Actions,
    notifier: Arc<ConsoleNotifier>,
}

impl AppContext {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let credentials = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        let api = ApiClient::new(config.base_url.clone(), SessionStore::default(), credentials)
            .context("failed to build HTTP client")?;
        debug!(base_url = %config.base_url, "client ready");
        Ok(Self {
            config,
            actions: Actions::new(api),
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    pub fn session(&self) -> &SessionStore {
        self.actions.api().session()
    }

    /// Restores the stored session, if there is one.
    pub async fn bootstrap(&self) -> BootstrapReport {
        Bootstrapper::new(self.actions.api().clone(), self.notifier.clone())
            .run()
            .await
    }

    /// Restores the session and fails unless a member is signed in.
    pub async fn require_session(&self) -> Result<()> {
        self.bootstrap().await;
        if !self.session().snapshot().is_authenticated() {
            bail!("not logged in; run `referraldesk login` first");
        }
        Ok(())
    }

    /// Profile loaded during bootstrap, fetched again if that failed.
    pub async fn profile(&self) -> Result<Profile> {
        if let Some(profile) = self.session().snapshot().profile() {
            return Ok(profile.clone());
        }
        self.actions
            .fetch_profile()
            .await
            .map_err(crate::console::surface)
    }
}
