//! Session bootstrap.
//!
//! Runs once at process start: reads the persisted credential, commits it
//! to the session and then warms the reference data and the profile. Only
//! the credential decides which shell is shown; the secondary fetches may
//! fail without holding startup back.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use shared::models::{ProfileResponse, ReferenceListResponse};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    api::{Access, ApiClient},
    error::ApiError,
    notify::{Notice, Notifier},
    session::{Action, ReferenceList},
};

/// Cleared when the owner of the session goes away. Results arriving after
/// that are dropped instead of applied.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl Liveness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// A non-empty credential was read from the store.
    pub token_found: bool,
    pub preload_ok: bool,
    pub profile_ok: bool,
}

pub struct Bootstrapper {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    liveness: Liveness,
    report: OnceCell<BootstrapReport>,
}

impl std::fmt::Debug for Bootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrapper")
            .field("api", &self.api)
            .field("liveness", &self.liveness)
            .field("report", &self.report.get())
            .finish_non_exhaustive()
    }
}

impl Bootstrapper {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            liveness: Liveness::new(),
            report: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Stops every later session write made by this bootstrapper.
    pub fn unmount(&self) {
        debug!("bootstrapper unmounted");
        self.liveness.unmount();
    }

    /// Runs the bootstrap sequence. Later calls return the first report
    /// without doing anything.
    pub async fn run(&self) -> BootstrapReport {
        *self.report.get_or_init(|| self.bootstrap()).await
    }

    fn commit(&self, action: Action) -> bool {
        if self.liveness.is_alive() {
            self.api.session().dispatch(action);
            true
        } else {
            debug!("dropping session update after unmount");
            false
        }
    }

    async fn bootstrap(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        self.commit(Action::BootstrapStarted);

        let token = match self.api.credentials().get() {
            Ok(token) => token.filter(|token| !token.trim().is_empty()),
            Err(err) => {
                warn!(error = %err, "credential unreadable, starting signed out");
                None
            }
        };

        if let Some(token) = token {
            report.token_found = true;
            self.commit(Action::Authenticate(token));

            let mut first_failure: Option<ApiError> = None;
            match self.preload_states().await {
                Ok(()) => report.preload_ok = true,
                Err(err) => {
                    warn!(error = %err, "reference preload failed");
                    first_failure = first_failure.or(Some(err));
                }
            }
            match self.load_profile().await {
                Ok(()) => report.profile_ok = true,
                Err(err) => {
                    warn!(error = %err, "profile fetch failed");
                    first_failure = first_failure.or(Some(err));
                }
            }

            if let Some(err) = first_failure {
                if self.liveness.is_alive() {
                    self.notifier.notify(Notice::error(err.user_message()));
                }
            }
        }

        if self.commit(Action::BootstrapFinished) {
            info!(
                authenticated = self.api.session().snapshot().is_authenticated(),
                "bootstrap finished"
            );
        }
        report
    }

    async fn preload_states(&self) -> Result<(), ApiError> {
        let response: ReferenceListResponse = self.api.get("states", Access::Public).await?;
        self.commit(Action::SetReferenceList(ReferenceList::States(response.data)));
        Ok(())
    }

    async fn load_profile(&self) -> Result<(), ApiError> {
        let sent = self.api.bearer(Access::Authenticated);
        let response: ProfileResponse = self
            .api
            .get_as("profile", Access::Authenticated, sent.clone())
            .await?;
        if sent.is_some() && self.api.session().token() == sent {
            self.commit(Action::SetProfile(response.member));
        } else {
            debug!("dropping profile fetched for a replaced token");
        }
        Ok(())
    }
}
