//! In-memory session state and its reducer.
//!
//! [`Session`] is an immutable value; the only way to change it is to
//! [`SessionStore::dispatch`] an [`Action`], which runs the pure
//! [`Session::reduce`] transition. Consumers hold a cloned [`SessionStore`]
//! handed to them explicitly; there is no global instance.

use shared::models::{DashboardSummary, Profile, ReferenceItem, ReferralIncome, ReferralSummary};
use tokio::sync::watch;
use tracing::info;

/// Coarse lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Which screen set the UI may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// Neutral loading state while the bootstrapper runs.
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Reference lists that can be loaded into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceList {
    States(Vec<ReferenceItem>),
    /// Districts fetched for the given state id.
    Districts {
        state_id: u64,
        items: Vec<ReferenceItem>,
    },
}

/// District list tagged with the state it was fetched for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistrictList {
    state_id: Option<u64>,
    items: Vec<ReferenceItem>,
}

/// State transitions. Each maps to exactly one reducer arm.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    BootstrapStarted,
    BootstrapFinished,
    Authenticate(String),
    SetProfile(Profile),
    SetReferenceList(ReferenceList),
    SelectState(Option<u64>),
    SetRegistrationAmount(f64),
    SetDashboard(DashboardSummary),
    SetReferrals(ReferralSummary),
    SetReferralIncome(ReferralIncome),
    Logout,
}

/// Everything the UI reads about the current member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    profile: Option<Profile>,
    states: Vec<ReferenceItem>,
    selected_state: Option<u64>,
    districts: DistrictList,
    registration_amount: Option<f64>,
    dashboard: Option<DashboardSummary>,
    referrals: Option<ReferralSummary>,
    referral_income: Option<ReferralIncome>,
    loading: bool,
}

impl Session {
    /// Applies `action`, returning the next state.
    #[must_use]
    pub fn reduce(self, action: Action) -> Self {
        match action {
            Action::BootstrapStarted => Self {
                loading: true,
                ..self
            },
            Action::BootstrapFinished => Self {
                loading: false,
                ..self
            },
            Action::Authenticate(token) => Self {
                token: Some(token),
                ..self
            },
            Action::SetProfile(profile) => Self {
                profile: Some(profile),
                ..self
            },
            Action::SetReferenceList(ReferenceList::States(items)) => Self {
                states: items,
                ..self
            },
            Action::SetReferenceList(ReferenceList::Districts { state_id, items }) => {
                if self.selected_state == Some(state_id) {
                    Self {
                        districts: DistrictList {
                            state_id: Some(state_id),
                            items,
                        },
                        ..self
                    }
                } else {
                    self
                }
            }
            Action::SelectState(state_id) if state_id == self.selected_state => self,
            Action::SelectState(state_id) => Self {
                selected_state: state_id,
                districts: DistrictList::default(),
                ..self
            },
            Action::SetRegistrationAmount(amount) => Self {
                registration_amount: Some(amount),
                ..self
            },
            Action::SetDashboard(summary) => Self {
                dashboard: Some(summary),
                ..self
            },
            Action::SetReferrals(summary) => Self {
                referrals: Some(summary),
                ..self
            },
            Action::SetReferralIncome(income) => Self {
                referral_income: Some(income),
                ..self
            },
            Action::Logout => Self::default(),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Presence of the token is the sole authority for authentication.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn states(&self) -> &[ReferenceItem] {
        &self.states
    }

    #[must_use]
    pub fn selected_state(&self) -> Option<u64> {
        self.selected_state
    }

    /// Districts of the selected state; empty while none is selected or the
    /// list for a newly selected state has not arrived yet.
    #[must_use]
    pub fn districts(&self) -> &[ReferenceItem] {
        match (self.selected_state, self.districts.state_id) {
            (Some(selected), Some(loaded)) if selected == loaded => &self.districts.items,
            _ => &[],
        }
    }

    #[must_use]
    pub fn registration_amount(&self) -> Option<f64> {
        self.registration_amount
    }

    #[must_use]
    pub fn dashboard(&self) -> Option<&DashboardSummary> {
        self.dashboard.as_ref()
    }

    #[must_use]
    pub fn referrals(&self) -> Option<&ReferralSummary> {
        self.referrals.as_ref()
    }

    #[must_use]
    pub fn referral_income(&self) -> Option<&ReferralIncome> {
        self.referral_income.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Authenticating
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    #[must_use]
    pub fn shell(&self) -> Shell {
        match self.phase() {
            SessionPhase::Authenticating => Shell::Loading,
            SessionPhase::Authenticated => Shell::Authenticated,
            SessionPhase::Anonymous => Shell::Unauthenticated,
        }
    }
}

/// Shared handle to the one mutable [`Session`].
///
/// Cloning the store clones the handle, not the state. Mutations are
/// serialized by the underlying watch channel, so one dispatch completes
/// before the next begins.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sender: watch::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Session::default())
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(initial: Session) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Applies `action` through the reducer and notifies subscribers.
    pub fn dispatch(&self, action: Action) {
        log_transition(&action);
        self.sender.send_modify(|session| {
            *session = std::mem::take(session).reduce(action);
        });
    }

    /// Clears the session if `token` is still the current token. Returns
    /// whether it did.
    ///
    /// Used for session expiry so that several concurrent 401 responses
    /// tear the session down only once, and a rejection of an earlier
    /// token leaves a newer session alone.
    pub fn expire_token(&self, token: &str) -> bool {
        let expired = self.sender.send_if_modified(|session| {
            if session.token() == Some(token) {
                *session = std::mem::take(session).reduce(Action::Logout);
                true
            } else {
                false
            }
        });
        if expired {
            info!("session expired");
        }
        expired
    }

    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.sender.borrow().clone()
    }

    /// Reads the live token without cloning the whole session.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.sender.borrow().token.clone()
    }

    /// Returns a receiver that observes every subsequent transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.sender.subscribe()
    }
}

fn log_transition(action: &Action) {
    match action {
        Action::Authenticate(_) => info!("session authenticated"),
        Action::Logout => info!("session cleared"),
        Action::SetProfile(profile) => {
            tracing::debug!(username = %profile.username, "profile loaded");
        }
        other => tracing::trace!(action = ?std::mem::discriminant(other), "session transition"),
    }
}
