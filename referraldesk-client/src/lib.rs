#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! Client core for the ReferralDesk member app: credential persistence,
//! the authenticated API client, the session store and everything that
//! feeds it.

pub mod actions;
pub mod api;
pub mod boundary;
pub mod bootstrap;
pub mod coalesce;
pub mod credentials;
pub mod error;
pub mod notify;
pub mod registration;
pub mod session;
pub mod validation;

pub use actions::{Actions, KycDocument, KycSubmission};
pub use api::{Access, ApiClient, RequestBody};
pub use bootstrap::{BootstrapReport, Bootstrapper, Liveness};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ActionError, ApiError, BoundaryError, StorageError};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use registration::{FieldEdit, RegistrationWizard, Step};
pub use session::{Action, Session, SessionPhase, SessionStore, Shell};
pub use validation::ValidationErrors;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod actions_test;
