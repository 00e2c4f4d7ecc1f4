//! Error taxonomy of the client core.
//!
//! Every failure a caller can see falls into one of these buckets:
//! [`StorageError`] (credential persistence), [`ApiError`] (one network
//! request), [`BoundaryError`] (attachments, permission prompts, callbacks)
//! and [`ValidationErrors`] (client-side form checks). [`ActionError`] joins
//! the last three for operations that validate, pick a file and then call
//! the server.

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::{boundary::Permission, validation::ValidationErrors};

/// Message surfaced for transport failures.
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";
/// Message surfaced when the session has expired.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
/// Message surfaced when the server replies with something unreadable.
pub const INVALID_RESPONSE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failure of a single API request, already classified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 401 on an authenticated request. The session has already been
    /// torn down by the time a caller sees this.
    #[error("session expired")]
    Auth,
    /// Non-2xx status or a body-level failure flag.
    #[error("{message}")]
    Domain {
        status: Option<u16>,
        message: String,
    },
    /// No response: connection refused, DNS, TLS, reset.
    #[error("network error: {0}")]
    Network(String),
    /// A 2xx body that does not match the expected payload.
    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),
    /// The request could not be assembled (bad path, bad attachment type).
    #[error("failed to build request: {0}")]
    Request(String),
}

impl ApiError {
    /// Creates a domain error with a server-supplied message.
    pub fn domain(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` for the session-expiry signal.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth)
    }

    /// Returns `true` if retrying the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Text to show the user in a transient notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Domain { message, .. } => message.clone(),
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::InvalidResponse(_) | Self::Request(_) => INVALID_RESPONSE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Request(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failure reading or writing the persisted credential.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read credential at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write credential at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove credential at {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Failure at the boundary with platform collaborators.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("{} permission is required to continue", .0.label())]
    PermissionDenied(Permission),
    #[error("the operation was cancelled")]
    Cancelled,
    #[error("failed to read attachment {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of a user-initiated operation.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Client-side checks failed; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
}

impl ActionError {
    /// Text to show the user in a transient notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "Please fix the errors before submitting".to_string(),
            Self::Api(err) => err.user_message(),
            Self::Boundary(err) => err.to_string(),
        }
    }

    /// Field errors, when the failure came from validation.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
