use serde::{Deserialize, Serialize};

/// Credentials posted to the `login` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Member username (SAM id) or registered mobile number.
    pub username: String,
    /// Plain-text password; only ever sent over TLS.
    pub password: String,
}

/// Successful login payload. The token travels in the `data` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent requests.
    pub data: String,
}

/// Request body for the `change-password` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}
