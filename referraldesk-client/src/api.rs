//! Authenticated API client.
//!
//! Every request attaches the bearer token read from the [`SessionStore`]
//! when the request is issued, then classifies the response into
//! a payload or an [`ApiError`]. An authenticated 401 tears the session down
//! here, once, so no caller has to.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode, multipart::Form};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use shared::models::Envelope;
use tracing::{debug, warn};
use url::Url;

use crate::{
    coalesce::Coalescer, credentials::CredentialStore, error::ApiError, session::SessionStore,
};

const USER_AGENT: &str = concat!("referraldesk-client/", env!("CARGO_PKG_VERSION"));

/// Message for a 401 on a public request, i.e. rejected credentials.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "You have entered an incorrect password.";

/// Whether a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No token attached; a 401 means the submitted credentials were wrong.
    Public,
    /// Bearer token attached; a 401 means the session expired.
    Authenticated,
}

/// Request payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Form),
}

impl RequestBody {
    /// Serializes `value` as a JSON body.
    ///
    /// # Errors
    /// Returns [`ApiError::Request`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| ApiError::Request(err.to_string()))
    }
}

struct Inner {
    base_url: Url,
    http: Client,
    session: SessionStore,
    credentials: Arc<dyn CredentialStore>,
    reads: Coalescer<Value>,
}

/// Thin, cloneable client for the ReferralDesk REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("reads", &self.inner.reads)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`ApiError::Request`] if the HTTP client cannot be built.
    pub fn new(
        base_url: Url,
        session: SessionStore,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ApiError::Request(err.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                base_url,
                http,
                session,
                credentials,
                reads: Coalescer::new(),
            }),
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Request(format!("invalid path `{path}`: {err}")))
    }

    /// Performs one request and decodes the success payload as `T`.
    ///
    /// # Errors
    /// See [`ApiError`] for the classification.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        access: Access,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let bearer = self.bearer(access);
        let value = self
            .send(method, path, access, bearer.as_deref(), body)
            .await?;
        decode(path, value)
    }

    /// Token an `access` request would carry if sent now.
    #[must_use]
    pub fn bearer(&self, access: Access) -> Option<String> {
        match access {
            Access::Public => None,
            Access::Authenticated => self.inner.session.token(),
        }
    }

    /// GET `path` with the live token. Concurrent identical reads share one
    /// network call.
    ///
    /// # Errors
    /// See [`ApiError`] for the classification.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, access: Access) -> Result<T, ApiError> {
        self.get_as(path, access, self.bearer(access)).await
    }

    /// GET `path` sending exactly `bearer`. Reads are shared only between
    /// callers presenting the same access mode and token, so a request made
    /// for one account is never joined by another.
    ///
    /// # Errors
    /// See [`ApiError`] for the classification.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        access: Access,
        bearer: Option<String>,
    ) -> Result<T, ApiError> {
        let key = format!("{access:?}:{}:{path}", bearer.as_deref().unwrap_or_default());
        let client = self.clone();
        let owned_path = path.to_owned();
        let value = self
            .inner
            .reads
            .run(&key, move || async move {
                client
                    .send(
                        Method::GET,
                        &owned_path,
                        access,
                        bearer.as_deref(),
                        RequestBody::Empty,
                    )
                    .await
            })
            .await?;
        decode(path, value)
    }

    /// POST `body` as JSON to `path`.
    ///
    /// # Errors
    /// See [`ApiError`] for the classification.
    pub async fn post_json<T, B>(&self, path: &str, access: Access, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, access, RequestBody::json(body)?)
            .await
    }

    /// POST a multipart form to `path`.
    ///
    /// # Errors
    /// See [`ApiError`] for the classification.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        access: Access,
        form: Form,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, access, RequestBody::Multipart(form))
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        access: Access,
        bearer: Option<&str>,
        body: RequestBody,
    ) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        let mut builder = self.inner.http.request(method.clone(), url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        debug!(%method, path, ?access, "sending request");
        let response = builder.send().await.map_err(|err| {
            warn!(%method, path, error = %err, "request failed without response");
            ApiError::Network(err.to_string())
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        debug!(%method, path, status = status.as_u16(), "response received");

        if status == StatusCode::UNAUTHORIZED {
            return Err(self.unauthorized(access, bearer));
        }

        let parsed = serde_json::from_str::<Value>(&text).ok();
        let envelope = parsed
            .as_ref()
            .and_then(|value| Envelope::deserialize(value).ok())
            .unwrap_or_default();

        if !status.is_success() {
            let message = envelope
                .message()
                .map_or_else(|| fallback_message(status), str::to_owned);
            return Err(ApiError::domain(Some(status.as_u16()), message));
        }

        let Some(value) = parsed else {
            return Err(ApiError::InvalidResponse(format!(
                "{path} returned a non-JSON body"
            )));
        };
        if !envelope.is_success() {
            let message = envelope
                .message()
                .unwrap_or("Request failed. Please try again.")
                .to_owned();
            return Err(ApiError::domain(Some(status.as_u16()), message));
        }
        Ok(value)
    }

    fn unauthorized(&self, access: Access, bearer: Option<&str>) -> ApiError {
        match access {
            Access::Public => ApiError::domain(
                Some(StatusCode::UNAUTHORIZED.as_u16()),
                INVALID_CREDENTIALS_MESSAGE,
            ),
            Access::Authenticated => {
                // A rejected token that is no longer current says nothing
                // about the session that replaced it.
                if bearer.is_some_and(|token| self.inner.session.expire_token(token)) {
                    if let Err(err) = self.inner.credentials.remove() {
                        warn!(error = %err, "failed to remove expired credential");
                    }
                }
                ApiError::Auth
            }
        }
    }
}

fn fallback_message(status: StatusCode) -> String {
    if status.is_server_error() {
        "Server error. Please try again later.".to_string()
    } else {
        format!("Request failed with status {}", status.as_u16())
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|err| ApiError::InvalidResponse(format!("{path}: {err}")))
}
