use serde::{Deserialize, Serialize};

/// Status header carried by every response body.
///
/// Successful bodies look like `{ "status": true, ...payload }`, failures like
/// `{ "status": false, "msg": "..." }`. Mutating endpoints reply with the header
/// alone, so this type doubles as their response model.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Envelope {
    /// Body-level success flag. A missing flag counts as failure.
    #[serde(default)]
    pub status: bool,
    /// Human readable message supplied by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl Envelope {
    /// Creates a success envelope with an optional message.
    pub fn success(msg: Option<impl Into<String>>) -> Self {
        Self {
            status: true,
            msg: msg.map(Into::into),
        }
    }

    /// Creates a failure envelope carrying `msg`.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            status: false,
            msg: Some(msg.into()),
        }
    }

    /// Returns `true` if the body-level flag reports success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status
    }

    /// Returns the server message, if any non-blank message was sent.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.status, self.message()) {
            (true, Some(msg)) => write!(f, "ok: {msg}"),
            (true, None) => f.write_str("ok"),
            (false, Some(msg)) => write!(f, "failed: {msg}"),
            (false, None) => f.write_str("failed"),
        }
    }
}
