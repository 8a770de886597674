//! Unified error type for the minireq workspace.

use serde_json::Value;
use thiserror::Error;

/// Enumerates all error kinds that can occur across minireq crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport could not complete the exchange (connect, timeout, I/O).
    #[error("network error: {0}")]
    Network(String),

    /// The transport completed but the HTTP status was not 200.
    #[error("unexpected http status: {status}")]
    Status { status: u16 },

    /// A 200 response whose body is not a `{code, data, msg}` envelope.
    #[error("response is not a valid envelope")]
    InvalidEnvelope,

    /// The envelope carried a non-success business code.
    #[error("business error: code={code}, msg={}", msg.as_deref().unwrap_or(""))]
    Business {
        code: i64,
        msg: Option<String>,
        data: Option<Value>,
    },

    /// The session refresh routine failed; shared by every waiting caller.
    #[error("session refresh failed: {0}")]
    Refresh(String),

    /// A required upload parameter was empty.
    #[error("missing required parameter: {0}")]
    MissingParam(&'static str),

    /// A response body could not be decoded.
    #[error("failed to parse response data: {0}")]
    Decode(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key-value storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl Error {
    /// Returns `true` if the error came from an envelope reporting an expired session.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Business { code, .. } if *code == crate::SESSION_EXPIRED_CODE)
    }

    /// Returns `true` if the request never produced a parseable response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
