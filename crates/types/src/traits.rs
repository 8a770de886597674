//! Async traits shared across all minireq crates.
//!
//! Every host collaborator is defined here so that higher layers depend
//! only on `minireq-types`, not on each other or on a concrete platform.

use crate::{HttpRequest, Result, TransportResponse, UploadRequest};
use async_trait::async_trait;

/// The host networking primitive.
///
/// Implementations turn whatever callback or blocking API the platform offers
/// into a single awaited result. Any completed exchange, whatever its status,
/// is `Ok`; only failures to complete the exchange are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a request and return the raw response.
    async fn request(&self, req: &HttpRequest) -> Result<TransportResponse>;
    /// Perform a multipart file upload and return the raw response.
    async fn upload(&self, req: &UploadRequest) -> Result<TransportResponse>;
}

/// Persistent key-value storage for the access token and the account blob.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store (or overwrite) the value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove `key`, if present.
    async fn remove(&self, key: &str) -> Result<()>;
    /// Remove every key.
    async fn clear(&self) -> Result<()>;
}

/// User-facing presentation of failures (toast, alert, status line, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// The login-provider SDK used by the refresh routine to obtain a one-time code.
#[async_trait]
pub trait LoginProvider: Send + Sync {
    async fn login(&self) -> Result<String>;
}
