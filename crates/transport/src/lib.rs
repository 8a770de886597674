//! Network transport for the minireq client.
//!
//! The host networking primitive is wrapped once here into an `async fn`
//! so the rest of the workspace never deals with callbacks or raw clients.

pub mod http;

pub use http::{HttpTransport, query_pairs};

/// Build the default `reqwest` client used by [`HttpTransport`].
///
/// Per-request timeouts are applied on each call, not here.
#[must_use]
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("minireq/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build http client, using defaults");
            reqwest::Client::new()
        })
}
