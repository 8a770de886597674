//! Authenticated request wrapper for mini-program backends.
//!
//! [`ApiClient`] attaches the stored token to every request, unwraps the
//! `{code, data, msg}` envelope, and transparently renews an expired session
//! once for all concurrent callers before retrying them.

mod client;
mod notify;
mod options;

pub use client::{ApiClient, ApiClientBuilder};
pub use notify::{SilentNotifier, TracingNotifier};
pub use options::{RequestOptions, UploadOptions};

pub use minireq_types::{Envelope, Error, Method, Result};
