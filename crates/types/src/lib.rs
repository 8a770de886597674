//! Core types and traits for the minireq workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! client, including the error type, the response envelope, request
//! descriptors, and the async traits each host collaborator implements.

pub mod envelope;
pub mod error;
pub mod request;
pub mod traits;

pub use envelope::{Envelope, SESSION_EXPIRED_CODE, SUCCESS_CODE};
pub use error::{Error, Result};
pub use request::{
    Headers, HttpRequest, Method, TransportResponse, UploadRequest, get_header, set_header,
};
pub use traits::{LoginProvider, Notifier, Storage, Transport};

/// Header carrying the session token.
pub const AUTHORIZATION: &str = "Authorization";

/// Header forced on requests with a JSON body.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Content type of every JSON body.
pub const APPLICATION_JSON: &str = "application/json";
