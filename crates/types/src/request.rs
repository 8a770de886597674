//! Request and response descriptors exchanged with a [`Transport`](crate::Transport).

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, time::Duration};

/// Header map keyed by header name as written by the caller.
pub type Headers = BTreeMap<String, String>;

/// HTTP methods supported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// `GET` and `DELETE` carry their payload in the query string, not a JSON body.
    #[must_use]
    pub fn has_json_body(self) -> bool {
        !matches!(self, Self::Get | Self::Delete)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(crate::Error::Config(format!("unsupported method: {other}"))),
        }
    }
}

/// Insert a header, replacing any existing entry whose name matches case-insensitively.
pub fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.into());
}

/// Look up a header case-insensitively.
#[must_use]
pub fn get_header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A fully resolved request, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Absolute URL.
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    /// JSON payload; sent as the body, or as query parameters for `GET`/`DELETE`.
    pub body: Value,
    pub timeout: Duration,
}

/// A multipart file upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    /// Absolute URL.
    pub url: String,
    /// Local path of the file to send.
    pub file_path: String,
    /// Form field name the server reads the file from.
    pub name: String,
    /// Extra text fields sent alongside the file.
    pub form_data: BTreeMap<String, String>,
    pub headers: Headers,
    pub timeout: Duration,
}

/// What the transport reports back for a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Convenience constructor for tests and doubles that answer with JSON.
    #[must_use]
    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_method_json_body() {
        assert!(!Method::Get.has_json_body());
        assert!(!Method::Delete.has_json_body());
        assert!(Method::Post.has_json_body());
        assert!(Method::Put.has_json_body());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(Method::from_str("get").unwrap(), Method::Get);
        assert_eq!(Method::from_str("PUT").unwrap(), Method::Put);
        assert!(Method::from_str("PATCH").is_err());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_set_header_replaces_case_insensitive() {
        let mut h = Headers::new();
        h.insert("authorization".into(), "old".into());
        set_header(&mut h, "Authorization", "new");
        assert_eq!(h.len(), 1);
        assert_eq!(get_header(&h, "AUTHORIZATION"), Some("new"));
    }

    #[test]
    fn test_get_header_missing() {
        assert!(get_header(&Headers::new(), "Content-Type").is_none());
    }

    #[test]
    fn test_transport_response_json() {
        let resp = TransportResponse::json(200, &serde_json::json!({"code": 200}));
        assert_eq!(resp.status, 200);
        assert_eq!(&resp.body[..], br#"{"code":200}"#);
    }
}
