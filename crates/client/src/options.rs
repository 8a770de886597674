//! Caller-facing request and upload options.

use minireq_types::{Headers, Method, set_header};
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};

/// Options for [`ApiClient::request`](crate::ApiClient::request).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Path relative to the base URL, or an absolute `http(s)` URL.
    pub url: String,
    pub method: Method,
    /// Payload; defaults to an empty object.
    pub data: Option<Value>,
    /// Header overrides. The interceptor may replace `Authorization` and `Content-Type`.
    pub headers: Headers,
    /// Per-request timeout; defaults to the configured one.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set a header, replacing any entry whose name differs only in case.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, &name.into(), value);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for [`ApiClient::upload_image`](crate::ApiClient::upload_image).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    /// Upload endpoint; required.
    pub url: String,
    /// Local file to send; required.
    pub file_path: String,
    /// Form field the server reads the file from; required.
    pub name: String,
    /// Extra form fields.
    pub form_data: BTreeMap<String, String>,
    pub headers: Headers,
    pub timeout: Option<Duration>,
}

impl UploadOptions {
    pub fn new(
        url: impl Into<String>,
        file_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    /// Set a header, replacing any entry whose name differs only in case.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, &name.into(), value);
        self
    }

    /// The first required field that is empty, if any.
    #[must_use]
    pub fn missing_param(&self) -> Option<&'static str> {
        if self.url.is_empty() {
            Some("url")
        } else if self.file_path.is_empty() {
            Some("filePath")
        } else if self.name.is_empty() {
            Some("name")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_options_builder() {
        let o = RequestOptions::new(Method::Post, "/api/task")
            .data(json!({"title": "t"}))
            .header("X-Trace", "1")
            .timeout(Duration::from_secs(2));
        assert_eq!(o.method, Method::Post);
        assert_eq!(o.data, Some(json!({"title": "t"})));
        assert_eq!(o.headers.get("X-Trace").map(String::as_str), Some("1"));
        assert_eq!(o.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_request_options_defaults() {
        let o = RequestOptions::default();
        assert_eq!(o.method, Method::Get);
        assert!(o.data.is_none());
        assert!(o.headers.is_empty());
    }

    #[test]
    fn test_missing_param_order() {
        assert_eq!(UploadOptions::new("", "", "").missing_param(), Some("url"));
        assert_eq!(
            UploadOptions::new("/u", "", "image").missing_param(),
            Some("filePath")
        );
        assert_eq!(
            UploadOptions::new("/u", "/tmp/a.png", "").missing_param(),
            Some("name")
        );
        assert_eq!(
            UploadOptions::new("/u", "/tmp/a.png", "image").missing_param(),
            None
        );
    }

    #[test]
    fn test_header_case_variants_collapse() {
        let o = RequestOptions::new(Method::Post, "/api/task")
            .header("content-type", "text/plain")
            .header("Content-Type", "application/json");
        assert_eq!(o.headers.len(), 1);
        assert_eq!(
            o.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );

        let u = UploadOptions::new("/u", "/tmp/a.png", "image")
            .header("x-trace", "1")
            .header("X-TRACE", "2");
        assert_eq!(u.headers.len(), 1);
        assert_eq!(u.headers.get("X-TRACE").map(String::as_str), Some("2"));
    }
}
