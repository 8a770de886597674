//! [`Transport`] implementation over `reqwest`.
//!
//! Performs exactly one exchange per call and hands back the raw status and
//! body; envelope handling and status policy live in the client.

use async_trait::async_trait;
use minireq_types::{
    Error, Headers, HttpRequest, Method, Result, Transport, TransportResponse, UploadRequest,
};
use reqwest::{
    Client, RequestBuilder,
    header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
    multipart,
};
use serde_json::Value;
use std::path::Path;

/// HTTP transport wrapping a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Creates a transport wrapping the given HTTP client.
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Convert caller headers into a [`HeaderMap`].
    ///
    /// Names are normalized, so case variants collapse to the last one.
    fn header_map(headers: &Headers) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let key = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Network(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Network(format!("invalid value for header '{name}': {e}")))?;
            map.insert(key, value);
        }
        Ok(map)
    }

    async fn finish(builder: RequestBuilder) -> Result<TransportResponse> {
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Flatten a JSON payload into query pairs.
///
/// Scalars are rendered as text, `null` members are skipped, and nested
/// arrays or objects are sent as their JSON encoding.
#[must_use]
pub fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = payload else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
                    v.to_string()
                }
            };
            Some((k.clone(), text))
        })
        .collect()
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, req: &HttpRequest) -> Result<TransportResponse> {
        let builder = match req.method {
            Method::Get => self.http.get(&req.url).query(&query_pairs(&req.body)),
            Method::Delete => self.http.delete(&req.url).query(&query_pairs(&req.body)),
            Method::Post => self.http.post(&req.url).json(&req.body),
            Method::Put => self.http.put(&req.url).json(&req.body),
        };
        // `headers` replaces the `Content-Type` that `json` set.
        let builder = builder
            .timeout(req.timeout)
            .headers(Self::header_map(&req.headers)?);

        tracing::debug!(method = %req.method, url = %req.url, "sending request");
        let resp = Self::finish(builder).await;
        if let Err(e) = &resp {
            tracing::debug!(url = %req.url, error = %e, "transport failure");
        }
        resp
    }

    async fn upload(&self, req: &UploadRequest) -> Result<TransportResponse> {
        let bytes = tokio::fs::read(&req.file_path)
            .await
            .map_err(|e| Error::Network(format!("failed to read {}: {e}", req.file_path)))?;

        let part = multipart::Part::bytes(bytes).file_name(file_name(&req.file_path));
        let form = req
            .form_data
            .iter()
            .fold(multipart::Form::new(), |form, (k, v)| {
                form.text(k.clone(), v.clone())
            })
            .part(req.name.clone(), part);

        // The multipart boundary type always wins over a caller `Content-Type`.
        let mut headers = Self::header_map(&req.headers)?;
        headers.remove(CONTENT_TYPE);
        let builder = self
            .http
            .post(&req.url)
            .timeout(req.timeout)
            .multipart(form)
            .headers(headers);

        tracing::debug!(url = %req.url, field = %req.name, "uploading file");
        Self::finish(builder).await
    }
}
