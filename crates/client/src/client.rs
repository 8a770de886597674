//! The request wrapper: interceptors, envelope handling, expiry retry, upload.

use crate::{RequestOptions, TracingNotifier, UploadOptions};
use arc_swap::ArcSwap;
use minireq_auth::{NoLoginProvider, SessionManager};
use minireq_config::Config;
use minireq_store::InMemoryStorage;
use minireq_transport::{HttpTransport, build_http_client};
use minireq_types::{
    APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE, Envelope, Error, HttpRequest, LoginProvider,
    Method, Notifier, Result, Storage, Transport, UploadRequest, get_header, set_header,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

const NETWORK_FAILED: &str = "Network request failed, please check the network connection";
const REQUEST_FAILED: &str = "Request failed";
const UPLOAD_NETWORK_FAILED: &str = "Image upload failed, please check the network connection";
const UPLOAD_FAILED: &str = "Upload failed";

/// What a single dispatch produced when it did not fail outright.
enum Outcome {
    Success(Envelope),
    Expired(Envelope),
}

/// Authenticated client for the backend.
///
/// Cheap to share behind an `Arc`; all state lives in the collaborators.
pub struct ApiClient {
    config: Arc<ArcSwap<Config>>,
    transport: Arc<dyn Transport>,
    session: Arc<SessionManager>,
    notifier: Arc<dyn Notifier>,
}

/// Builder for [`ApiClient`]. Unset collaborators fall back to:
/// reqwest transport, in-memory storage, no login provider, tracing notifier.
pub struct ApiClientBuilder {
    config: Arc<ArcSwap<Config>>,
    transport: Option<Arc<dyn Transport>>,
    storage: Option<Arc<dyn Storage>>,
    login: Option<Arc<dyn LoginProvider>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn login_provider(mut self, login: Arc<dyn LoginProvider>) -> Self {
        self.login = Some(login);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn build(self) -> ApiClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new(build_http_client())));
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryStorage::new()));
        let login = self.login.unwrap_or_else(|| Arc::new(NoLoginProvider));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));

        let session = Arc::new(SessionManager::new(
            Arc::clone(&self.config),
            storage,
            Arc::clone(&transport),
            login,
            Arc::clone(&notifier),
        ));
        ApiClient {
            config: self.config,
            transport,
            session,
            notifier,
        }
    }
}

impl ApiClient {
    /// Start building a client around a live (hot-swappable) configuration.
    #[must_use]
    pub fn builder(config: Arc<ArcSwap<Config>>) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            transport: None,
            storage: None,
            login: None,
            notifier: None,
        }
    }

    /// The session backing this client.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// A snapshot of the current configuration.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Make a resource path absolute against the base URL.
    #[must_use]
    pub fn resolve_resource_url(&self, url: &str) -> String {
        self.config.load().resolve_url(url)
    }

    /// Send a request and resolve with the success envelope.
    ///
    /// An expired-session envelope triggers one shared refresh and a single
    /// retry with the new token.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] / [`Error::Status`] when the transport fails;
    /// - [`Error::InvalidEnvelope`] when the body is not an envelope;
    /// - [`Error::Business`] for any non-success code;
    /// - [`Error::Refresh`] when the session could not be renewed.
    pub async fn request(&self, options: RequestOptions) -> Result<Envelope> {
        let req = self.intercept(&options).await;
        match self.dispatch(&req).await? {
            Outcome::Success(envelope) => Ok(envelope),
            Outcome::Expired(_) => {
                let stale = get_header(&req.headers, AUTHORIZATION).map(str::to_string);
                tracing::debug!(url = %req.url, "session expired, refreshing");
                let token = self.session.refresh(stale.as_deref()).await?;

                let mut retry = req;
                set_header(&mut retry.headers, AUTHORIZATION, token);
                match self.dispatch(&retry).await? {
                    Outcome::Success(envelope) => Ok(envelope),
                    Outcome::Expired(envelope) => {
                        tracing::warn!(url = %retry.url, "session still expired after refresh");
                        Err(self.business_error(envelope, REQUEST_FAILED))
                    }
                }
            }
        }
    }

    /// Like [`request`](Self::request), decoding the envelope's `data` into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) returns, plus [`Error::Decode`].
    pub async fn request_data<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T> {
        self.request(options).await?.into_data()
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, url: &str, data: Value) -> Result<Envelope> {
        self.request(RequestOptions::new(Method::Get, url).data(data))
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(&self, url: &str, data: Value) -> Result<Envelope> {
        self.request(RequestOptions::new(Method::Post, url).data(data))
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&self, url: &str, data: Value) -> Result<Envelope> {
        self.request(RequestOptions::new(Method::Put, url).data(data))
            .await
    }

    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(&self, url: &str, data: Value) -> Result<Envelope> {
        self.request(RequestOptions::new(Method::Delete, url).data(data))
            .await
    }

    /// Upload a file as multipart form data.
    ///
    /// Shares token attachment and envelope checks with [`request`](Self::request)
    /// but never refreshes the session.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParam`] before any I/O when `url`, `file_path` or `name` is empty;
    /// - [`Error::Network`] / [`Error::Status`] when the transport fails;
    /// - [`Error::Decode`] when the body is not JSON;
    /// - [`Error::InvalidEnvelope`] / [`Error::Business`] otherwise.
    pub async fn upload_image(&self, options: UploadOptions) -> Result<Envelope> {
        if let Some(param) = options.missing_param() {
            return Err(Error::MissingParam(param));
        }

        let config = self.config.load_full();
        let mut headers = options.headers;
        if let Some(token) = self.stored_token().await {
            set_header(&mut headers, AUTHORIZATION, token);
        }
        let req = UploadRequest {
            url: config.resolve_url(&options.url),
            file_path: options.file_path,
            name: options.name,
            form_data: options.form_data,
            headers,
            timeout: options.timeout.unwrap_or_else(|| config.timeout()),
        };

        let resp = match self.transport.upload(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(url = %req.url, error = %e, "upload transport failure");
                self.notifier.notify(UPLOAD_NETWORK_FAILED);
                return Err(e);
            }
        };
        if resp.status != 200 {
            self.notifier
                .notify(&format!("{UPLOAD_FAILED} ({})", resp.status));
            return Err(Error::Status {
                status: resp.status,
            });
        }

        let body: Value =
            serde_json::from_slice(&resp.body).map_err(|e| Error::Decode(e.to_string()))?;
        let Some(envelope) = Envelope::from_value(body) else {
            self.notifier.notify(UPLOAD_FAILED);
            return Err(Error::InvalidEnvelope);
        };
        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(self.business_error(envelope, UPLOAD_FAILED))
        }
    }

    async fn stored_token(&self) -> Option<String> {
        match self.session.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read access token, sending without it");
                None
            }
        }
    }

    /// Request interceptor: resolve the URL and inject headers.
    async fn intercept(&self, options: &RequestOptions) -> HttpRequest {
        let config = self.config.load_full();
        let mut headers = options.headers.clone();
        if let Some(token) = self.stored_token().await {
            set_header(&mut headers, AUTHORIZATION, token);
        }
        if options.method.has_json_body() {
            set_header(&mut headers, CONTENT_TYPE, APPLICATION_JSON);
        }
        HttpRequest {
            url: config.resolve_url(&options.url),
            method: options.method,
            headers,
            body: options.data.clone().unwrap_or_else(|| json!({})),
            timeout: options.timeout.unwrap_or_else(|| config.timeout()),
        }
    }

    /// One exchange plus the response interceptor, minus the refresh.
    async fn dispatch(&self, req: &HttpRequest) -> Result<Outcome> {
        let resp = match self.transport.request(req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(method = %req.method, url = %req.url, error = %e, "transport failure");
                self.notifier.notify(NETWORK_FAILED);
                return Err(e);
            }
        };
        if resp.status != 200 {
            tracing::warn!(url = %req.url, status = resp.status, "unexpected http status");
            self.notifier
                .notify(&format!("Network error ({})", resp.status));
            return Err(Error::Status {
                status: resp.status,
            });
        }

        let envelope = Envelope::from_slice(&resp.body)?;
        if envelope.is_success() {
            Ok(Outcome::Success(envelope))
        } else if envelope.is_session_expired() {
            Ok(Outcome::Expired(envelope))
        } else {
            Err(self.business_error(envelope, REQUEST_FAILED))
        }
    }

    fn business_error(&self, envelope: Envelope, fallback: &str) -> Error {
        tracing::debug!(code = envelope.code, msg = ?envelope.msg, "business error");
        self.notifier
            .notify(envelope.msg.as_deref().unwrap_or(fallback));
        envelope.into_error()
    }
}
