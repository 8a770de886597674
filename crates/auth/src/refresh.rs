//! The session refresh routine.
//!
//! 1. Ask the [`LoginProvider`] for a one-time code.
//! 2. Exchange it at the login endpoint for a new token and persist it.
//! 3. Best effort: fetch the account blob with the new token and persist it.
//!
//! On failure all storage is cleared and the user is told to log in again.

use arc_swap::ArcSwap;
use minireq_config::Config;
use minireq_types::{
    APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE, Envelope, Error, Headers, HttpRequest,
    LoginProvider, Method, Notifier, Result, Storage, Transport,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Shown once per failed refresh.
pub const LOGIN_EXPIRED_MESSAGE: &str = "Login expired, please log in again";

/// Everything the refresh routine needs, shareable into a `'static` future.
pub struct RefreshFlow {
    pub(crate) config: Arc<ArcSwap<Config>>,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) login: Arc<dyn LoginProvider>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl RefreshFlow {
    /// Run the full routine, cleaning up the session on failure.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the login or token-exchange step.
    pub async fn run(self: Arc<Self>) -> Result<String> {
        match self.exchange().await {
            Ok(token) => {
                tracing::info!("session refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed, clearing storage");
                if let Err(clear_err) = self.storage.clear().await {
                    tracing::warn!(error = %clear_err, "failed to clear storage");
                }
                self.notifier.notify(LOGIN_EXPIRED_MESSAGE);
                Err(e)
            }
        }
    }

    async fn exchange(&self) -> Result<String> {
        let config = self.config.load_full();

        let code = self.login.login().await?;
        tracing::debug!("login provider returned a code");

        let mut headers = Headers::new();
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        let envelope = self
            .fetch(&HttpRequest {
                url: config.resolve_url(&config.endpoints.login),
                method: Method::Post,
                headers,
                body: json!({ "code": code }),
                timeout: config.timeout(),
            })
            .await?;

        let token = envelope
            .data_str()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Refresh("login response carried no token".into()))?
            .to_string();

        self.storage
            .set(&config.storage.access_token_key, &token)
            .await?;

        if let Err(e) = self.store_account_info(&config, &token).await {
            tracing::warn!(error = %e, "failed to fetch user info after refresh");
        }

        Ok(token)
    }

    async fn store_account_info(&self, config: &Config, token: &str) -> Result<()> {
        let mut headers = Headers::new();
        headers.insert(AUTHORIZATION.to_string(), token.to_string());
        let envelope = self
            .fetch(&HttpRequest {
                url: config.resolve_url(&config.endpoints.user_info),
                method: Method::Get,
                headers,
                body: Value::Object(serde_json::Map::new()),
                timeout: config.timeout(),
            })
            .await?;

        if let Some(data) = envelope.data {
            self.storage
                .set(&config.storage.account_info_key, &data.to_string())
                .await?;
        }
        Ok(())
    }

    /// One exchange without interceptors: status check, envelope, success code.
    async fn fetch(&self, req: &HttpRequest) -> Result<Envelope> {
        let resp = self.transport.request(req).await?;
        if resp.status != 200 {
            return Err(Error::Status {
                status: resp.status,
            });
        }
        let envelope = Envelope::from_slice(&resp.body)?;
        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(envelope.into_error())
        }
    }
}
