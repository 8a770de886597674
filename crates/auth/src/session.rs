//! Session state on top of key-value storage.
//!
//! Responsibilities:
//! - Read and persist the access token and the account blob.
//! - Hand out a fresh token when the backend reports an expired session,
//!   running at most one refresh at a time (see [`RefreshGate`]).
use crate::{RefreshFlow, RefreshGate};
use arc_swap::ArcSwap;
use minireq_config::Config;
use minireq_types::{LoginProvider, Notifier, Result, Storage, Transport};
use serde_json::Value;
use std::sync::Arc;

pub struct SessionManager {
    config: Arc<ArcSwap<Config>>,
    storage: Arc<dyn Storage>,
    flow: Arc<RefreshFlow>,
    gate: RefreshGate,
}

impl SessionManager {
    pub fn new(
        config: Arc<ArcSwap<Config>>,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        login: Arc<dyn LoginProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let flow = Arc::new(RefreshFlow {
            config: Arc::clone(&config),
            storage: Arc::clone(&storage),
            transport,
            login,
            notifier,
        });
        Self {
            config,
            storage,
            flow,
            gate: RefreshGate::new(),
        }
    }

    fn token_key(&self) -> String {
        self.config.load().storage.access_token_key.clone()
    }

    fn account_key(&self) -> String {
        self.config.load().storage.account_info_key.clone()
    }

    /// The stored access token. An empty value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(&self.token_key())
            .await?
            .filter(|t| !t.is_empty()))
    }

    /// Persist a token obtained outside the refresh routine.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn save_access_token(&self, token: &str) -> Result<()> {
        self.storage.set(&self.token_key(), token).await
    }

    /// The stored account blob, parsed as JSON when possible.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn account_info(&self) -> Result<Option<Value>> {
        Ok(self
            .storage
            .get(&self.account_key())
            .await?
            .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw))))
    }

    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn save_account_info(&self, info: &Value) -> Result<()> {
        self.storage.set(&self.account_key(), &info.to_string()).await
    }

    /// Whether a token is stored. Says nothing about its validity server-side.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.access_token().await, Ok(Some(_)))
    }

    /// Remove the token and the account blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn logout(&self) -> Result<()> {
        self.storage.remove(&self.token_key()).await?;
        self.storage.remove(&self.account_key()).await
    }

    /// Remove everything from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }

    /// Obtain a token to retry a request that was rejected as expired.
    ///
    /// `stale` is the token the rejected request carried. If storage already
    /// holds a different token, a refresh completed in the meantime and that
    /// token is returned without starting another one. Otherwise the caller
    /// joins (or starts) the single in-flight refresh.
    ///
    /// # Errors
    ///
    /// Returns [`minireq_types::Error::Refresh`] if the refresh fails.
    pub async fn refresh(&self, stale: Option<&str>) -> Result<String> {
        if !self.gate.is_running()
            && let Some(current) = self.access_token().await?
            && Some(current.as_str()) != stale
        {
            tracing::debug!("token already refreshed by another caller");
            return Ok(current);
        }
        let flow = Arc::clone(&self.flow);
        self.gate.run(move || flow.run()).await
    }

    /// Run the refresh routine unconditionally (interactive login).
    ///
    /// # Errors
    ///
    /// Returns [`minireq_types::Error::Refresh`] if the refresh fails.
    pub async fn login(&self) -> Result<String> {
        let flow = Arc::clone(&self.flow);
        self.gate.run(move || flow.run()).await
    }

    /// Number of refresh routines started so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.gate.started()
    }
}
