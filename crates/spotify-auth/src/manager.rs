//! Bearer token lifecycle
//!
//! `TokenManager` owns the single current token. It is obtained lazily on
//! first use and replaced wholesale when a caller reports that the API
//! rejected it. Each replacement runs a full consent round through the
//! configured `CodeSource` followed by a code exchange.
//!
//! The slot sits behind a tokio Mutex that is held for the whole refresh,
//! so nobody reads a half-replaced value. Callers queued behind an
//! in-flight bootstrap reuse its token. A refresh names the token that was
//! rejected and is skipped when the slot already holds a newer one, so
//! concurrent 403s lead to a single consent round.

use std::future::Future;
use std::pin::Pin;

use common::Secret;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::authorize::{AuthorizationCode, Credentials};
use crate::constants::TOKEN_ENDPOINT;
use crate::error::Result;
use crate::token::exchange_code;

/// Something that can produce a fresh authorization code.
///
/// Uses `Pin<Box<dyn Future>>` so the manager can hold a `Box<dyn CodeSource>`.
pub trait CodeSource: Send + Sync {
    fn authorize(&self) -> Pin<Box<dyn Future<Output = Result<AuthorizationCode>> + Send + '_>>;
}

pub struct TokenManager {
    client: reqwest::Client,
    credentials: Credentials,
    code_source: Box<dyn CodeSource>,
    token_endpoint: String,
    slot: Mutex<Option<Secret<String>>>,
}

impl TokenManager {
    pub fn new(
        client: reqwest::Client,
        credentials: Credentials,
        code_source: impl CodeSource + 'static,
    ) -> Self {
        Self {
            client,
            credentials,
            code_source: Box::new(code_source),
            token_endpoint: TOKEN_ENDPOINT.to_owned(),
            slot: Mutex::new(None),
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Start with a token already in the slot.
    pub fn with_token(mut self, token: impl Into<Secret<String>>) -> Self {
        *self.slot.get_mut() = Some(token.into());
        self
    }

    /// The current token, if one has been obtained.
    pub async fn current(&self) -> Option<Secret<String>> {
        self.slot.lock().await.clone()
    }

    /// The current token, running one refresh first if there is none yet.
    pub async fn ensure(&self) -> Result<Secret<String>> {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        info!("no access token yet, authorizing");
        let token = self.obtain().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Replace `rejected` with a freshly obtained token.
    ///
    /// Does nothing when another caller has already replaced it. On failure
    /// the old value stays in place.
    pub async fn refresh(&self, rejected: &Secret<String>) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|current| current.expose() != rejected.expose())
        {
            debug!("token already replaced, skipping refresh");
            return Ok(());
        }
        let token = self.obtain().await?;
        *slot = Some(token);
        info!("access token replaced");
        Ok(())
    }

    async fn obtain(&self) -> Result<Secret<String>> {
        let code = self.code_source.authorize().await?;
        exchange_code(&self.client, &self.token_endpoint, &self.credentials, code).await
    }
}
