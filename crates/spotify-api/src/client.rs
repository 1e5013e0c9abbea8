//! Retrying authenticated GET
//!
//! One call to `request` makes at most `tries + 1` attempts. A 403 is read
//! as "token rejected" and triggers a token refresh before the next attempt;
//! every other failure is retried with the same token. The loop counts
//! `remaining` down, so it always terminates.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use spotify_auth::TokenManager;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::metrics::{record_refresh, record_response, record_retry};

/// Spotify Web API base URL
pub const API_BASE: &str = "https://api.spotify.com/v1";

/// Retries allowed after the first attempt
pub const DEFAULT_TRIES: u32 = 2;

/// A single resource request: `GET {api_base}/{endpoint}/{param}?{query}`.
///
/// Built fresh per call; the query map is owned by the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub endpoint: String,
    pub param: String,
    pub query: BTreeMap<String, String>,
    pub tries: u32,
}

impl ResourceRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            param: String::new(),
            query: BTreeMap::new(),
            tries: DEFAULT_TRIES,
        }
    }

    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Path below the API base. `/{param}` is left off when `param` is empty.
    pub fn path(&self) -> String {
        let endpoint = self.endpoint.trim_matches('/');
        if self.param.is_empty() {
            endpoint.to_owned()
        } else {
            format!("{endpoint}/{}", self.param)
        }
    }
}

pub struct SpotifyClient {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    api_base: String,
    retry_delay: Duration,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            tokens,
            api_base: API_BASE.to_owned(),
            retry_delay: Duration::ZERO,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    /// Pause between attempts. Zero (the default) retries immediately.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn url_for(&self, request: &ResourceRequest) -> String {
        format!("{}/{}", self.api_base, request.path())
    }

    /// Issue the request and project the decoded `200` body with `parser`.
    ///
    /// Fetches a token first if none exists yet. Fails with
    /// `Error::Request` carrying the last status and body once `tries`
    /// retries are used up.
    #[instrument(skip_all, fields(endpoint = %request.endpoint, param = %request.param, tries = request.tries))]
    pub async fn request<T>(
        &self,
        request: &ResourceRequest,
        parser: impl FnOnce(Value) -> T,
    ) -> Result<T> {
        let url = self.url_for(request);
        let mut remaining = request.tries;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let token = self.tokens.ensure().await?;
            debug!(attempt, url = %url, query = ?request.query, "sending request");

            let sent = self
                .http
                .get(&url)
                .bearer_auth(token.expose())
                .query(&request.query)
                .send()
                .await;

            match sent {
                Ok(response) if response.status() == StatusCode::OK => {
                    record_response(200);
                    let body = response
                        .json::<Value>()
                        .await
                        .map_err(|e| Error::Decode(e.to_string()))?;
                    return Ok(parser(body));
                }
                Ok(response) => {
                    let status = response.status();
                    record_response(status.as_u16());
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| String::from("<no body>"));

                    if remaining == 0 {
                        warn!(attempt, status = status.as_u16(), "retries exhausted");
                        return Err(Error::Request {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    remaining -= 1;

                    if status == StatusCode::FORBIDDEN {
                        warn!(attempt, remaining, "access token rejected, refreshing");
                        record_retry("forbidden");
                        self.tokens.refresh(&token).await?;
                        record_refresh();
                    } else {
                        warn!(attempt, remaining, status = status.as_u16(), "request failed, retrying");
                        record_retry("status");
                    }
                }
                Err(e) => {
                    if remaining == 0 {
                        warn!(attempt, error = %e, "retries exhausted");
                        return Err(Error::Transport(e.to_string()));
                    }
                    remaining -= 1;
                    warn!(attempt, remaining, error = %e, "request failed, retrying");
                    record_retry("transport");
                }
            }

            if !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }
}
