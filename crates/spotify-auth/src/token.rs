//! Authorization code exchange
//!
//! POSTs the captured code to the Spotify token endpoint. The client
//! authenticates with HTTP Basic (`client_id:client_secret`), so unlike a
//! PKCE public client no verifier is sent.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::authorize::{AuthorizationCode, Credentials};
use crate::constants::REDIRECT_URI;
use crate::error::{Error, Result};

/// Successful token endpoint response.
///
/// Spotify also returns `expires_in` and a `refresh_token`. Neither is
/// used: a token is replaced only after the API rejects it.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// `Authorization` header value for client authentication.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{client_id}:{client_secret}"))
    )
}

/// Exchange an authorization code for an access token.
///
/// The code is consumed. On a non-2xx answer the response body is kept in
/// `Error::TokenError` for diagnostics.
pub async fn exchange_code(
    client: &reqwest::Client,
    token_endpoint: &str,
    credentials: &Credentials,
    code: AuthorizationCode,
) -> Result<Secret<String>> {
    debug!(endpoint = token_endpoint, "exchanging authorization code");

    let response = client
        .post(token_endpoint)
        .header(
            reqwest::header::AUTHORIZATION,
            basic_auth_header(&credentials.client_id, credentials.client_secret.expose()),
        )
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::TokenError {
            status: status.as_u16(),
            body,
        });
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::InvalidTokenResponse(e.to_string()))?;
    debug!(
        token_type = token.token_type.as_deref().unwrap_or("unknown"),
        scope = token.scope.as_deref().unwrap_or(""),
        "token exchange succeeded"
    );
    Ok(Secret::new(token.access_token))
}
