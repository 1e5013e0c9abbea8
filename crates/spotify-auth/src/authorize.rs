//! Interactive consent step of the authorization-code flow
//!
//! `BrowserFlow` binds the callback listener, sends the user's browser to
//! the consent page and waits for the single redirect that carries the
//! authorization code.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use common::Secret;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::callback::CallbackListener;
use crate::constants::{AUTHORIZE_ENDPOINT, CALLBACK_BIND_ADDR, REDIRECT_URI, SCOPES};
use crate::error::{Error, Result};
use crate::manager::CodeSource;

/// Client application credentials, fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret<String>>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Authorization code captured from the redirect.
///
/// Not `Clone`: a code is exchanged once and then gone.
#[derive(PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorizationCode([REDACTED])")
    }
}

/// Build the consent page URL for the given client.
pub fn build_authorization_url(client_id: &str) -> Result<Url> {
    Url::parse_with_params(
        AUTHORIZE_ENDPOINT,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", REDIRECT_URI),
            ("scope", SCOPES),
        ],
    )
    .map_err(|e| Error::Url(format!("building authorization URL: {e}")))
}

type Launcher = Box<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Browser-driven code source.
///
/// Flow states: `Idle -> BrowserOpened -> ListenerWaiting -> CodeReceived | Failed`.
pub struct BrowserFlow {
    client_id: String,
    bind_addr: String,
    timeout: Option<Duration>,
    launcher: Launcher,
}

impl BrowserFlow {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            bind_addr: CALLBACK_BIND_ADDR.to_owned(),
            timeout: None,
            launcher: Box::new(|url: &str| open::that_detached(url)),
        }
    }

    /// Give up waiting for the redirect after `timeout`. Without this the
    /// flow blocks until the user completes consent.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Listen somewhere other than `localhost:8000`. The redirect URI sent
    /// to Spotify is unchanged.
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Replace the system browser launcher.
    pub fn with_launcher(
        mut self,
        launcher: impl Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Run one consent round and return the captured code.
    pub async fn run(&self) -> Result<AuthorizationCode> {
        let url = build_authorization_url(&self.client_id)?;
        debug!(url = %url, "authorizing");

        // Bind before the browser can possibly redirect
        let listener = CallbackListener::bind(&self.bind_addr).await?;
        let pending = listener.spawn();

        info!("opening browser for Spotify authorization");
        if let Err(e) = (self.launcher)(url.as_str()) {
            warn!(error = %e, url = %url, "could not open browser, open the URL manually");
        }
        debug!(state = "ListenerWaiting", "waiting for authorization redirect");

        pending.wait(self.timeout).await
    }
}

impl CodeSource for BrowserFlow {
    fn authorize(&self) -> Pin<Box<dyn Future<Output = Result<AuthorizationCode>> + Send + '_>> {
        Box::pin(self.run())
    }
}
