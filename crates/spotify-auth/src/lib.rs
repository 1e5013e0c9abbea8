//! Spotify OAuth authorization-code flow
//!
//! Drives the interactive consent step and keeps the current bearer token:
//!
//! 1. `authorize::BrowserFlow` opens the consent page and waits on a
//!    one-shot `callback::CallbackListener` for the redirect
//! 2. `token::exchange_code()` trades the captured code for an access token
//!    using HTTP Basic client authentication
//! 3. `manager::TokenManager` owns the token slot and replaces it whenever
//!    a caller reports the current token was rejected
//!
//! Tokens live only in memory. There is no expiry tracking: a token is
//! trusted until the API answers 403.

pub mod authorize;
pub mod callback;
pub mod constants;
pub mod error;
pub mod manager;
pub mod token;

pub use authorize::{AuthorizationCode, BrowserFlow, Credentials, build_authorization_url};
pub use callback::{CallbackHandle, CallbackListener};
pub use constants::*;
pub use error::{Error, Result};
pub use manager::{CodeSource, TokenManager};
pub use token::{TokenResponse, basic_auth_header, exchange_code};
