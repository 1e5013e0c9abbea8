//! Spotify OAuth constants
//!
//! The redirect URI must match the one registered for the client application
//! in the Spotify developer dashboard, so host, port and path are fixed.

/// Authorization endpoint the user's browser is sent to for consent
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

/// Token endpoint for authorization code exchange
pub const TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";

/// Redirect URI registered with the Spotify application
pub const REDIRECT_URI: &str = "http://localhost:8000/callback";

/// Address the one-shot callback listener binds (host:port of `REDIRECT_URI`)
pub const CALLBACK_BIND_ADDR: &str = "localhost:8000";

/// Scope needed to read the user's saved tracks
pub const SCOPES: &str = "user-library-read";

/// Page served to the browser after the redirect; it only closes the tab.
pub const CLOSE_TAB_HTML: &str = "<script>window.close()</script>";
