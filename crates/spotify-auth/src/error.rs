//! Error types for Spotify authorization

/// Errors from the authorization flow and code exchange.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("authorization failed: {0}")]
    AuthFailed(String),

    #[error("token exchange returned {status}: {body}")]
    TokenError { status: u16, body: String },

    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_keeps_body_for_diagnostics() {
        let err = Error::TokenError {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"), "got: {msg}");
        assert!(msg.contains("invalid_grant"), "got: {msg}");
    }
}
