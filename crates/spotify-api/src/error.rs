//! Error types for API requests

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] spotify_auth::Error),

    #[error("request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
