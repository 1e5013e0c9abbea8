//! Helper command errors
//!
//! Command-line errors are raised before any network traffic. API errors
//! from the request engine pass through unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("no saved result named {0}")]
    UnknownSlot(String),

    #[error(transparent)]
    Api(#[from] spotify_api::Error),

    #[error("writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("serializing output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
