//! Shared types for the Spotify helper workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
