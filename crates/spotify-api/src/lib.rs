//! Authenticated Spotify Web API access
//!
//! `SpotifyClient` issues bearer-authenticated GETs with a bounded retry
//! budget and pages through list endpoints lazily:
//!
//! - `200` decodes the body and hands it to the caller's parser
//! - `403` means the token was rejected: refresh it, then retry
//! - any other status (or a transport failure) is retried as-is
//! - once the budget is spent the last status and body are returned as
//!   `Error::Request`
//!
//! `SpotifyClient::paginate` builds on `request` and returns a pull-based
//! stream; a page is only fetched once the consumer has drained the
//! previous one.

pub mod client;
pub mod error;
pub mod metrics;
pub mod paginate;
pub mod parse;

#[cfg(test)]
mod test_support;

pub use client::{API_BASE, DEFAULT_TRIES, ResourceRequest, SpotifyClient};
pub use error::{Error, Result};
pub use paginate::PageOptions;
