//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults. The client secret
//! comes from `SPOTIFY_CLIENT_SECRET` or `client_secret_file`, never from
//! the TOML itself, so the config file can be shared without leaking it.

use common::Secret;
use serde::Deserialize;
use spotify_api::{API_BASE, DEFAULT_TRIES, PageOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "spotify-helper.toml";

/// Spotify caps `limit` on its list endpoints at 50
const MAX_PAGE_LIMIT: u32 = 50;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

/// Client application and endpoint settings
#[derive(Debug, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to SPOTIFY_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Give up on the browser consent after this long. Unset waits forever.
    #[serde(default)]
    pub callback_timeout_secs: Option<u64>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub retry_delay_ms: u64,
}

/// Pagination defaults applied to every paginated command
#[derive(Debug, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_tries")]
    pub tries: u32,
}

fn default_api_base() -> String {
    API_BASE.to_owned()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_limit() -> u32 {
    PageOptions::default().limit
}

fn default_max_pages() -> u32 {
    PageOptions::default().max_pages
}

fn default_tries() -> u32 {
    DEFAULT_TRIES
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            client_secret_file: None,
            api_base: default_api_base(),
            callback_timeout_secs: None,
            request_timeout_secs: default_request_timeout(),
            retry_delay_ms: 0,
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_pages: default_max_pages(),
            tries: default_tries(),
        }
    }
}

impl PagingConfig {
    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            limit: self.limit,
            start: 0,
            max_pages: self.max_pages,
        }
    }
}

impl SpotifyConfig {
    pub fn callback_timeout(&self) -> Option<Duration> {
        self.callback_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents, |key| std::env::var(key).ok())
    }

    /// Configuration from environment variables and defaults only.
    pub fn from_env() -> common::Result<Self> {
        Self::from_toml("", |key| std::env::var(key).ok())
    }

    /// Parse `contents`, overlay values from `env` and validate.
    pub fn from_toml(contents: &str, env: impl Fn(&str) -> Option<String>) -> common::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        if let Some(id) = env("SPOTIFY_CLIENT_ID") {
            config.spotify.client_id = id;
        }

        // Resolve client secret: env var takes precedence over file
        if let Some(secret) = env("SPOTIFY_CLIENT_SECRET") {
            config.spotify.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.spotify.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.spotify.client_secret = Some(Secret::new(secret));
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.spotify.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "client_id is required (spotify.client_id or SPOTIFY_CLIENT_ID)".into(),
            ));
        }

        if self.spotify.client_secret.is_none() {
            return Err(common::Error::Config(
                "client secret is required (SPOTIFY_CLIENT_SECRET or spotify.client_secret_file)"
                    .into(),
            ));
        }

        if !self.spotify.api_base.starts_with("http://")
            && !self.spotify.api_base.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "api_base must start with http:// or https://, got: {}",
                self.spotify.api_base
            )));
        }

        if self.spotify.callback_timeout_secs == Some(0) {
            return Err(common::Error::Config(
                "callback_timeout_secs must be greater than 0 when set".into(),
            ));
        }

        if self.spotify.request_timeout_secs == 0 {
            return Err(common::Error::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.paging.limit == 0 || self.paging.limit > MAX_PAGE_LIMIT {
            return Err(common::Error::Config(format!(
                "paging.limit must be between 1 and {MAX_PAGE_LIMIT}, got: {}",
                self.paging.limit
            )));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    ///
    /// The flag is `true` when the path was asked for explicitly, in which
    /// case a missing file is an error.
    pub fn resolve_path(cli_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(p) = cli_path {
            return (PathBuf::from(p), true);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return (PathBuf::from(p), true);
        }
        (PathBuf::from(DEFAULT_CONFIG_FILE), false)
    }
}
