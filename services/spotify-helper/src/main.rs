//! Spotify helper
//!
//! Command-line client for a user's Spotify library:
//! 1. Authorizes through the browser on first use
//! 2. Runs a chain of library commands against one result store
//! 3. Prints results as JSON on stdout
//!
//! Logs go to stderr as JSON so stdout stays machine-readable.

mod command;
mod config;
mod error;
mod library;
mod session;
mod store;
#[cfg(test)]
mod test_support;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use spotify_auth::{BrowserFlow, Credentials, TokenManager};
use spotify_api::SpotifyClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::parse_args;
use crate::config::Config;
use crate::error::Error;
use crate::library::Library;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr, LOG_LEVEL / RUST_LOG filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    // clap renders help, version and usage errors and picks the exit code
    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(Error::Cli(e)) => e.exit(),
        Err(e) => return Err(anyhow::Error::new(e).context("invalid arguments")),
    };

    let (config_path, explicit) = Config::resolve_path(invocation.config.as_deref());
    let config = if explicit || config_path.exists() {
        info!(path = %config_path.display(), "loading configuration");
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        info!("no config file, using environment");
        Config::from_env().context("failed to load config from environment")?
    };

    info!(
        api_base = %config.spotify.api_base,
        limit = config.paging.limit,
        max_pages = config.paging.max_pages,
        tries = config.paging.tries,
        commands = invocation.commands.len(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(config.spotify.request_timeout())
        .build()
        .context("failed to build HTTP client")?;

    let client_secret = config
        .spotify
        .client_secret
        .clone()
        .context("client secret missing")?;
    let flow = BrowserFlow::new(config.spotify.client_id.clone())
        .with_timeout(config.spotify.callback_timeout());
    let tokens = TokenManager::new(
        http.clone(),
        Credentials::new(config.spotify.client_id.clone(), client_secret),
        flow,
    );

    let client = SpotifyClient::new(http, Arc::new(tokens))
        .with_api_base(config.spotify.api_base.clone())
        .with_retry_delay(config.spotify.retry_delay());

    let library = Library::new(&client, config.paging.page_options(), config.paging.tries);
    let mut session = Session::new(library);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    session
        .run(&invocation.commands, &mut out)
        .await
        .context("command failed")?;
    out.flush().context("failed to flush stdout")?;

    info!("done");
    Ok(())
}
