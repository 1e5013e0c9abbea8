//! Mock Spotify API for helper tests

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use serde_json::Value;
use spotify_api::SpotifyClient;
use spotify_auth::{AuthorizationCode, CodeSource, Credentials, TokenManager};
use tokio::net::TcpListener;

type Responder = Arc<dyn Fn(&str, &HashMap<String, String>) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    hits: Arc<AtomicUsize>,
    respond: Responder,
}

pub struct MockSpotify {
    pub base: String,
    hits: Arc<AtomicUsize>,
}

impl MockSpotify {
    /// Answer every request with `200` and the body `respond` builds from
    /// the request path and query.
    pub async fn start(
        respond: impl Fn(&str, &HashMap<String, String>) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::serve(Arc::new(
            move |path: &str, query: &HashMap<String, String>| (StatusCode::OK, respond(path, query)),
        ))
        .await
    }

    /// Answer every request with `status`.
    pub async fn failing(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        Self::serve(Arc::new(move |_: &str, _: &HashMap<String, String>| {
            (status, Value::String("failure".into()))
        }))
        .await
    }

    async fn serve(respond: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = MockState {
            hits: Arc::new(AtomicUsize::new(0)),
            respond,
        };
        let hits = state.hits.clone();

        let app = axum::Router::new()
            .fallback(
                |State(state): State<MockState>,
                 uri: Uri,
                 Query(query): Query<HashMap<String, String>>| async move {
                    state.hits.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = (state.respond)(uri.path(), &query);
                    (status, [("content-type", "application/json")], body.to_string())
                },
            )
            .with_state(state);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            base: format!("http://{addr}/v1"),
            hits,
        }
    }

    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

struct NoBrowser;

impl CodeSource for NoBrowser {
    fn authorize(
        &self,
    ) -> Pin<Box<dyn Future<Output = spotify_auth::Result<AuthorizationCode>> + Send + '_>> {
        Box::pin(async { Err(spotify_auth::Error::AuthFailed("no browser in tests".into())) })
    }
}

/// Client against `mock` holding a pre-seeded token.
pub fn spotify_client(mock: &MockSpotify) -> SpotifyClient {
    let tokens = TokenManager::new(
        reqwest::Client::new(),
        Credentials::new("abc", "def"),
        NoBrowser,
    )
    .with_token("seeded");
    SpotifyClient::new(reqwest::Client::new(), Arc::new(tokens)).with_api_base(&mock.base)
}
