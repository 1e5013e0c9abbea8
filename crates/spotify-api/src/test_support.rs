//! Mock Spotify API and token endpoint for request engine tests

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use spotify_auth::{AuthorizationCode, CodeSource, Credentials, TokenManager};
use tokio::net::TcpListener;

use crate::client::SpotifyClient;

/// One request as seen by the mock API.
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub query: HashMap<String, String>,
    pub auth: Option<String>,
}

type Responder = Arc<dyn Fn(usize, &Hit) -> (StatusCode, String) + Send + Sync>;

#[derive(Clone)]
struct ApiState {
    hits: Arc<Mutex<Vec<Hit>>>,
    respond: Responder,
}

pub struct MockApi {
    pub base: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl MockApi {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

/// Start a mock API under `/v1`. `respond` gets the zero-based request
/// index and the recorded request.
pub async fn start_api(
    respond: impl Fn(usize, &Hit) -> (StatusCode, String) + Send + Sync + 'static,
) -> MockApi {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ApiState {
        hits: Arc::new(Mutex::new(Vec::new())),
        respond: Arc::new(respond),
    };
    let hits = state.hits.clone();

    let app = axum::Router::new()
        .fallback(
            |State(state): State<ApiState>,
             uri: Uri,
             headers: HeaderMap,
             Query(query): Query<HashMap<String, String>>| async move {
                let hit = Hit {
                    path: uri.path().to_owned(),
                    query,
                    auth: headers
                        .get("authorization")
                        .map(|v| v.to_str().unwrap_or("").to_owned()),
                };
                let index = {
                    let mut hits = state.hits.lock().unwrap();
                    hits.push(hit.clone());
                    hits.len() - 1
                };
                let (status, body) = (state.respond)(index, &hit);
                (status, [("content-type", "application/json")], body)
            },
        )
        .with_state(state);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    MockApi {
        base: format!("http://{addr}/v1"),
        hits,
    }
}

/// Token endpoint issuing `T1`, `T2`, ... Returns the endpoint URL and the
/// exchange counter.
pub async fn start_token_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let issued = Arc::new(AtomicUsize::new(0));
    let counter = issued.clone();

    let app = axum::Router::new().route(
        "/api/token",
        axum::routing::post(move || {
            let issued = issued.clone();
            async move {
                let n = issued.fetch_add(1, Ordering::SeqCst) + 1;
                (
                    [("content-type", "application/json")],
                    format!(r#"{{"access_token":"T{n}"}}"#),
                )
            }
        }),
    );
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("http://{addr}/api/token"), counter)
}

/// Token endpoint that rejects every exchange with `400`.
pub async fn start_failing_token_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().route(
        "/api/token",
        axum::routing::post(|| async {
            (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#)
        }),
    );
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/api/token")
}

/// Code source that never touches a browser.
pub struct FixedCode;

impl CodeSource for FixedCode {
    fn authorize(
        &self,
    ) -> Pin<Box<dyn Future<Output = spotify_auth::Result<AuthorizationCode>> + Send + '_>> {
        Box::pin(async { Ok(AuthorizationCode::new("test-code")) })
    }
}

/// Client wired to the mocks, optionally starting with `seed` as token.
pub fn client(api: &MockApi, token_endpoint: &str, seed: Option<&str>) -> SpotifyClient {
    let mut tokens = TokenManager::new(
        reqwest::Client::new(),
        Credentials::new("abc", "def"),
        FixedCode,
    )
    .with_token_endpoint(token_endpoint);
    if let Some(seed) = seed {
        tokens = tokens.with_token(seed);
    }
    SpotifyClient::new(reqwest::Client::new(), Arc::new(tokens)).with_api_base(&api.base)
}

/// `{"items": [...]}` body with `count` items numbered from `first`.
pub fn items_body(first: usize, count: usize) -> String {
    let items: Vec<serde_json::Value> = (first..first + count)
        .map(|i| serde_json::json!({ "id": format!("item-{i}") }))
        .collect();
    serde_json::json!({ "items": items }).to_string()
}
