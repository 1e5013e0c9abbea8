//! One-shot local redirect listener
//!
//! Spotify redirects the browser to `http://localhost:8000/callback?code=...`
//! after consent. The listener accepts exactly one connection on the bound
//! socket, whatever its path, pulls the `code` query parameter out of the
//! request line, answers with a page that closes the tab and releases the
//! socket. The captured code travels back through a oneshot channel.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::authorize::AuthorizationCode;
use crate::constants::CLOSE_TAB_HTML;
use crate::error::{Error, Result};

/// Upper bound on the request head we are willing to buffer.
const MAX_REQUEST_HEAD: usize = 16 * 1024;

/// A bound but not yet accepting callback listener.
pub struct CallbackListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl CallbackListener {
    /// Bind the listening socket.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Io(format!("binding callback listener on {addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::Io(format!("reading callback listener address: {e}")))?;
        debug!(%local_addr, "callback listener bound");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept exactly one connection and return the code it carried.
    ///
    /// The listening socket is dropped as soon as the connection is
    /// accepted, so a second request is refused by the OS.
    pub async fn accept_once(self) -> Result<AuthorizationCode> {
        let (mut stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| Error::Io(format!("accepting callback connection: {e}")))?;
        drop(self.listener);
        debug!(%peer, "callback connection accepted");

        let head = read_request_head(&mut stream).await?;
        let outcome = head
            .lines()
            .next()
            .ok_or_else(|| Error::AuthFailed("empty callback request".into()))
            .and_then(code_from_request_line);

        // The tab is closed whether or not a code arrived
        if let Err(e) = write_close_page(&mut stream).await {
            warn!(error = %e, "failed to answer callback request");
        }

        match &outcome {
            Ok(_) => info!("authorization code received"),
            Err(e) => warn!(error = %e, "callback did not carry an authorization code"),
        }
        outcome
    }

    /// Run `accept_once` on a background task.
    ///
    /// The returned handle is the single-value channel the authorizing
    /// caller waits on.
    pub fn spawn(self) -> CallbackHandle {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let _ = tx.send(self.accept_once().await);
        });
        CallbackHandle { rx, task }
    }
}

/// Pending result of a spawned callback listener.
///
/// Dropping the handle aborts the listener task, which releases the socket.
pub struct CallbackHandle {
    rx: oneshot::Receiver<Result<AuthorizationCode>>,
    task: JoinHandle<()>,
}

impl CallbackHandle {
    /// Wait for the redirect. `None` waits forever.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<AuthorizationCode> {
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.rx).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(Error::AuthFailed(format!(
                        "timed out after {limit:?} waiting for the authorization redirect"
                    )));
                }
            },
            None => (&mut self.rx).await,
        };
        received.map_err(|_| Error::AuthFailed("callback listener stopped unexpectedly".into()))?
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read until the end of the HTTP request head (or EOF).
async fn read_request_head(stream: &mut TcpStream) -> Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| Error::Io(format!("reading callback request: {e}")))?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn write_close_page(stream: &mut TcpStream) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        CLOSE_TAB_HTML.len(),
        CLOSE_TAB_HTML,
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Extract the `code` query parameter from an HTTP request line.
///
/// `GET /callback?code=abc&state=x HTTP/1.1` yields `abc`. The path is not
/// checked. A redirect carrying `error=...` (consent denied) is reported
/// with that reason.
pub(crate) fn code_from_request_line(line: &str) -> Result<AuthorizationCode> {
    let target = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::AuthFailed(format!("malformed callback request line: {line}")))?;

    let url = if target.starts_with('/') {
        Url::parse(&format!("http://localhost{target}"))
    } else {
        Url::parse(target)
    }
    .map_err(|e| Error::AuthFailed(format!("unparseable callback target {target}: {e}")))?;

    let mut code = None;
    let mut denied = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "error" => denied = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, denied) {
        (Some(code), _) => Ok(AuthorizationCode::new(code)),
        (None, Some(reason)) => Err(Error::AuthFailed(format!(
            "authorization server returned error: {reason}"
        ))),
        (None, None) => Err(Error::AuthFailed(
            "redirect did not include a code parameter".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn send_raw(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn extracts_code_from_callback_path() {
        let code = code_from_request_line("GET /callback?code=AQD123&state=xyz HTTP/1.1").unwrap();
        assert_eq!(code.as_str(), "AQD123");
    }

    #[test]
    fn accepts_any_path() {
        let code = code_from_request_line("GET /somewhere/else?code=abc HTTP/1.1").unwrap();
        assert_eq!(code.as_str(), "abc");
    }

    #[test]
    fn decodes_percent_encoded_code() {
        let code = code_from_request_line("GET /callback?code=a%2Fb%3D HTTP/1.1").unwrap();
        assert_eq!(code.as_str(), "a/b=");
    }

    #[test]
    fn missing_code_is_auth_failed() {
        let err = code_from_request_line("GET /callback HTTP/1.1").unwrap_err();
        assert!(matches!(err, Error::AuthFailed(_)), "got: {err:?}");
    }

    #[test]
    fn empty_code_is_auth_failed() {
        let err = code_from_request_line("GET /callback?code= HTTP/1.1").unwrap_err();
        assert!(matches!(err, Error::AuthFailed(_)), "got: {err:?}");
    }

    #[test]
    fn denied_consent_reports_reason() {
        let err = code_from_request_line("GET /callback?error=access_denied HTTP/1.1").unwrap_err();
        assert!(err.to_string().contains("access_denied"), "got: {err}");
    }

    #[test]
    fn malformed_request_line_is_auth_failed() {
        let err = code_from_request_line("garbage").unwrap_err();
        assert!(matches!(err, Error::AuthFailed(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn accept_once_returns_code_and_closes_tab() {
        let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr();
        let handle = listener.spawn();

        let response = send_raw(
            addr,
            "GET /callback?code=the-code HTTP/1.1\r\nHost: localhost\r\n\r\n",
        )
        .await;

        let code = handle.wait(None).await.unwrap();
        assert_eq!(code.as_str(), "the-code");
        assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
        assert!(response.contains("Content-Type: text/html"));
        assert!(response.ends_with(CLOSE_TAB_HTML));
    }

    #[tokio::test]
    async fn request_without_code_still_gets_close_page() {
        let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr();
        let handle = listener.spawn();

        let response = send_raw(addr, "GET /favicon.ico HTTP/1.1\r\n\r\n").await;

        let err = handle.wait(None).await.unwrap_err();
        assert!(matches!(err, Error::AuthFailed(_)), "got: {err:?}");
        assert!(response.ends_with(CLOSE_TAB_HTML));
    }

    #[tokio::test]
    async fn socket_is_released_after_one_request() {
        let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr();
        let handle = listener.spawn();

        send_raw(addr, "GET /callback?code=first HTTP/1.1\r\n\r\n").await;
        handle.wait(None).await.unwrap();

        // Nothing is listening any more, so the port can be bound again
        let rebound = TcpListener::bind(addr).await;
        assert!(rebound.is_ok(), "callback socket must be released");
    }

    #[tokio::test]
    async fn wait_times_out_and_releases_socket() {
        let listener = CallbackListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr();
        let handle = listener.spawn();

        let err = handle
            .wait(Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 50ms"), "got: {err}");

        // Abort is asynchronous; give the runtime a moment to drop the task
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(TcpListener::bind(addr).await.is_ok());
    }
}
