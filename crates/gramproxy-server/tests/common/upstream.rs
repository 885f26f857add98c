//! A real upstream for integration tests: echoes back what it received.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the upstream saw for one request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// How long `/v1/slow` stalls before answering.
pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_secs(5);

/// Handle to a running echo upstream.
pub struct EchoUpstream {
    /// Base URL including the `/v1` prefix.
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl EchoUpstream {
    /// Number of requests that reached the upstream.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start an echo upstream on an ephemeral port.
///
/// `/v1/teapot` answers 418 with a plain-text body and `/v1/slow` waits
/// [`SLOW_RESPONSE_DELAY`] before echoing. Every other path answers 200
/// with an [`Echo`] JSON body and an `x-upstream: echo` header.
pub async fn spawn_echo_upstream() -> EchoUpstream {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .fallback(echo)
        .with_state(Arc::clone(&hits));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    EchoUpstream {
        base_url: format!("http://{addr}/v1"),
        hits,
    }
}

/// A base URL nothing is listening on.
pub fn unreachable_upstream() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/v1")
}

async fn echo(State(hits): State<Arc<AtomicUsize>>, request: Request) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let (parts, body) = request.into_parts();

    if parts.uri.path() == "/v1/teapot" {
        return (
            StatusCode::IM_A_TEAPOT,
            [("x-upstream", "echo")],
            "short and stout",
        )
            .into_response();
    }
    if parts.uri.path() == "/v1/slow" {
        tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
    }

    let body = to_bytes(body, usize::MAX).await.unwrap();
    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    let echo = Echo {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    ([("x-upstream", "echo")], Json(echo)).into_response()
}
