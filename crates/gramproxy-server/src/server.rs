//! Axum HTTP server for the grammar-injecting reverse proxy.
//!
//! There is no routing: every method and path goes through the same
//! intercept-then-forward pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::response::Response;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use gramproxy_core::{
    BodyRewriter, FileGrammarProvider, GrammarProvider, InterceptEventSink, ProxyConfig,
};

use crate::error::ProxyError;
use crate::forward::forward;
use crate::intercept::intercept;
use crate::upstream::UpstreamTarget;

/// Shared application state for the proxy server.
///
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// HTTP client for forwarding requests upstream.
    client: Client,
    /// Injects grammars into chat completion bodies.
    rewriter: BodyRewriter,
    /// Receives interception events.
    events: Arc<dyn InterceptEventSink>,
    /// Startup configuration.
    config: Arc<ProxyConfig>,
}

impl AppState {
    /// Build state with an explicit grammar provider.
    pub fn new(
        config: Arc<ProxyConfig>,
        grammar: Arc<dyn GrammarProvider>,
        events: Arc<dyn InterceptEventSink>,
    ) -> anyhow::Result<Self> {
        let client = build_client(&config)?;
        let rewriter = BodyRewriter::new(grammar, Arc::clone(&events));
        Ok(Self {
            client,
            rewriter,
            events,
            config,
        })
    }

    /// Build state that reads the grammar from `config.grammar_path`.
    pub fn from_config(
        config: Arc<ProxyConfig>,
        events: Arc<dyn InterceptEventSink>,
    ) -> anyhow::Result<Self> {
        let grammar = Arc::new(FileGrammarProvider::new(
            config.grammar_path.clone(),
            Arc::clone(&events),
        ));
        Self::new(config, grammar, events)
    }
}

/// Create the upstream HTTP client.
///
/// Redirects are relayed to the caller rather than followed.
pub fn build_client(config: &ProxyConfig) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .pool_max_idle_per_host(10)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(config.connect_timeout);
    if let Some(timeout) = config.upstream_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Create the proxy router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(proxy_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the proxy with a pre-bound listener until `cancel` fires.
///
/// # Returns
///
/// Returns `Ok(())` on clean shutdown, or an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(
        upstream = %state.config.upstream_base_url,
        grammar = %state.config.grammar_path.display(),
        "Proxy listening on {addr}"
    );

    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(cancel.cancelled_owned())
    .await?;

    info!("Proxy server shut down");
    Ok(())
}

/// Intercept, then forward to the upstream.
async fn proxy_request(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Result<Response, ProxyError> {
    let target = UpstreamTarget::parse(&state.config.upstream_base_url)?;

    let request = intercept(
        request,
        &state.rewriter,
        state.events.as_ref(),
        state.config.max_body_bytes,
    )
    .await?;

    let client_addr = connect_info.map(|ConnectInfo(addr)| addr);

    forward(&state.client, &target, request, client_addr).await
}
