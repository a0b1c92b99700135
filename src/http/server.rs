//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, sysmeta gatekeeper, webhook stage, request timeout)
//! - Bind server to listener
//! - Forward requests to the upstream storage service
//! - Serve capability discovery (`/info`)

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, Uri,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::http::response::{bad_gateway, strip_hop_by_hop};
use crate::info::{self, Capabilities};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::security::headers::sysmeta_gatekeeper;
use crate::webhook::{
    webhook_middleware, Dispatcher, UpstreamContainerInfo, WebhookError, WebhookState,
    CAPABILITY_NAME,
};

/// Errors that prevent the server from being built.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream address '{address}': {reason}")]
    InvalidUpstream { address: String, reason: String },

    #[error("webhook dispatcher: {0}")]
    Webhook(#[from] WebhookError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
    pub capabilities: Arc<Capabilities>,
}

/// HTTP server for the webhook proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let upstream = Authority::from_str(&config.upstream.address).map_err(|e| {
            ServerError::InvalidUpstream {
                address: config.upstream.address.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut capabilities = Capabilities::new();
        let webhook = if config.webhook.enabled {
            capabilities.register(CAPABILITY_NAME);
            let container_info = Arc::new(UpstreamContainerInfo::new(
                client.clone(),
                upstream.to_string(),
            ));
            let dispatcher = Dispatcher::new(&config.webhook, container_info)?;
            Some(WebhookState::new(dispatcher, config.webhook.clone()))
        } else {
            tracing::warn!("Webhook stage disabled; proxying without notifications");
            None
        };

        let state = AppState {
            client,
            upstream,
            capabilities: Arc::new(capabilities),
        };

        let router = Self::build_router(&config, state, webhook);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request timeout sits inside the webhook stage so it bounds the
    /// upstream exchange only; a slow inline notification cannot turn a
    /// finished storage response into a timeout.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, webhook: Option<WebhookState>) -> Router {
        let timeout = TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs));

        let mut storage = Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .layer(timeout.clone());
        if let Some(webhook) = webhook {
            storage = storage.layer(middleware::from_fn_with_state(webhook, webhook_middleware));
        }
        if config.security.strip_sysmeta {
            storage = storage.layer(middleware::from_fn(sysmeta_gatekeeper));
        }

        let info = Router::new()
            .route("/info", get(info::info_handler))
            .layer(timeout);

        storage
            .merge(info)
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward a request to the upstream storage service unchanged.
async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .request_id()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string());
    let method = request.method().to_string();

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            metrics::record_request(&method, 502, start_time);
            return bad_gateway();
        }
    };
    strip_hop_by_hop(&mut parts.headers);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %parts.uri,
        "Forwarding request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(&method, status.as_u16(), start_time);

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            bad_gateway()
        }
    }
}
