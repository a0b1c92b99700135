//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use swift_webhook::config::{DispatchMode, ProxyConfig};
use swift_webhook::webhook::{StoragePath, CONTAINER_SYSMETA_PREFIX};
use swift_webhook::{HttpServer, Shutdown};

/// Request header that makes the mock storage answer with a given status.
pub const X_MOCK_STATUS: &str = "x-mock-status";

/// A request as the storage service received it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

/// In-memory Swift stand-in. Container sysmeta follows the storage
/// service's rules: an empty value deletes the key.
#[derive(Clone, Default)]
pub struct MockStorage {
    containers: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockStorage {
    /// Sysmeta persisted for `/version/account/container`.
    pub fn sysmeta(&self, container_path: &str) -> HashMap<String, String> {
        self.containers
            .lock()
            .unwrap()
            .get(container_path)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed sysmeta directly, bypassing the proxy.
    pub fn seed(&self, container_path: &str, pairs: &[(&str, &str)]) {
        let mut containers = self.containers.lock().unwrap();
        let sysmeta = containers.entry(container_path.to_string()).or_default();
        for (k, v) in pairs {
            sysmeta.insert(k.to_string(), v.to_string());
        }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last_seen(&self, method: Method) -> Option<SeenRequest> {
        self.seen().into_iter().rev().find(|r| r.method == method)
    }
}

/// Start the mock storage service on an ephemeral port.
pub async fn start_mock_storage() -> (SocketAddr, MockStorage) {
    let storage = MockStorage::default();
    let app = Router::new()
        .route("/info", get(storage_info))
        .route("/{*path}", any(storage_handler))
        .with_state(storage.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, storage)
}

async fn storage_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "swift": { "version": "2.30.0" } }))
}

async fn storage_handler(State(storage): State<MockStorage>, req: Request<Body>) -> Response {
    let method = req.method().clone();
    let headers = req.headers().clone();
    storage.seen.lock().unwrap().push(SeenRequest {
        method: method.clone(),
        path: req.uri().path().to_string(),
        headers: headers.clone(),
    });

    let Some(path) = StoragePath::parse(req.uri().path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(status) = headers
        .get(X_MOCK_STATUS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u16>().ok())
        .and_then(|v| StatusCode::from_u16(v).ok())
    {
        return status.into_response();
    }

    let key = path.container_path();
    let mut containers = storage.containers.lock().unwrap();

    if method == Method::PUT || method == Method::POST {
        let sysmeta = containers.entry(key).or_default();
        for (name, value) in headers.iter() {
            if let Some(field) = name.as_str().strip_prefix(CONTAINER_SYSMETA_PREFIX) {
                let value = value.to_str().unwrap_or_default();
                if value.is_empty() {
                    sysmeta.remove(field);
                } else {
                    sysmeta.insert(field.to_string(), value.to_string());
                }
            }
        }
        return if method == Method::PUT {
            StatusCode::CREATED.into_response()
        } else {
            StatusCode::NO_CONTENT.into_response()
        };
    }

    if path.is_object() {
        return match method {
            Method::DELETE => StatusCode::NO_CONTENT.into_response(),
            _ => (StatusCode::OK, "object-data").into_response(),
        };
    }

    match containers.get(&key) {
        Some(sysmeta) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            for (field, value) in sysmeta {
                let name = format!("{CONTAINER_SYSMETA_PREFIX}{field}");
                response.headers_mut().insert(
                    axum::http::HeaderName::try_from(name).unwrap(),
                    HeaderValue::from_str(value).unwrap(),
                );
            }
            response
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A notification as the webhook target received it.
#[derive(Debug, Clone)]
pub struct CapturedHook {
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct ReceiverState {
    tx: mpsc::UnboundedSender<CapturedHook>,
    status: StatusCode,
    delay: Duration,
}

/// Start a webhook target on an ephemeral port. Every POST to `/hook` is
/// captured, then answered with `status` after `delay`.
pub async fn start_webhook_receiver(
    status: u16,
    delay: Duration,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedHook>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = ReceiverState {
        tx,
        status: StatusCode::from_u16(status).unwrap(),
        delay,
    };
    let app = Router::new()
        .route("/hook", post(receive_hook))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, rx)
}

async fn receive_hook(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    let _ = state.tx.send(CapturedHook { headers, body });
    tokio::time::sleep(state.delay).await;
    (state.status, "hook received").into_response()
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the proxy in front of `upstream`. Dispatch is inline unless `tweak`
/// says otherwise, so notifications have landed by the time a response arrives.
pub async fn start_proxy(
    upstream: SocketAddr,
    tweak: impl FnOnce(&mut ProxyConfig),
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ProxyConfig::default();
    config.listener.bind_address = addr.to_string();
    config.upstream.address = upstream.to_string();
    config.webhook.dispatch = DispatchMode::Inline;
    config.observability.metrics_enabled = false;
    tweak(&mut config);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
