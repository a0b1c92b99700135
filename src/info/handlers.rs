//! `/info` handler.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, Uri},
    response::{IntoResponse, Json},
};
use serde_json::{Map, Value};

use crate::http::server::AppState;

const MAX_INFO_BYTES: usize = 1024 * 1024;

/// Capability document: upstream `/info` merged with local registrations.
pub async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut doc = match fetch_upstream_info(&state).await {
        Some(doc) => doc,
        None => Map::new(),
    };
    state.capabilities.merge_into(&mut doc);
    Json(Value::Object(doc))
}

async fn fetch_upstream_info(state: &AppState) -> Option<Map<String, Value>> {
    let uri: Uri = format!("http://{}/info", state.upstream).parse().ok()?;
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .ok()?;

    let response = match state.client.request(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Upstream /info unavailable");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "Upstream /info returned non-success");
        return None;
    }

    let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_INFO_BYTES)
        .await
        .ok()?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(doc)) => Some(doc),
        _ => {
            tracing::debug!("Upstream /info is not a JSON object");
            None
        }
    }
}
