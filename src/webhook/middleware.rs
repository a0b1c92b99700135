//! The webhook stage of the request pipeline.
//!
//! Wraps the next handler: inbound headers are rewritten before it runs,
//! notifications and reflection happen after it returns. Runs inside the
//! sysmeta gatekeeper, so the sysmeta it sees on the way in is its own and the
//! sysmeta it reflects on the way out is removed afterwards.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::config_writer::{self, ConfigChange};
use super::dispatcher::{Dispatcher, ObjectEvent};
use super::path::StoragePath;
use super::reflector;
use crate::config::WebhookSettings;
use crate::http::request::RequestIdExt;

/// State shared by every invocation of the webhook stage.
#[derive(Clone, Debug)]
pub struct WebhookState {
    pub dispatcher: Dispatcher,
    pub settings: Arc<WebhookSettings>,
}

impl WebhookState {
    pub fn new(dispatcher: Dispatcher, settings: WebhookSettings) -> Self {
        Self {
            dispatcher,
            settings: Arc::new(settings),
        }
    }
}

pub async fn webhook_middleware(
    State(state): State<WebhookState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // 1. Classify and rewrite webhook headers
    let method = req.method().clone();
    let path = StoragePath::parse(req.uri().path());
    let container = path.as_ref().map(StoragePath::container_name);
    let change = config_writer::apply(&method, req.headers_mut(), container.as_deref());
    if change != ConfigChange::default() {
        tracing::debug!(
            request_id = %req.request_id().map(|id| id.as_str()).unwrap_or("unknown"),
            path = %req.uri().path(),
            set = change.set,
            rejected = change.rejected,
            removed = change.removed,
            "Webhook configuration request"
        );
    }

    // 2. Capture what a notification would need before the request is consumed
    let event = path
        .filter(StoragePath::is_object)
        .map(|path| ObjectEvent::capture(&method, req.uri(), req.headers(), path, &state.settings));

    let mut response = next.run(req).await;

    // 3. Notify on successful non-GET object requests
    if let Some(event) = event {
        if Dispatcher::should_dispatch(Some(&event.path), &method, response.status()) {
            state.dispatcher.dispatch(event).await;
        }
    }

    // 4. Reflect the configured URL; the gatekeeper hides the raw sysmeta
    reflector::reflect(response.headers_mut());

    response
}
