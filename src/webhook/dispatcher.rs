//! Webhook notification dispatch.
//!
//! # Responsibilities
//! - Decide whether a finished request should notify
//! - Resolve the container's webhook from its current sysmeta
//! - POST the notification with basic auth under a hard deadline
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (pooled connections, TLS verification on)
//! - Lookup and delivery share a single deadline; dropping the future at the
//!   deadline closes the connection to a silent peer
//! - At most one attempt per event; every failure ends in a log line

use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout_at;

use super::container_info::ContainerInfoSource;
use super::error::{WebhookError, WebhookResult};
use super::path::StoragePath;
use super::X_AUTH_TOKEN;
use crate::config::{DispatchMode, WebhookSettings};
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;

/// A successful write to an object, captured from the client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEvent {
    pub path: StoragePath,
    pub method: Method,
    /// `scheme://host/version/account` as the client addressed it.
    pub resource_url: String,
    /// The client's `x-auth-token`.
    pub token: Option<String>,
    pub request_id: Option<String>,
}

impl ObjectEvent {
    /// Capture the parts of a request the notification needs. Must run before
    /// the request is handed to the next handler.
    pub fn capture(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        path: StoragePath,
        settings: &WebhookSettings,
    ) -> Self {
        let resource_url = resource_url(
            headers,
            uri,
            &path,
            &settings.default_scheme,
            settings.public_url.as_deref(),
        );
        let request_id = header_string(headers, X_REQUEST_ID);
        let token = header_string(headers, X_AUTH_TOKEN);
        if token.is_none() && headers.contains_key(X_AUTH_TOKEN) {
            tracing::debug!(
                request_id = %request_id.as_deref().unwrap_or("unknown"),
                "x-auth-token is not visible ASCII; notification token will be null"
            );
        }
        Self {
            resource_url,
            method: method.clone(),
            token,
            request_id,
            path,
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Base URL of the account the request addressed.
///
/// `public_url` wins when configured. Otherwise the scheme comes from
/// `x-forwarded-proto`, then the URI, then `default_scheme`; the host from
/// the `Host` header, then the URI authority.
pub fn resource_url(
    headers: &HeaderMap,
    uri: &Uri,
    path: &StoragePath,
    default_scheme: &str,
    public_url: Option<&str>,
) -> String {
    if let Some(base) = public_url {
        return format!("{}{}", base.trim_end_matches('/'), path.account_root());
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| uri.scheme_str())
        .unwrap_or(default_scheme);

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    format!("{}://{}{}", scheme, host, path.account_root())
}

/// JSON body POSTed to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "swiftObj")]
    pub swift_obj: SwiftObject,
}

/// The object the notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwiftObject {
    pub url: String,
    pub token: Option<String>,
    pub container: String,
    pub object: String,
    pub method: String,
}

impl Notification {
    pub fn new(event: &ObjectEvent) -> Self {
        Self {
            swift_obj: SwiftObject {
                url: event.resource_url.clone(),
                token: event.token.clone(),
                container: event.path.container_name(),
                object: event.path.object_name().unwrap_or_default(),
                method: event.method.to_string(),
            },
        }
    }
}

/// `Authorization` value for a stored credential.
pub fn basic_auth(secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(secret))
}

/// Result of a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The target accepted the notification.
    Delivered { status: u16 },
    /// The container has no webhook.
    NotConfigured,
}

impl DispatchOutcome {
    fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered { .. } => "delivered",
            DispatchOutcome::NotConfigured => "not_configured",
        }
    }
}

/// Where a notification goes and how it authenticates.
struct Target {
    url: url::Url,
    authorization: String,
}

/// Sends webhook notifications for object events.
#[derive(Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
    container_info: Arc<dyn ContainerInfoSource>,
    deadline: Duration,
    mode: DispatchMode,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("deadline", &self.deadline)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Build a dispatcher with its own HTTP client.
    pub fn new(
        settings: &WebhookSettings,
        container_info: Arc<dyn ContainerInfoSource>,
    ) -> WebhookResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;

        tracing::info!(
            deadline_secs = settings.timeout_secs,
            mode = ?settings.dispatch,
            "Webhook dispatcher initialized"
        );

        Ok(Self::with_client(
            http,
            container_info,
            settings.timeout(),
            settings.dispatch,
        ))
    }

    pub fn with_client(
        http: reqwest::Client,
        container_info: Arc<dyn ContainerInfoSource>,
        deadline: Duration,
        mode: DispatchMode,
    ) -> Self {
        Self {
            http,
            container_info,
            deadline,
            mode,
        }
    }

    /// True for successful non-GET requests against an object.
    pub fn should_dispatch(path: Option<&StoragePath>, method: &Method, status: StatusCode) -> bool {
        path.is_some_and(StoragePath::is_object) && status.is_success() && *method != Method::GET
    }

    /// Run one attempt according to the configured mode. Never fails.
    pub async fn dispatch(&self, event: ObjectEvent) {
        match self.mode {
            DispatchMode::Inline => {
                let _ = self.attempt(&event).await;
            }
            DispatchMode::Background => {
                let dispatcher = self.clone();
                tokio::spawn(async move {
                    let _ = dispatcher.attempt(&event).await;
                });
            }
        }
    }

    /// Look up the container's webhook and deliver one notification.
    ///
    /// Everything, including the container lookup, shares one deadline.
    /// Failures are logged here; the returned result is informational.
    pub async fn attempt(&self, event: &ObjectEvent) -> WebhookResult<DispatchOutcome> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.deadline;
        let container = event.path.container_name();
        let request_id = event.request_id.as_deref().unwrap_or("unknown");

        let target = match timeout_at(deadline, self.resolve(event)).await {
            Ok(Ok(Some(target))) => target,
            Ok(Ok(None)) => {
                tracing::info!(
                    request_id = %request_id,
                    container = %container,
                    "Webhook not specified for container"
                );
                let outcome = DispatchOutcome::NotConfigured;
                metrics::record_dispatch(outcome.label(), started);
                return Ok(outcome);
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    request_id = %request_id,
                    container = %container,
                    error = %e,
                    "Unable to resolve webhook for container"
                );
                metrics::record_dispatch(e.kind(), started);
                return Err(e);
            }
            Err(_) => {
                let e = WebhookError::Timeout(self.deadline);
                tracing::error!(
                    request_id = %request_id,
                    container = %container,
                    error = %e,
                    "Container lookup exceeded webhook deadline"
                );
                metrics::record_dispatch(e.kind(), started);
                return Err(e);
            }
        };

        let result = match timeout_at(deadline, self.deliver(&target, event)).await {
            Ok(result) => result,
            Err(_) => Err(WebhookError::Timeout(self.deadline)),
        };

        match &result {
            Ok(outcome) => metrics::record_dispatch(outcome.label(), started),
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    webhook = %target.url,
                    error = %e,
                    "Failed POST to webhook"
                );
                metrics::record_dispatch(e.kind(), started);
            }
        }
        result
    }

    async fn resolve(&self, event: &ObjectEvent) -> WebhookResult<Option<Target>> {
        let info = self
            .container_info
            .container_info(&event.path, event.token.as_deref())
            .await?;

        let Some(webhook) = info.webhook() else {
            return Ok(None);
        };

        tracing::info!(
            container = %event.path.container_name(),
            webhook = %webhook,
            "Webhook found for container"
        );

        let secret = info
            .webhook_auth()
            .ok_or_else(|| WebhookError::MissingCredential {
                container: event.path.container_name(),
            })?;

        let url = url::Url::parse(webhook).map_err(|e| WebhookError::InvalidTarget {
            url: webhook.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WebhookError::InvalidTarget {
                url: webhook.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Some(Target {
            url,
            authorization: basic_auth(secret),
        }))
    }

    async fn deliver(&self, target: &Target, event: &ObjectEvent) -> WebhookResult<DispatchOutcome> {
        let notification = Notification::new(event);
        let body = serde_json::to_vec(&notification)?;

        tracing::debug!(
            request_id = event.request_id.as_deref().unwrap_or("unknown"),
            webhook = %target.url,
            object = %notification.swift_obj.object,
            method = %notification.swift_obj.method,
            "Posting webhook notification"
        );

        let response = self
            .http
            .post(target.url.clone())
            .header(header::AUTHORIZATION, target.authorization.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::info!(
            webhook = %target.url,
            status = status.as_u16(),
            response = %text,
            "Successfully called webhook"
        );

        Ok(DispatchOutcome::Delivered {
            status: status.as_u16(),
        })
    }
}
