//! Container metadata lookup.
//!
//! The dispatcher needs the container's *current* sysmeta, after the write
//! that triggered it. The storage service owns that state; this module only
//! reads a snapshot of it.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::collections::HashMap;

use super::error::{WebhookError, WebhookResult};
use super::path::StoragePath;
use super::{CONTAINER_SYSMETA_PREFIX, WEBHOOK_AUTH_KEY, WEBHOOK_KEY, X_AUTH_TOKEN};

/// Snapshot of a container's system metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Sysmeta keyed by the lowercase name after `x-container-sysmeta-`.
    pub sysmeta: HashMap<String, String>,
}

impl ContainerInfo {
    /// Collect `x-container-sysmeta-*` headers. Empty values are tombstones
    /// and are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let sysmeta = headers
            .iter()
            .filter_map(|(name, value)| {
                let key = name.as_str().strip_prefix(CONTAINER_SYSMETA_PREFIX)?;
                let value = value.to_str().ok()?;
                (!value.is_empty()).then(|| (key.to_string(), value.to_string()))
            })
            .collect();
        Self { sysmeta }
    }

    /// Persisted callback URL, if one is configured.
    pub fn webhook(&self) -> Option<&str> {
        self.sysmeta.get(WEBHOOK_KEY).map(String::as_str)
    }

    /// Persisted callback credential.
    pub fn webhook_auth(&self) -> Option<&str> {
        self.sysmeta.get(WEBHOOK_AUTH_KEY).map(String::as_str)
    }
}

/// Source of container metadata.
#[async_trait]
pub trait ContainerInfoSource: Send + Sync {
    /// Fetch the container's sysmeta. `token` is the client's auth token,
    /// forwarded so the storage service authorizes the lookup as the client.
    async fn container_info(
        &self,
        path: &StoragePath,
        token: Option<&str>,
    ) -> WebhookResult<ContainerInfo>;
}

/// Reads container metadata with a `HEAD` against the upstream storage service.
#[derive(Clone)]
pub struct UpstreamContainerInfo {
    client: Client<HttpConnector, Body>,
    upstream: String,
}

impl UpstreamContainerInfo {
    pub fn new(client: Client<HttpConnector, Body>, upstream: impl Into<String>) -> Self {
        Self {
            client,
            upstream: upstream.into(),
        }
    }
}

#[async_trait]
impl ContainerInfoSource for UpstreamContainerInfo {
    async fn container_info(
        &self,
        path: &StoragePath,
        token: Option<&str>,
    ) -> WebhookResult<ContainerInfo> {
        let uri: Uri = format!("http://{}{}", self.upstream, path.container_path())
            .parse()
            .map_err(|e| WebhookError::ContainerInfo(format!("invalid container URI: {e}")))?;

        let mut builder = Request::builder().method(Method::HEAD).uri(uri);
        if let Some(token) = token {
            builder = builder.header(X_AUTH_TOKEN, token);
        }
        let request = builder
            .body(Body::empty())
            .map_err(|e| WebhookError::ContainerInfo(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| WebhookError::ContainerInfo(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::ContainerInfo(format!(
                "HEAD {} returned {}",
                path.container_path(),
                status
            )));
        }

        Ok(ContainerInfo::from_headers(response.headers()))
    }
}
