//! Translates webhook requests into container system metadata.
//!
//! The storage service never sees `x-webhook` itself; it sees the two
//! `x-container-sysmeta-*` headers this module writes, and persists them on the
//! container. Both fields are always written together.

use axum::http::{HeaderMap, HeaderValue, Method};

use super::{SYSMETA_WEBHOOK, SYSMETA_WEBHOOK_AUTH, X_REMOVE_WEBHOOK, X_WEBHOOK, X_WEBHOOK_AUTH};
use crate::observability::metrics;

/// What the writer did to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigChange {
    /// URL and credential were copied into sysmeta.
    pub set: bool,
    /// A set was requested without a credential and ignored.
    pub rejected: bool,
    /// Both sysmeta fields were tombstoned.
    pub removed: bool,
}

/// Rewrite webhook set/remove intents in `headers` into sysmeta headers.
///
/// Remove is applied after set, so a request carrying both ends up tombstoned.
pub fn apply(method: &Method, headers: &mut HeaderMap, container: Option<&str>) -> ConfigChange {
    let mut change = ConfigChange::default();
    let container = container.unwrap_or("-");

    if *method == Method::PUT {
        if let Some(url) = headers.get(X_WEBHOOK).cloned() {
            match headers.get(X_WEBHOOK_AUTH).cloned() {
                Some(secret) => {
                    tracing::info!(
                        container = %container,
                        webhook = ?url,
                        "Adding webhook to container"
                    );
                    headers.insert(SYSMETA_WEBHOOK, url);
                    headers.insert(SYSMETA_WEBHOOK_AUTH, secret);
                    metrics::record_config_change("set");
                    change.set = true;
                }
                None => {
                    tracing::warn!(
                        container = %container,
                        "No webhook credentials provided; webhook not created"
                    );
                    metrics::record_config_change("rejected");
                    change.rejected = true;
                }
            }
        }
    }

    if headers.contains_key(X_REMOVE_WEBHOOK) {
        headers.insert(SYSMETA_WEBHOOK, HeaderValue::from_static(""));
        headers.insert(SYSMETA_WEBHOOK_AUTH, HeaderValue::from_static(""));
        tracing::info!(container = %container, "Removing webhook from container");
        metrics::record_config_change("remove");
        change.removed = true;
    }

    change
}
