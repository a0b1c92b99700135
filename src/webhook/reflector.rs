//! Reflects the persisted webhook URL back to the client.

use axum::http::HeaderMap;

use super::{SYSMETA_WEBHOOK, X_WEBHOOK};

/// Copy the persisted webhook URL into `x-webhook`.
///
/// Only the URL is reflected; the credential never leaves the proxy.
/// Returns true when a header was added.
pub fn reflect(headers: &mut HeaderMap) -> bool {
    match headers.get(SYSMETA_WEBHOOK).cloned() {
        Some(url) if !url.is_empty() => {
            headers.insert(X_WEBHOOK, url);
            true
        }
        _ => false,
    }
}
