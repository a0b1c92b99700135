//! System metadata header hygiene.
//!
//! # Responsibilities
//! - Remove `x-{account,container,object}-sysmeta-*` from client requests
//! - Remove the same headers from responses headed to the client
//! - Do both as a standalone middleware, whether or not the webhook stage runs
//!
//! # Design Decisions
//! - Matching is by prefix on the lowercase header name
//! - Transient object sysmeta is treated like any other sysmeta

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};

/// Header prefixes reserved for system metadata.
pub const SYSMETA_PREFIXES: &[&str] = &[
    "x-account-sysmeta-",
    "x-container-sysmeta-",
    "x-object-sysmeta-",
    "x-object-transient-sysmeta-",
];

/// True when `name` is a system metadata header.
pub fn is_sysmeta(name: &HeaderName) -> bool {
    let name = name.as_str();
    SYSMETA_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Remove every system metadata header. Returns how many names were removed.
pub fn strip_sysmeta(headers: &mut HeaderMap) -> usize {
    let doomed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_sysmeta(name))
        .cloned()
        .collect();

    for name in &doomed {
        headers.remove(name);
    }

    if !doomed.is_empty() {
        tracing::debug!(count = doomed.len(), "Stripped sysmeta headers");
    }
    doomed.len()
}

/// Middleware that keeps sysmeta between the proxy and the storage service.
///
/// Must wrap every stage that writes or reads sysmeta, so those stages only
/// ever see sysmeta they wrote themselves or the storage service returned.
pub async fn sysmeta_gatekeeper(mut req: Request<Body>, next: Next) -> Response {
    let dropped = strip_sysmeta(req.headers_mut());
    if dropped > 0 {
        tracing::warn!(
            count = dropped,
            path = %req.uri().path(),
            "Dropped client-supplied sysmeta headers"
        );
    }

    let mut response = next.run(req).await;
    strip_sysmeta(response.headers_mut());
    response
}
