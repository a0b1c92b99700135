//! End-to-end webhook behaviour through the proxy.

use axum::http::StatusCode;
use std::time::{Duration, Instant};
use swift_webhook::config::DispatchMode;

mod common;

use common::{client, start_mock_storage, start_proxy, start_webhook_receiver, unused_addr};

#[tokio::test]
async fn test_put_with_webhook_sets_sysmeta_and_notifies() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::ZERO).await;
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;
    let hook_url = format!("http://{}/hook", hook_addr);

    let res = client()
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .header("x-webhook", &hook_url)
        .header("x-webhook-auth", "secret123")
        .header("x-auth-token", "AUTH_tk123")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Persisted as a pair
    let sysmeta = storage.sysmeta("/v1/acct/cont");
    assert_eq!(sysmeta.get("webhook"), Some(&hook_url));
    assert_eq!(sysmeta.get("webhook-auth").map(String::as_str), Some("secret123"));

    // Forwarded with the sysmeta headers present
    let forwarded = storage.last_seen(axum::http::Method::PUT).unwrap();
    assert_eq!(forwarded.headers["x-container-sysmeta-webhook"], hook_url.as_str());
    assert!(forwarded.headers.contains_key("x-request-id"));

    // Exactly one notification
    let hook = hooks.try_recv().expect("webhook should have been called");
    assert!(hooks.try_recv().is_err(), "only one notification expected");

    assert_eq!(hook.headers["authorization"], "Basic c2VjcmV0MTIz");
    assert_eq!(hook.headers["content-type"], "application/json");
    assert_eq!(
        hook.body,
        serde_json::json!({
            "swiftObj": {
                "url": format!("http://{}/v1/acct", proxy_addr),
                "token": "AUTH_tk123",
                "container": "cont",
                "object": "obj",
                "method": "PUT"
            }
        })
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_webhook_still_returns_201() {
    let (storage_addr, storage) = start_mock_storage().await;
    let dead = unused_addr().await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", dead)), ("webhook-auth", "secret123")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let res = client()
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), "");

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejected_notification_does_not_change_response() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(500, Duration::ZERO).await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", hook_addr)), ("webhook-auth", "s")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let res = client()
        .delete(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let hook = hooks.try_recv().expect("one attempt expected");
    assert_eq!(hook.body["swiftObj"]["method"], "DELETE");
    assert!(hooks.try_recv().is_err(), "no retry expected");

    shutdown.trigger();
}

#[tokio::test]
async fn test_set_without_credential_is_not_applied() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let res = client()
        .put(format!("http://{}/v1/acct/cont", proxy_addr))
        .header("x-webhook", "https://example.com/hook")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(storage.sysmeta("/v1/acct/cont").is_empty());
    let forwarded = storage.last_seen(axum::http::Method::PUT).unwrap();
    assert!(!forwarded.headers.contains_key("x-container-sysmeta-webhook"));
    assert!(!forwarded.headers.contains_key("x-container-sysmeta-webhook-auth"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_remove_tombstones_and_silences_notifications() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::ZERO).await;
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;
    let client = client();

    client
        .put(format!("http://{}/v1/acct/cont", proxy_addr))
        .header("x-webhook", format!("http://{}/hook", hook_addr))
        .header("x-webhook-auth", "secret123")
        .send()
        .await
        .unwrap();
    assert_eq!(storage.sysmeta("/v1/acct/cont").len(), 2);

    let res = client
        .post(format!("http://{}/v1/acct/cont", proxy_addr))
        .header("x-remove-webhook", "yes")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let forwarded = storage.last_seen(axum::http::Method::POST).unwrap();
    assert_eq!(forwarded.headers["x-container-sysmeta-webhook"], "");
    assert_eq!(forwarded.headers["x-container-sysmeta-webhook-auth"], "");
    assert!(storage.sysmeta("/v1/acct/cont").is_empty());

    let res = client
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(hooks.try_recv().is_err(), "no webhook configured, no POST");

    shutdown.trigger();
}

#[tokio::test]
async fn test_get_and_container_requests_never_notify() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::ZERO).await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", hook_addr)), ("webhook-auth", "s")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;
    let client = client();

    let res = client
        .get(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "object-data");

    client
        .post(format!("http://{}/v1/acct/cont", proxy_addr))
        .send()
        .await
        .unwrap();
    client
        .put(format!("http://{}/v1/acct", proxy_addr))
        .send()
        .await
        .unwrap();

    assert!(hooks.try_recv().is_err());

    shutdown.trigger();
}

#[tokio::test]
async fn test_successful_head_on_object_notifies() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::ZERO).await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", hook_addr)), ("webhook-auth", "s")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let res = client()
        .head(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let hook = hooks.try_recv().expect("HEAD on an object should notify");
    assert_eq!(hook.body["swiftObj"]["method"], "HEAD");
    assert!(hooks.try_recv().is_err());

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_inline_webhook_does_not_time_out_response() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::from_millis(2500)).await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", hook_addr)), ("webhook-auth", "s")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |config| {
        config.webhook.dispatch = DispatchMode::Inline;
        config.timeouts.request_secs = 1;
    })
    .await;

    let res = client()
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(hooks.try_recv().is_ok(), "inline notification should have completed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_failed_write_does_not_notify() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::ZERO).await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", hook_addr)), ("webhook-auth", "s")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let res = client()
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .header(common::X_MOCK_STATUS, "507")
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INSUFFICIENT_STORAGE);
    assert!(hooks.try_recv().is_err());

    shutdown.trigger();
}

#[tokio::test]
async fn test_head_container_reflects_webhook_only() {
    let (storage_addr, storage) = start_mock_storage().await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", "https://example.com/hook"), ("webhook-auth", "secret123")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let res = client()
        .head(format!("http://{}/v1/acct/cont", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["x-webhook"], "https://example.com/hook");
    assert!(!res.headers().contains_key("x-container-sysmeta-webhook"));
    assert!(!res.headers().contains_key("x-container-sysmeta-webhook-auth"));

    let res = client()
        .head(format!("http://{}/v1/acct/other", proxy_addr))
        .send()
        .await
        .unwrap();
    assert!(!res.headers().contains_key("x-webhook"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_supplied_sysmeta_is_dropped() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    client()
        .post(format!("http://{}/v1/acct/cont", proxy_addr))
        .header("x-container-sysmeta-webhook", "https://evil.example.com")
        .send()
        .await
        .unwrap();

    assert!(storage.sysmeta("/v1/acct/cont").is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_background_dispatch_does_not_hold_response() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (hook_addr, mut hooks) = start_webhook_receiver(200, Duration::from_millis(1500)).await;
    storage.seed(
        "/v1/acct/cont",
        &[("webhook", &format!("http://{}/hook", hook_addr)), ("webhook-auth", "s")],
    );
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |config| {
        config.webhook.dispatch = DispatchMode::Background;
    })
    .await;

    let started = Instant::now();
    let res = client()
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(
        started.elapsed() < Duration::from_millis(1000),
        "response waited for the webhook"
    );

    let hook = tokio::time::timeout(Duration::from_secs(5), hooks.recv())
        .await
        .expect("background notification never arrived")
        .unwrap();
    assert_eq!(hook.body["swiftObj"]["object"], "obj");

    shutdown.trigger();
}

#[tokio::test]
async fn test_info_advertises_webhook() {
    let (storage_addr, _storage) = start_mock_storage().await;
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |_| {}).await;

    let info: serde_json::Value = client()
        .get(format!("http://{}/info", proxy_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(info["webhook"], serde_json::json!({}));
    assert_eq!(info["swift"]["version"], "2.30.0");

    shutdown.trigger();
}

#[tokio::test]
async fn test_disabled_stage_is_plain_passthrough() {
    let (storage_addr, storage) = start_mock_storage().await;
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |config| {
        config.webhook.enabled = false;
    })
    .await;
    let client = client();

    client
        .put(format!("http://{}/v1/acct/cont", proxy_addr))
        .header("x-webhook", "https://example.com/hook")
        .header("x-webhook-auth", "secret123")
        .send()
        .await
        .unwrap();
    assert!(storage.sysmeta("/v1/acct/cont").is_empty());

    let info: serde_json::Value = client
        .get(format!("http://{}/info", proxy_addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(info.get("webhook").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_disabled_stage_still_drops_client_sysmeta() {
    let (storage_addr, storage) = start_mock_storage().await;
    storage.seed("/v1/acct/cont", &[("webhook-auth", "secret123")]);
    let (proxy_addr, shutdown) = start_proxy(storage_addr, |config| {
        config.webhook.enabled = false;
    })
    .await;
    let client = client();

    client
        .post(format!("http://{}/v1/acct/cont", proxy_addr))
        .header("x-container-sysmeta-webhook", "https://evil.example.com")
        .send()
        .await
        .unwrap();
    let forwarded = storage.last_seen(axum::http::Method::POST).unwrap();
    assert!(!forwarded.headers.contains_key("x-container-sysmeta-webhook"));
    assert_eq!(storage.sysmeta("/v1/acct/cont").get("webhook"), None);

    let res = client
        .head(format!("http://{}/v1/acct/cont", proxy_addr))
        .send()
        .await
        .unwrap();
    assert!(!res.headers().contains_key("x-container-sysmeta-webhook-auth"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_down_is_bad_gateway() {
    let dead = unused_addr().await;
    let (proxy_addr, shutdown) = start_proxy(dead, |_| {}).await;

    let res = client()
        .put(format!("http://{}/v1/acct/cont/obj", proxy_addr))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}
