use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use loyalty_backend::{
    database::{InMemoryDeliveryLogStore, InMemoryEndpointRepository},
    routes,
    services::transport::HttpTransport,
    utils::signature,
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn setup_app() -> Router {
    let transport =
        HttpTransport::new("LoyaltyWebhooks/test", Duration::from_secs(5)).expect("transport");
    let state = AppState::with_parts(
        Arc::new(InMemoryEndpointRepository::new()),
        Arc::new(InMemoryDeliveryLogStore::new()),
        Arc::new(transport),
    );
    routes::router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn endpoint_admin_lifecycle() {
    let app = setup_app();

    let (status, created) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(json!({
            "name": "CRM",
            "url": "https://crm.example.com/hooks",
            "secret": "abcdefgh1234",
            "events": ["user.created", "tier.changed"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["secret"], "abcdefgh1234");
    assert_eq!(created["active"], true);

    let (status, listed) = send(&app, "GET", "/api/webhooks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert!(listed["items"][0].get("secret").is_none());
    assert_eq!(listed["items"][0]["secret_hint"], "****1234");

    let (status, fetched) = send(&app, "GET", &format!("/api/webhooks/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["secret"], "abcdefgh1234");

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/webhooks/{}", id),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);
    assert_eq!(updated["name"], "CRM");
    assert!(updated.get("secret").is_none());
    assert_eq!(updated["secret_hint"], "****1234");

    let (status, _) = send(&app, "DELETE", &format!("/api/webhooks/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/api/webhooks/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn create_rejects_unknown_events() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(json!({
            "name": "CRM",
            "url": "https://crm.example.com/hooks",
            "events": ["points.vanished"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("points.vanished"));

    let (status, events) = send(&app, "GET", "/api/webhooks/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(events["events"]
        .as_array()
        .unwrap()
        .contains(&json!("points.earned")));
}

#[tokio::test]
async fn trigger_list_and_retry_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pos"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = setup_app();
    let (_, pos) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(json!({
            "name": "POS",
            "url": format!("{}/pos", server.uri()),
            "events": ["points.earned"]
        })),
    )
    .await;
    let pos_id = pos["id"].as_i64().unwrap();

    let (status, batch) = send(
        &app,
        "POST",
        "/api/webhooks/trigger",
        Some(json!({ "event": "points.earned", "data": { "user_id": 1, "points": 10 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batch["total"], 1);
    let log = &batch["items"][0];
    assert_eq!(log["status"], "failed");
    assert_eq!(log["status_code"], 500);
    assert_eq!(log["retry_count"], 0);
    let log_id = log["id"].as_i64().unwrap();

    let (status, none) = send(
        &app,
        "POST",
        "/api/webhooks/trigger",
        Some(json!({ "event": "tier.changed", "data": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none["total"], 0);

    let (status, retried) = send(
        &app,
        "POST",
        &format!("/api/webhook-logs/{}/retry", log_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retried["retry_count"], 1);
    assert_ne!(retried["id"], log["id"]);
    assert_eq!(retried["request_payload"], log["request_payload"]);

    let (status, failed) = send(
        &app,
        "GET",
        &format!("/api/webhook-logs?endpoint_id={}&status=failed", pos_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(failed["total"], 2);

    let (status, _) = send(&app, "GET", "/api/webhook-logs?status=pending", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/webhook-logs/999/retry", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        "PATCH",
        &format!("/api/webhooks/{}", pos_id),
        Some(json!({ "active": false })),
    )
    .await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/webhook-logs/{}/retry", log_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delivery_and_success_cannot_be_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crm"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let app = setup_app();
    let (_, crm) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(json!({
            "name": "CRM",
            "url": format!("{}/crm", server.uri()),
            "events": ["user.created"]
        })),
    )
    .await;
    let crm_id = crm["id"].as_i64().unwrap();

    let (status, entry) = send(
        &app,
        "POST",
        &format!("/api/webhooks/{}/test", crm_id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["status"], "success");
    assert_eq!(entry["event"], "webhook.test");
    assert_eq!(entry["response_body"], "pong");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/webhook-logs/{}/retry", entry["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, fetched) = send(&app, "GET", &format!("/api/webhooks/{}", crm_id), None).await;
    assert_eq!(fetched["success_rate"], 100.0);
    assert!(fetched["last_triggered_at"].is_string());

    let (status, _) = send(&app, "POST", "/api/webhooks/404/test", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verify_route_checks_signature_headers() {
    let app = setup_app();
    let (_, created) = send(
        &app,
        "POST",
        "/api/webhooks",
        Some(json!({
            "name": "Inbound",
            "url": "https://inbound.example.com/hook",
            "secret": "verify-me-please",
            "events": ["transaction.created"]
        })),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let body = json!({ "event": "transaction.created", "data": { "amount": 12 } }).to_string();
    let signed = signature::sign(&body, "verify-me-please").unwrap();
    let ts = signed.timestamp;

    let verify = |sig: String, body: String| {
        let app = app.clone();
        async move {
            let req = Request::builder()
                .method("POST")
                .uri(format!("/api/webhooks/{}/verify", id))
                .header("x-webhook-signature", sig)
                .header("x-webhook-timestamp", ts.to_string())
                .body(Body::from(body))
                .unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            serde_json::from_slice::<JsonValue>(&bytes).unwrap()["valid"]
                .as_bool()
                .unwrap()
        }
    };

    assert!(verify(signed.signature.clone(), body.clone()).await);
    assert!(!verify(signed.signature.clone(), body.replace("12", "13")).await);
    assert!(!verify("0".repeat(64), body.clone()).await);

    let (status, missing) = send(&app, "POST", &format!("/api/webhooks/{}/verify", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missing["valid"], false);
}
