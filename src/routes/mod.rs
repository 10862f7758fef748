pub mod health;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    let webhook_api = Router::new()
        .route("/api/webhooks/events", get(webhook::list_events))
        .route(
            "/api/webhooks",
            get(webhook::list_endpoints).post(webhook::create_endpoint),
        )
        .route("/api/webhooks/trigger", post(webhook::trigger_event))
        .route(
            "/api/webhooks/:id",
            get(webhook::get_endpoint)
                .patch(webhook::update_endpoint)
                .delete(webhook::delete_endpoint),
        )
        .route("/api/webhooks/:id/test", post(webhook::test_endpoint))
        .route("/api/webhooks/:id/verify", post(webhook::verify_signature))
        .route("/api/webhook-logs", get(webhook::list_logs))
        .route("/api/webhook-logs/:id", get(webhook::get_log))
        .route("/api/webhook-logs/:id/retry", post(webhook::retry_log));

    Router::new()
        .route("/health", get(health::health))
        .merge(webhook_api)
        .with_state(state)
}
