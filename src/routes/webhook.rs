use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::webhook_dto::{
        CreateEndpointPayload, DeliveryLogListQuery, DeliveryLogListResponse, EndpointListResponse,
        EndpointResponse, EndpointSummary, TestEndpointPayload, TriggerEventPayload,
        UpdateEndpointPayload, VerifySignatureResponse,
    },
    error::Result,
    models::delivery_log::DeliveryLogFilter,
    services::events::{KNOWN_EVENTS, WEBHOOK_TEST},
    utils::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/webhooks/events",
    responses(
        (status = 200, description = "Events an endpoint can subscribe to")
    )
)]
#[axum::debug_handler]
pub async fn list_events() -> impl IntoResponse {
    Json(json!({ "events": KNOWN_EVENTS }))
}

#[utoipa::path(
    get,
    path = "/api/webhooks",
    responses(
        (status = 200, description = "Registered webhook endpoints", body = Json<EndpointListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_endpoints(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let endpoints = state.endpoint_service.list().await?;
    Ok(Json(EndpointListResponse::from(endpoints)))
}

#[utoipa::path(
    post,
    path = "/api/webhooks",
    request_body = CreateEndpointPayload,
    responses(
        (status = 201, description = "Webhook endpoint created", body = Json<EndpointResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<CreateEndpointPayload>,
) -> Result<impl IntoResponse> {
    let endpoint = state.endpoint_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(EndpointResponse::from(endpoint))))
}

#[utoipa::path(
    get,
    path = "/api/webhooks/{id}",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    responses(
        (status = 200, description = "Webhook endpoint", body = Json<EndpointResponse>),
        (status = 404, description = "Endpoint not found")
    )
)]
#[axum::debug_handler]
pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let endpoint = state.endpoint_service.get(id).await?;
    Ok(Json(EndpointResponse::from(endpoint)))
}

#[utoipa::path(
    patch,
    path = "/api/webhooks/{id}",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    request_body = UpdateEndpointPayload,
    responses(
        (status = 200, description = "Webhook endpoint updated", body = Json<EndpointSummary>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Endpoint not found")
    )
)]
#[axum::debug_handler]
pub async fn update_endpoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEndpointPayload>,
) -> Result<impl IntoResponse> {
    let endpoint = state.endpoint_service.update(id, payload).await?;
    Ok(Json(EndpointSummary::from(endpoint)))
}

#[utoipa::path(
    delete,
    path = "/api/webhooks/{id}",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    responses(
        (status = 204, description = "Webhook endpoint deleted"),
        (status = 404, description = "Endpoint not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_endpoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.endpoint_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/webhooks/{id}/test",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    request_body = TestEndpointPayload,
    responses(
        (status = 200, description = "Delivery attempt recorded"),
        (status = 404, description = "Endpoint not found"),
        (status = 409, description = "Endpoint inactive")
    )
)]
#[axum::debug_handler]
pub async fn test_endpoint(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Option<Json<TestEndpointPayload>>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.unwrap_or_default();
    let event = payload
        .event
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| WEBHOOK_TEST.to_string());
    let data = payload.payload.unwrap_or_else(|| json!({ "test": true }));

    let entry = state.webhook_service.test_endpoint(id, &event, data).await?;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/{id}/verify",
    params(
        ("id" = i64, Path, description = "Endpoint ID")
    ),
    responses(
        (status = 200, description = "Signature verdict", body = Json<VerifySignatureResponse>),
        (status = 404, description = "Endpoint not found")
    )
)]
#[axum::debug_handler]
pub async fn verify_signature(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok());

    let valid = match (signature, timestamp) {
        (Some(signature), Some(timestamp)) => {
            state
                .webhook_service
                .verify_inbound(id, &body, signature, timestamp)
                .await?
        }
        _ => {
            // Still 404 for unknown endpoints.
            state.endpoint_service.get(id).await?;
            false
        }
    };
    Ok(Json(VerifySignatureResponse { valid }))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/trigger",
    request_body = TriggerEventPayload,
    responses(
        (status = 200, description = "One delivery log entry per eligible endpoint", body = Json<DeliveryLogListResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn trigger_event(
    State(state): State<AppState>,
    Json(payload): Json<TriggerEventPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let entries = state
        .webhook_service
        .trigger(&payload.event, payload.data)
        .await?;
    Ok(Json(DeliveryLogListResponse::from(entries)))
}

#[utoipa::path(
    get,
    path = "/api/webhook-logs",
    params(
        ("endpoint_id" = Option<i64>, Query, description = "Filter by endpoint"),
        ("event" = Option<String>, Query, description = "Filter by event name"),
        ("status" = Option<String>, Query, description = "success or failed")
    ),
    responses(
        (status = 200, description = "Delivery log entries", body = Json<DeliveryLogListResponse>),
        (status = 400, description = "Unknown status filter")
    )
)]
#[axum::debug_handler]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<DeliveryLogListQuery>,
) -> Result<impl IntoResponse> {
    let filter = DeliveryLogFilter::try_from(query)?;
    let entries = state.webhook_service.list_logs(&filter).await?;
    Ok(Json(DeliveryLogListResponse::from(entries)))
}

#[utoipa::path(
    get,
    path = "/api/webhook-logs/{id}",
    params(
        ("id" = i64, Path, description = "Delivery log ID")
    ),
    responses(
        (status = 200, description = "Delivery log entry"),
        (status = 404, description = "Log entry not found")
    )
)]
#[axum::debug_handler]
pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let entry = state.webhook_service.get_log(id).await?;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/api/webhook-logs/{id}/retry",
    params(
        ("id" = i64, Path, description = "Delivery log ID")
    ),
    responses(
        (status = 200, description = "New delivery log entry for the retry"),
        (status = 404, description = "Log entry or endpoint not found"),
        (status = 409, description = "Already delivered or endpoint inactive")
    )
)]
#[axum::debug_handler]
pub async fn retry_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let entry = state.webhook_service.retry(id).await?;
    Ok(Json(entry))
}
