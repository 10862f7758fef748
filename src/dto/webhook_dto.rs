use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::delivery_log::{DeliveryLogEntry, DeliveryLogFilter};
use crate::models::webhook_endpoint::WebhookEndpoint;
use crate::utils::{time, token::mask_secret};

/// Body sent to every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookEnvelope {
    pub event: String,
    pub data: JsonValue,
    pub timestamp: String,
}

impl WebhookEnvelope {
    pub fn new(event: &str, data: JsonValue) -> Self {
        Self {
            event: event.to_string(),
            data,
            timestamp: time::to_iso8601(time::now()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEndpointPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 8))]
    pub secret: Option<String>,
    #[validate(length(min = 1))]
    pub events: Vec<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEndpointPayload {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    #[validate(length(min = 8))]
    pub secret: Option<String>,
    #[validate(length(min = 1))]
    pub events: Option<Vec<String>>,
    pub active: Option<bool>,
}

/// Full endpoint including its secret. Only returned on creation and direct retrieval;
/// every other response uses [`EndpointSummary`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointResponse {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub secret_hint: String,
    pub events: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointListResponse {
    pub items: Vec<EndpointSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TriggerEventPayload {
    #[validate(length(min = 1))]
    pub event: String,
    #[serde(default)]
    pub data: JsonValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestEndpointPayload {
    pub event: Option<String>,
    pub payload: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryLogListQuery {
    pub endpoint_id: Option<i64>,
    pub event: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLogListResponse {
    pub items: Vec<DeliveryLogEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifySignatureResponse {
    pub valid: bool,
}

impl From<WebhookEndpoint> for EndpointResponse {
    fn from(value: WebhookEndpoint) -> Self {
        Self {
            id: value.id,
            name: value.name,
            url: value.url,
            secret: value.secret,
            events: value.events,
            active: value.is_active,
            created_at: value.created_at,
            last_triggered_at: value.last_triggered_at,
            success_rate: value.success_rate,
        }
    }
}

impl From<WebhookEndpoint> for EndpointSummary {
    fn from(value: WebhookEndpoint) -> Self {
        Self {
            id: value.id,
            secret_hint: mask_secret(&value.secret),
            name: value.name,
            url: value.url,
            events: value.events,
            active: value.is_active,
            created_at: value.created_at,
            last_triggered_at: value.last_triggered_at,
            success_rate: value.success_rate,
        }
    }
}

impl From<Vec<WebhookEndpoint>> for EndpointListResponse {
    fn from(value: Vec<WebhookEndpoint>) -> Self {
        let items: Vec<EndpointSummary> = value.into_iter().map(Into::into).collect();
        Self {
            total: items.len(),
            items,
        }
    }
}

impl From<Vec<DeliveryLogEntry>> for DeliveryLogListResponse {
    fn from(items: Vec<DeliveryLogEntry>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

impl TryFrom<DeliveryLogListQuery> for DeliveryLogFilter {
    type Error = Error;

    fn try_from(query: DeliveryLogListQuery) -> Result<Self> {
        let status = query
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse())
            .transpose()
            .map_err(Error::BadRequest)?;
        Ok(Self {
            endpoint_id: query.endpoint_id,
            event: query.event.filter(|e| !e.is_empty()),
            status,
        })
    }
}
