//! Webhook fan-out, delivery logging and manual retry.
//!
//! Every attempt (batch, retry, or admin test) produces exactly one
//! [`DeliveryLogEntry`]. Transport failures and non-2xx responses never
//! surface as errors; they are recorded as `failed` entries.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::database::{DeliveryLogStore, EndpointRepository};
use crate::dto::webhook_dto::WebhookEnvelope;
use crate::error::{Error, Result};
use crate::models::delivery_log::{
    DeliveryLogEntry, DeliveryLogFilter, DeliveryStatus, NewDeliveryLog,
};
use crate::models::webhook_endpoint::{EndpointChanges, WebhookEndpoint};
use crate::services::subscription::eligible_endpoints;
use crate::services::transport::{OutboundRequest, WebhookTransport};
use crate::utils::{signature, time};

/// Recent attempts considered for an endpoint's success rate.
pub const SUCCESS_RATE_WINDOW: usize = 100;

#[derive(Clone)]
pub struct WebhookService {
    endpoints: Arc<dyn EndpointRepository>,
    logs: Arc<dyn DeliveryLogStore>,
    transport: Arc<dyn WebhookTransport>,
    /// Serialises the history read and endpoint write of a stats refresh.
    stats_lock: Arc<Mutex<()>>,
}

/// What a single attempt needs to know about its endpoint.
#[derive(Clone)]
struct DeliveryTarget {
    endpoint_id: i64,
    endpoint_name: String,
    url: String,
    secret: String,
}

impl From<&WebhookEndpoint> for DeliveryTarget {
    fn from(endpoint: &WebhookEndpoint) -> Self {
        Self {
            endpoint_id: endpoint.id,
            endpoint_name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            secret: endpoint.secret.clone(),
        }
    }
}

impl WebhookService {
    pub fn new(
        endpoints: Arc<dyn EndpointRepository>,
        logs: Arc<dyn DeliveryLogStore>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            endpoints,
            logs,
            transport,
            stats_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Dispatches `event` to every registered endpoint subscribed to it.
    pub async fn trigger(&self, event: &str, data: JsonValue) -> Result<Vec<DeliveryLogEntry>> {
        let endpoints = self.endpoints.list().await?;
        self.deliver(event, &data, &endpoints).await
    }

    /// Sends one signed envelope to each eligible endpoint concurrently and
    /// waits for the whole batch. Errors only come from the log store.
    pub async fn deliver(
        &self,
        event: &str,
        data: &JsonValue,
        endpoints: &[WebhookEndpoint],
    ) -> Result<Vec<DeliveryLogEntry>> {
        let targets = eligible_endpoints(event, endpoints);
        if targets.is_empty() {
            debug!(
                target: "webhook_delivery",
                event = %event,
                "No active endpoints subscribed to event"
            );
            return Ok(Vec::new());
        }

        let body = serde_json::to_string(&WebhookEnvelope::new(event, data.clone()))?;

        info!(
            target: "webhook_delivery",
            event = %event,
            endpoint_count = targets.len(),
            "Delivering event to subscribed endpoints"
        );

        let in_flight: Vec<_> = targets
            .into_iter()
            .map(|endpoint| {
                let target = DeliveryTarget::from(endpoint);
                let transport = self.transport.clone();
                let task_target = target.clone();
                let task_event = event.to_string();
                let task_body = body.clone();
                let handle = tokio::spawn(async move {
                    attempt(
                        transport.as_ref(),
                        &task_target,
                        &task_event,
                        task_body,
                        0,
                    )
                    .await
                });
                (target, handle)
            })
            .collect();

        let mut entries = Vec::with_capacity(in_flight.len());
        for (target, handle) in in_flight {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => unsent_attempt(
                    &target,
                    event,
                    body.clone(),
                    0,
                    format!("delivery task aborted: {}", join_err),
                ),
            };
            entries.push(self.record(outcome).await?);
        }
        Ok(entries)
    }

    pub async fn list_logs(&self, filter: &DeliveryLogFilter) -> Result<Vec<DeliveryLogEntry>> {
        self.logs.query(filter).await
    }

    pub async fn get_log(&self, id: i64) -> Result<DeliveryLogEntry> {
        self.logs
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("delivery log {} not found", id)))
    }

    /// Re-sends the frozen payload of a failed delivery with a fresh signature.
    ///
    /// `log_id` may name any attempt of the delivery; the decision is made on
    /// its most recent attempt, so a delivery that already recovered is never
    /// sent again. Stored entries are left as is; the result is a new entry.
    pub async fn retry(&self, log_id: i64) -> Result<DeliveryLogEntry> {
        let named = self.get_log(log_id).await?;
        let root_id = named.chain_root();
        let latest = self.logs.latest_in_chain(root_id).await?.unwrap_or(named);
        if latest.status == DeliveryStatus::Success {
            return Err(Error::InvalidState(format!(
                "delivery log {} already succeeded (attempt {})",
                log_id, latest.id
            )));
        }
        let endpoint = self.active_endpoint(latest.endpoint_id).await?;

        let target = DeliveryTarget {
            endpoint_id: endpoint.id,
            endpoint_name: endpoint.name,
            url: latest.url.clone(),
            secret: endpoint.secret,
        };
        let mut outcome = attempt(
            self.transport.as_ref(),
            &target,
            &latest.event,
            latest.request_payload.clone(),
            latest.retry_count + 1,
        )
        .await;
        outcome.retry_of = Some(root_id);
        self.record(outcome).await
    }

    /// Ad-hoc delivery to one endpoint, regardless of its subscriptions.
    pub async fn test_endpoint(
        &self,
        endpoint_id: i64,
        event: &str,
        data: JsonValue,
    ) -> Result<DeliveryLogEntry> {
        let endpoint = self.active_endpoint(endpoint_id).await?;
        let body = serde_json::to_string(&WebhookEnvelope::new(event, data))?;
        let outcome = attempt(
            self.transport.as_ref(),
            &DeliveryTarget::from(&endpoint),
            event,
            body,
            0,
        )
        .await;
        self.record(outcome).await
    }

    /// Checks an inbound signature against the endpoint's stored secret.
    pub async fn verify_inbound(
        &self,
        endpoint_id: i64,
        body: &str,
        signature_hex: &str,
        timestamp: i64,
    ) -> Result<bool> {
        let endpoint = self
            .endpoints
            .get(endpoint_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("webhook endpoint {} not found", endpoint_id)))?;
        Ok(signature::verify(body, signature_hex, timestamp, &endpoint.secret))
    }

    async fn active_endpoint(&self, endpoint_id: i64) -> Result<WebhookEndpoint> {
        let endpoint = self
            .endpoints
            .get(endpoint_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("webhook endpoint {} not found", endpoint_id)))?;
        if !endpoint.is_active {
            return Err(Error::InvalidState(format!(
                "webhook endpoint {} is inactive",
                endpoint_id
            )));
        }
        Ok(endpoint)
    }

    async fn record(&self, outcome: NewDeliveryLog) -> Result<DeliveryLogEntry> {
        let entry = self.logs.append(outcome).await?;

        match entry.status {
            DeliveryStatus::Success => info!(
                target: "webhook_delivery",
                log_id = entry.id,
                endpoint_id = entry.endpoint_id,
                event = %entry.event,
                status_code = ?entry.status_code,
                duration_ms = entry.duration_ms,
                retry_count = entry.retry_count,
                "Webhook delivered"
            ),
            DeliveryStatus::Failed => warn!(
                target: "webhook_delivery",
                log_id = entry.id,
                endpoint_id = entry.endpoint_id,
                event = %entry.event,
                status_code = ?entry.status_code,
                duration_ms = entry.duration_ms,
                retry_count = entry.retry_count,
                error = entry.error_message.as_deref().unwrap_or_default(),
                "Webhook delivery failed"
            ),
        }

        self.refresh_stats(&entry).await?;
        Ok(entry)
    }

    async fn refresh_stats(&self, entry: &DeliveryLogEntry) -> Result<()> {
        let _guard = self.stats_lock.lock().await;
        let history = self
            .logs
            .query(&DeliveryLogFilter {
                endpoint_id: Some(entry.endpoint_id),
                ..Default::default()
            })
            .await?;
        let last_triggered_at = history
            .iter()
            .map(|e| e.created_at)
            .max()
            .unwrap_or(entry.created_at);
        let changes = EndpointChanges {
            last_triggered_at: Some(last_triggered_at),
            success_rate: Some(success_rate(&history)),
            ..Default::default()
        };
        if self.endpoints.update(entry.endpoint_id, changes).await?.is_none() {
            debug!(
                target: "webhook_delivery",
                endpoint_id = entry.endpoint_id,
                "Endpoint gone before stats refresh"
            );
        }
        Ok(())
    }
}

/// Percentage of successes over the most recent window, one decimal place.
fn success_rate(history: &[DeliveryLogEntry]) -> f64 {
    let recent = &history[history.len().saturating_sub(SUCCESS_RATE_WINDOW)..];
    if recent.is_empty() {
        return 100.0;
    }
    let ok = recent
        .iter()
        .filter(|e| e.status == DeliveryStatus::Success)
        .count();
    let rate = ok as f64 * 100.0 / recent.len() as f64;
    (rate * 10.0).round() / 10.0
}

async fn attempt(
    transport: &dyn WebhookTransport,
    target: &DeliveryTarget,
    event: &str,
    body: String,
    retry_count: u32,
) -> NewDeliveryLog {
    let signed = match signature::sign(&body, &target.secret) {
        Ok(signed) => signed,
        Err(err) => return unsent_attempt(target, event, body, retry_count, err.to_string()),
    };
    let request = OutboundRequest {
        url: target.url.clone(),
        body,
        signature: signed.signature,
        timestamp: signed.timestamp,
    };

    let started = Instant::now();
    let result = transport.post(&request).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    let (status, status_code, response_body, error_message) = match result {
        Ok(resp) if (200..300).contains(&resp.status) => {
            (DeliveryStatus::Success, Some(resp.status), Some(resp.body), None)
        }
        Ok(resp) => (
            DeliveryStatus::Failed,
            Some(resp.status),
            Some(resp.body),
            Some(format!("endpoint responded with HTTP {}", resp.status)),
        ),
        Err(err) => (DeliveryStatus::Failed, None, None, Some(err.to_string())),
    };

    NewDeliveryLog {
        endpoint_id: target.endpoint_id,
        endpoint_name: target.endpoint_name.clone(),
        event: event.to_string(),
        url: request.url,
        status,
        status_code,
        request_payload: request.body,
        response_body,
        error_message,
        created_at: time::now(),
        retry_count,
        retry_of: None,
        duration_ms,
    }
}

/// Failed entry for an attempt that never reached the endpoint.
fn unsent_attempt(
    target: &DeliveryTarget,
    event: &str,
    body: String,
    retry_count: u32,
    error_message: String,
) -> NewDeliveryLog {
    NewDeliveryLog {
        endpoint_id: target.endpoint_id,
        endpoint_name: target.endpoint_name.clone(),
        event: event.to_string(),
        url: target.url.clone(),
        status: DeliveryStatus::Failed,
        status_code: None,
        request_payload: body,
        response_body: None,
        error_message: Some(error_message),
        created_at: time::now(),
        retry_count,
        retry_of: None,
        duration_ms: 0,
    }
}
