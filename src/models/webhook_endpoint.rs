use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookEndpoint {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub success_rate: f64,
}

impl WebhookEndpoint {
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }

    /// Active and subscribed to `event`.
    pub fn is_eligible_for(&self, event: &str) -> bool {
        self.is_active && self.subscribes_to(event)
    }
}

// Secret stays out of logs.
impl std::fmt::Debug for WebhookEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookEndpoint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("secret", &"<redacted>")
            .field("events", &self.events)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("last_triggered_at", &self.last_triggered_at)
            .field("success_rate", &self.success_rate)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct NewWebhookEndpoint {
    pub name: String,
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
    pub is_active: bool,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct EndpointChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub success_rate: Option<f64>,
}

impl EndpointChanges {
    pub fn apply_to(self, endpoint: &mut WebhookEndpoint) {
        if let Some(name) = self.name {
            endpoint.name = name;
        }
        if let Some(url) = self.url {
            endpoint.url = url;
        }
        if let Some(secret) = self.secret {
            endpoint.secret = secret;
        }
        if let Some(events) = self.events {
            endpoint.events = events;
        }
        if let Some(is_active) = self.is_active {
            endpoint.is_active = is_active;
        }
        if let Some(at) = self.last_triggered_at {
            endpoint.last_triggered_at = Some(at);
        }
        if let Some(rate) = self.success_rate {
            endpoint.success_rate = rate;
        }
    }
}
