use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(DeliveryStatus::Success),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("unknown delivery status '{}'", other)),
        }
    }
}

/// One delivery attempt. Never mutated once stored; a retry is a new entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryLogEntry {
    pub id: i64,
    pub endpoint_id: i64,
    pub endpoint_name: String,
    pub event: String,
    pub url: String,
    pub status: DeliveryStatus,
    pub status_code: Option<u16>,
    pub request_payload: String,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    /// Id of the first attempt of the delivery this entry retries.
    pub retry_of: Option<i64>,
    pub duration_ms: u64,
}

impl DeliveryLogEntry {
    /// Id shared by an attempt and all of its retries.
    pub fn chain_root(&self) -> i64 {
        self.retry_of.unwrap_or(self.id)
    }
}

/// Attempt outcome before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeliveryLog {
    pub endpoint_id: i64,
    pub endpoint_name: String,
    pub event: String,
    pub url: String,
    pub status: DeliveryStatus,
    pub status_code: Option<u16>,
    pub request_payload: String,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub retry_count: u32,
    pub retry_of: Option<i64>,
    pub duration_ms: u64,
}

impl NewDeliveryLog {
    pub fn into_entry(self, id: i64) -> DeliveryLogEntry {
        DeliveryLogEntry {
            id,
            endpoint_id: self.endpoint_id,
            endpoint_name: self.endpoint_name,
            event: self.event,
            url: self.url,
            status: self.status,
            status_code: self.status_code,
            request_payload: self.request_payload,
            response_body: self.response_body,
            error_message: self.error_message,
            created_at: self.created_at,
            retry_count: self.retry_count,
            retry_of: self.retry_of,
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryLogFilter {
    pub endpoint_id: Option<i64>,
    pub event: Option<String>,
    pub status: Option<DeliveryStatus>,
}

impl DeliveryLogFilter {
    pub fn matches(&self, entry: &DeliveryLogEntry) -> bool {
        self.endpoint_id.map_or(true, |id| entry.endpoint_id == id)
            && self.event.as_deref().map_or(true, |ev| entry.event == ev)
            && self.status.map_or(true, |st| entry.status == st)
    }
}
