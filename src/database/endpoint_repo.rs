use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::webhook_endpoint::{EndpointChanges, NewWebhookEndpoint, WebhookEndpoint};
use crate::utils::time;

#[async_trait]
pub trait EndpointRepository: Send + Sync {
    async fn create(&self, endpoint: NewWebhookEndpoint) -> Result<WebhookEndpoint>;
    async fn get(&self, id: i64) -> Result<Option<WebhookEndpoint>>;
    async fn list(&self) -> Result<Vec<WebhookEndpoint>>;
    /// Merges `changes` into the stored endpoint; `None` when it does not exist.
    async fn update(&self, id: i64, changes: EndpointChanges) -> Result<Option<WebhookEndpoint>>;
    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Default)]
struct EndpointTable {
    next_id: i64,
    rows: Vec<WebhookEndpoint>,
}

#[derive(Default)]
pub struct InMemoryEndpointRepository {
    table: RwLock<EndpointTable>,
}

impl InMemoryEndpointRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EndpointRepository for InMemoryEndpointRepository {
    async fn create(&self, endpoint: NewWebhookEndpoint) -> Result<WebhookEndpoint> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let row = WebhookEndpoint {
            id: table.next_id,
            name: endpoint.name,
            url: endpoint.url,
            secret: endpoint.secret,
            events: endpoint.events,
            is_active: endpoint.is_active,
            created_at: time::now(),
            last_triggered_at: None,
            success_rate: 100.0,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<WebhookEndpoint>> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<WebhookEndpoint>> {
        Ok(self.table.read().await.rows.clone())
    }

    async fn update(&self, id: i64, changes: EndpointChanges) -> Result<Option<WebhookEndpoint>> {
        let mut table = self.table.write().await;
        let Some(row) = table.rows.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        changes.apply_to(row);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|e| e.id != id);
        Ok(table.rows.len() != before)
    }
}
