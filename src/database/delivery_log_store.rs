use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::delivery_log::{DeliveryLogEntry, DeliveryLogFilter, NewDeliveryLog};

/// Append-only record of delivery attempts.
#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    async fn append(&self, entry: NewDeliveryLog) -> Result<DeliveryLogEntry>;
    /// Entries matching every set filter field, in insertion order.
    async fn query(&self, filter: &DeliveryLogFilter) -> Result<Vec<DeliveryLogEntry>>;
    async fn get(&self, id: i64) -> Result<Option<DeliveryLogEntry>>;
    /// Most recent attempt of the delivery rooted at `root_id`, the root itself included.
    async fn latest_in_chain(&self, root_id: i64) -> Result<Option<DeliveryLogEntry>>;
}

#[derive(Default)]
struct LogTable {
    next_id: i64,
    entries: Vec<DeliveryLogEntry>,
}

/// Ids are assigned under the write lock, so concurrent appends never share one.
#[derive(Default)]
pub struct InMemoryDeliveryLogStore {
    table: RwLock<LogTable>,
}

impl InMemoryDeliveryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryLogStore for InMemoryDeliveryLogStore {
    async fn append(&self, entry: NewDeliveryLog) -> Result<DeliveryLogEntry> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let stored = entry.into_entry(table.next_id);
        table.entries.push(stored.clone());
        Ok(stored)
    }

    async fn query(&self, filter: &DeliveryLogFilter) -> Result<Vec<DeliveryLogEntry>> {
        let table = self.table.read().await;
        Ok(table
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<DeliveryLogEntry>> {
        let table = self.table.read().await;
        Ok(table.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn latest_in_chain(&self, root_id: i64) -> Result<Option<DeliveryLogEntry>> {
        let table = self.table.read().await;
        Ok(table
            .entries
            .iter()
            .rev()
            .find(|e| e.chain_root() == root_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::delivery_log::DeliveryStatus;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn attempt(endpoint_id: i64, event: &str, status: DeliveryStatus) -> NewDeliveryLog {
        NewDeliveryLog {
            endpoint_id,
            endpoint_name: format!("endpoint-{}", endpoint_id),
            event: event.to_string(),
            url: "https://example.com/hook".to_string(),
            status,
            status_code: match status {
                DeliveryStatus::Success => Some(200),
                DeliveryStatus::Failed => None,
            },
            request_payload: "{}".to_string(),
            response_body: None,
            error_message: None,
            created_at: chrono::Utc::now(),
            retry_count: 0,
            retry_of: None,
            duration_ms: 12,
        }
    }

    #[tokio::test]
    async fn query_applies_filters_with_and_semantics() {
        let store = InMemoryDeliveryLogStore::new();
        store
            .append(attempt(1, "user.created", DeliveryStatus::Success))
            .await
            .unwrap();
        store
            .append(attempt(1, "tier.changed", DeliveryStatus::Failed))
            .await
            .unwrap();
        store
            .append(attempt(2, "user.created", DeliveryStatus::Failed))
            .await
            .unwrap();

        let all = store.query(&DeliveryLogFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let by_endpoint = store
            .query(&DeliveryLogFilter {
                endpoint_id: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_endpoint.len(), 2);

        let failed_user_created = store
            .query(&DeliveryLogFilter {
                endpoint_id: None,
                event: Some("user.created".into()),
                status: Some(DeliveryStatus::Failed),
            })
            .await
            .unwrap();
        assert_eq!(failed_user_created.len(), 1);
        assert_eq!(failed_user_created[0].endpoint_id, 2);
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_id() {
        let store = InMemoryDeliveryLogStore::new();
        let stored = store
            .append(attempt(1, "user.created", DeliveryStatus::Success))
            .await
            .unwrap();
        assert_eq!(store.get(stored.id).await.unwrap(), Some(stored));
        assert!(store.get(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_get_unique_ids() {
        let store = Arc::new(InMemoryDeliveryLogStore::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(attempt(i, "points.earned", DeliveryStatus::Success))
                    .await
                    .unwrap()
                    .id
            }));
        }
        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn latest_in_chain_follows_retries_of_the_root() {
        let store = InMemoryDeliveryLogStore::new();
        let root = store
            .append(attempt(1, "tier.changed", DeliveryStatus::Failed))
            .await
            .unwrap();
        let other = store
            .append(attempt(2, "tier.changed", DeliveryStatus::Failed))
            .await
            .unwrap();
        assert_eq!(store.latest_in_chain(root.id).await.unwrap(), Some(root.clone()));

        let mut retry = attempt(1, "tier.changed", DeliveryStatus::Success);
        retry.retry_count = 1;
        retry.retry_of = Some(root.id);
        let retry = store.append(retry).await.unwrap();

        assert_eq!(store.latest_in_chain(root.id).await.unwrap(), Some(retry));
        assert_eq!(store.latest_in_chain(other.id).await.unwrap(), Some(other));
        assert!(store.latest_in_chain(99).await.unwrap().is_none());
    }
}
