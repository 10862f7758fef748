pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::database::{
    DeliveryLogStore, EndpointRepository, InMemoryDeliveryLogStore, InMemoryEndpointRepository,
};
use crate::error::Result;
use crate::services::{
    endpoint_service::EndpointService,
    transport::{HttpTransport, WebhookTransport},
    webhook_service::WebhookService,
};

#[derive(Clone)]
pub struct AppState {
    pub endpoint_service: EndpointService,
    pub webhook_service: WebhookService,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(
            &config.webhook_user_agent,
            Duration::from_secs(config.webhook_timeout_secs),
        )?;
        Ok(Self::with_parts(
            Arc::new(InMemoryEndpointRepository::new()),
            Arc::new(InMemoryDeliveryLogStore::new()),
            Arc::new(transport),
        ))
    }

    pub fn with_parts(
        endpoints: Arc<dyn EndpointRepository>,
        logs: Arc<dyn DeliveryLogStore>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        let endpoint_service = EndpointService::new(endpoints.clone());
        let webhook_service = WebhookService::new(endpoints, logs, transport);

        Self {
            endpoint_service,
            webhook_service,
        }
    }
}
