use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::database::EndpointRepository;
use crate::dto::webhook_dto::{CreateEndpointPayload, UpdateEndpointPayload};
use crate::error::{Error, Result};
use crate::models::webhook_endpoint::{EndpointChanges, NewWebhookEndpoint, WebhookEndpoint};
use crate::utils::token::generate_webhook_secret;
use crate::utils::validation::{normalize_events, validate_webhook_url};

#[derive(Clone)]
pub struct EndpointService {
    repo: Arc<dyn EndpointRepository>,
}

impl EndpointService {
    pub fn new(repo: Arc<dyn EndpointRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, payload: CreateEndpointPayload) -> Result<WebhookEndpoint> {
        payload.validate()?;
        let name = clean_name(&payload.name)?;
        validate_webhook_url(&payload.url)?;
        let events = normalize_events(&payload.events)?;
        let secret = payload
            .secret
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_webhook_secret);

        let endpoint = self
            .repo
            .create(NewWebhookEndpoint {
                name,
                url: payload.url,
                secret,
                events,
                is_active: payload.active.unwrap_or(true),
            })
            .await?;

        info!(
            endpoint_id = endpoint.id,
            url = %endpoint.url,
            "Webhook endpoint registered"
        );
        Ok(endpoint)
    }

    pub async fn get(&self, id: i64) -> Result<WebhookEndpoint> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("webhook endpoint {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<WebhookEndpoint>> {
        self.repo.list().await
    }

    pub async fn update(&self, id: i64, payload: UpdateEndpointPayload) -> Result<WebhookEndpoint> {
        payload.validate()?;
        let name = payload.name.as_deref().map(clean_name).transpose()?;
        if let Some(url) = payload.url.as_deref() {
            validate_webhook_url(url)?;
        }
        let events = payload.events.as_deref().map(normalize_events).transpose()?;

        let changes = EndpointChanges {
            name,
            url: payload.url,
            secret: payload.secret,
            events,
            is_active: payload.active,
            ..Default::default()
        };
        self.repo
            .update(id, changes)
            .await?
            .ok_or_else(|| Error::NotFound(format!("webhook endpoint {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(Error::NotFound(format!("webhook endpoint {} not found", id)));
        }
        info!(endpoint_id = id, "Webhook endpoint deleted");
        Ok(())
    }
}

fn clean_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::BadRequest("name must not be blank".into()));
    }
    Ok(name.to_string())
}
