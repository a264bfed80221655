use async_trait::async_trait;
use serde_json::json;

use crate::{
    config::WebhookConfig,
    error::{AppError, Result},
    integrations::{DomainEvent, Notifier},
};

/// POSTs domain events as JSON to a configured endpoint. The receiving
/// side owns message formatting and delivery to actual users.
pub struct WebhookNotifier {
    config: WebhookConfig,
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: Option<WebhookConfig>) -> Option<Self> {
        config.and_then(|cfg| {
            if cfg.enabled {
                Some(Self {
                    config: cfg,
                    http: reqwest::Client::new(),
                })
            } else {
                None
            }
        })
    }

    fn payload(event: &DomainEvent) -> serde_json::Value {
        match event {
            DomainEvent::BookingConfirmed(b)
            | DomainEvent::BookingCancelled(b)
            | DomainEvent::BookingExpired(b) => json!({ "event": event.name(), "booking": b }),
            DomainEvent::RefundApproved(t) => json!({ "event": event.name(), "ticket": t }),
            DomainEvent::RefundExecuted(r) => json!({ "event": event.name(), "refund": r }),
            DomainEvent::PayoutPaid(p) | DomainEvent::PayoutFailed(p) => {
                json!({ "event": event.name(), "payout": p })
            }
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn health_check(&self) -> Result<()> {
        if self.config.endpoint.is_empty() {
            return Err(AppError::External(
                "Webhook endpoint not configured".to_string(),
            ));
        }
        Ok(())
    }

    async fn handle_event(&self, event: &DomainEvent) -> Result<()> {
        let mut request = self
            .http
            .post(&self.config.endpoint)
            .json(&Self::payload(event));

        if let Some(ref token) = self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::External(format!("Webhook delivery failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "Webhook endpoint returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
