use async_trait::async_trait;
use stripe::{
    Client, CreatePaymentIntent, CreateRefund, Currency, PaymentIntent, PaymentIntentStatus,
    Refund,
};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    payments::{GatewayOutcome, PaymentGateway},
};

pub struct StripeGateway {
    client: Client,
}

impl StripeGateway {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(api_key),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> &str {
        "stripe"
    }

    async fn charge(&self, booking_id: Uuid, amount_cents: i64) -> Result<GatewayOutcome> {
        let mut params = CreatePaymentIntent::new(amount_cents, Currency::USD);
        params.confirm = Some(true);
        let description = format!("Booking {}", booking_id);
        params.description = Some(&description);

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("booking_id".to_string(), booking_id.to_string());
        params.metadata = Some(metadata);

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| AppError::External(format!("Stripe error: {}", e)))?;

        match intent.status {
            PaymentIntentStatus::Succeeded => {
                Ok(GatewayOutcome::approved(intent.id.to_string()))
            }
            status => Ok(GatewayOutcome::declined(format!(
                "payment intent ended in status {:?}",
                status
            ))),
        }
    }

    async fn refund(&self, reference: &str, amount_cents: i64) -> Result<GatewayOutcome> {
        let intent_id = reference
            .parse()
            .map_err(|_| AppError::External(format!("Invalid payment reference: {}", reference)))?;

        let refund = Refund::create(
            &self.client,
            CreateRefund {
                payment_intent: Some(intent_id),
                amount: Some(amount_cents),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| AppError::External(format!("Stripe refund error: {}", e)))?;

        Ok(GatewayOutcome::approved(refund.id.to_string()))
    }
}
