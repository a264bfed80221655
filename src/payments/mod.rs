use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

pub mod fake_gateway;
pub mod stripe_gateway;

pub use fake_gateway::FakeGateway;
pub use stripe_gateway::StripeGateway;

/// Outcome of a gateway call. A decline is a normal outcome, not an
/// error; errors are reserved for the gateway itself being unreachable.
#[derive(Debug, Clone)]
pub struct GatewayOutcome {
    pub approved: bool,
    pub reference: Option<String>,
    pub decline_reason: Option<String>,
}

impl GatewayOutcome {
    pub fn approved(reference: String) -> Self {
        Self {
            approved: true,
            reference: Some(reference),
            decline_reason: None,
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reference: None,
            decline_reason: Some(reason.into()),
        }
    }
}

/// External charge/refund channel. The ledger delegates the actual money
/// movement here and records only the outcome; retries and backoff are
/// this client's concern, never the ledger's.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &str;
    async fn charge(&self, booking_id: Uuid, amount_cents: i64) -> Result<GatewayOutcome>;
    async fn refund(&self, reference: &str, amount_cents: i64) -> Result<GatewayOutcome>;
}
