use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    payments::{GatewayOutcome, PaymentGateway},
};

/// Deterministic in-process gateway. Used when Stripe is disabled in
/// config (local development) and by the integration tests, which flip
/// `decline_all` to exercise the payment-failure paths and
/// `charge_delay` to widen the window between hold and commit.
pub struct FakeGateway {
    decline_all: AtomicBool,
    charge_delay_ms: AtomicU64,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            decline_all: AtomicBool::new(false),
            charge_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn set_decline_all(&self, decline: bool) {
        self.decline_all.store(decline, Ordering::SeqCst);
    }

    pub fn set_charge_delay(&self, delay: Duration) {
        self.charge_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake"
    }

    async fn charge(&self, booking_id: Uuid, _amount_cents: i64) -> Result<GatewayOutcome> {
        let delay_ms = self.charge_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.decline_all.load(Ordering::SeqCst) {
            return Ok(GatewayOutcome::declined("card declined"));
        }
        Ok(GatewayOutcome::approved(format!("fake_ch_{}", booking_id)))
    }

    async fn refund(&self, reference: &str, _amount_cents: i64) -> Result<GatewayOutcome> {
        Ok(GatewayOutcome::approved(format!("fake_re_{}", reference)))
    }
}
