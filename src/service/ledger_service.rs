use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{Booking, Payment, PaymentMethod, PaymentStatus, Refund, RefundTicket},
    error::{AppError, Result},
    payments::{GatewayOutcome, PaymentGateway},
    repository::{PaymentRepository, RefundRepository},
};

/// The authoritative record of money moved for a booking. Attempts and
/// refunds are append-only rows; every question about paid state is
/// answered by summing them, never by a flag on the booking.
pub struct PaymentLedger {
    payments: Arc<dyn PaymentRepository>,
    refunds: Arc<dyn RefundRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentLedger {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        refunds: Arc<dyn RefundRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            payments,
            refunds,
            gateway,
        }
    }

    /// Sum of successful payments, before refunds.
    pub async fn total_paid(&self, booking_id: Uuid) -> Result<i64> {
        self.payments.sum_succeeded(booking_id).await
    }

    pub async fn total_refunded(&self, booking_id: Uuid) -> Result<i64> {
        self.refunds.sum_refunded(booking_id).await
    }

    /// Successful payments minus executed refunds.
    pub async fn net_received(&self, booking_id: Uuid) -> Result<i64> {
        Ok(self.total_paid(booking_id).await? - self.total_refunded(booking_id).await?)
    }

    pub async fn is_fully_settled(&self, booking: &Booking) -> Result<bool> {
        Ok(self.net_received(booking.id).await? >= booking.total_cents)
    }

    /// Delegates the charge to the gateway and appends the outcome. A
    /// second attempt against an already-settled booking is rejected, not
    /// silently absorbed — that is the double-submit guard.
    pub async fn record_attempt(
        &self,
        booking: &Booking,
        amount_cents: i64,
        method: PaymentMethod,
    ) -> Result<Payment> {
        if self.net_received(booking.id).await? >= booking.total_cents {
            return Err(AppError::AlreadySettled(format!(
                "Booking {} is already fully settled",
                booking.id
            )));
        }

        let outcome = match method {
            // Manual payments are recorded by staff with no gateway call.
            PaymentMethod::Manual => GatewayOutcome::approved(format!("manual_{}", booking.id)),
            PaymentMethod::Card => self.gateway.charge(booking.id, amount_cents).await?,
        };

        let payment = self
            .payments
            .create(Payment {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                amount_cents,
                method,
                status: if outcome.approved {
                    PaymentStatus::Succeeded
                } else {
                    PaymentStatus::Failed
                },
                gateway_ref: outcome.reference,
                decline_reason: outcome.decline_reason,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            amount_cents,
            succeeded = payment.succeeded(),
            gateway = self.gateway.name(),
            "payment attempt recorded"
        );

        Ok(payment)
    }

    /// Issues the money back through the gateway and appends the refund.
    /// Callers (the refund workflow) own the over-refund guard and ticket
    /// state; this only moves and records money.
    pub async fn issue_refund(&self, ticket: &RefundTicket, amount_cents: i64) -> Result<Refund> {
        // Refund against the most recent successful charge's reference.
        let reference = self
            .payments
            .list_by_booking(ticket.booking_id)
            .await?
            .into_iter()
            .rev()
            .find(|p| p.succeeded())
            .and_then(|p| p.gateway_ref);

        let gateway_ref = match reference {
            Some(ref r) => self.gateway.refund(r, amount_cents).await?.reference,
            None => None,
        };

        self.refunds
            .create_refund(Refund {
                id: Uuid::new_v4(),
                ticket_id: ticket.id,
                booking_id: ticket.booking_id,
                amount_cents,
                gateway_ref,
                created_at: Utc::now(),
            })
            .await
    }
}
