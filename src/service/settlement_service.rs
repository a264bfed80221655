use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        BookingStatus, HostEarning, HostPayout, PayoutStatus,
    },
    error::{AppError, Result},
    integrations::{DomainEvent, NotifierManager},
    repository::{BookingRepository, PropertyRepository, SettlementRepository},
    service::ledger_service::PaymentLedger,
    service::pricing_service::pct_of,
};

/// Aggregates completed bookings into host earnings and batches them into
/// payouts.
pub struct SettlementService {
    settlements: Arc<dyn SettlementRepository>,
    bookings: Arc<dyn BookingRepository>,
    properties: Arc<dyn PropertyRepository>,
    ledger: Arc<PaymentLedger>,
    notifier: Arc<NotifierManager>,
    platform_fee_pct: i64,
}

impl SettlementService {
    pub fn new(
        settlements: Arc<dyn SettlementRepository>,
        bookings: Arc<dyn BookingRepository>,
        properties: Arc<dyn PropertyRepository>,
        ledger: Arc<PaymentLedger>,
        notifier: Arc<NotifierManager>,
        platform_fee_pct: i64,
    ) -> Self {
        Self {
            settlements,
            bookings,
            properties,
            ledger,
            notifier,
            platform_fee_pct,
        }
    }

    async fn host_for_booking(&self, room_type_id: Uuid) -> Result<Uuid> {
        let room_type = self
            .properties
            .find_room_type(room_type_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room type not found".to_string()))?;
        let property = self
            .properties
            .find_property(room_type.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
        Ok(property.host_id)
    }

    /// Idempotent per booking: accruing twice refreshes the single earning
    /// row keyed by booking id. Requires a completed stay whose payments
    /// covered the total; executed refunds reduce the net share.
    pub async fn accrue(&self, booking_id: Uuid) -> Result<HostEarning> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.status != BookingStatus::Completed {
            return Err(AppError::BadRequest(
                "Earnings accrue only for completed stays".to_string(),
            ));
        }

        if self.ledger.total_paid(booking.id).await? < booking.total_cents {
            return Err(AppError::BadRequest(
                "Booking is not fully settled".to_string(),
            ));
        }

        let host_id = self.host_for_booking(booking.room_type_id).await?;
        let gross_cents = booking.total_cents;
        let platform_fee_cents = pct_of(gross_cents, self.platform_fee_pct);
        let refunded_cents = self.ledger.total_refunded(booking.id).await?;
        let net_cents = (gross_cents - platform_fee_cents - refunded_cents).max(0);

        let now = Utc::now();
        let earning = self
            .settlements
            .upsert_earning(HostEarning {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                host_id,
                gross_cents,
                platform_fee_cents,
                refunded_cents,
                net_cents,
                payout_id: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            host_id = %host_id,
            net_cents = earning.net_cents,
            "host earning accrued"
        );

        Ok(earning)
    }

    /// Called after a refund executes against a booking that already has
    /// an earning. The row is recomputed in place, never deleted, so the
    /// audit history survives.
    pub async fn recompute(&self, booking_id: Uuid) -> Result<Option<HostEarning>> {
        let Some(earning) = self.settlements.find_earning_by_booking(booking_id).await? else {
            return Ok(None);
        };

        let refunded_cents = self.ledger.total_refunded(booking_id).await?;
        let net_cents = (earning.gross_cents - earning.platform_fee_cents - refunded_cents).max(0);

        let updated = self
            .settlements
            .update_earning_amounts(booking_id, refunded_cents, net_cents)
            .await?;

        tracing::info!(
            booking_id = %booking_id,
            net_cents = updated.net_cents,
            "host earning recomputed after refund"
        );

        Ok(Some(updated))
    }

    pub async fn list_host_earnings(&self, host_id: Uuid) -> Result<Vec<HostEarning>> {
        self.settlements.list_earnings_by_host(host_id).await
    }

    /// Batches every unattached earning for the host up to the cutoff into
    /// one pending disbursement.
    pub async fn batch_payout(&self, host_id: Uuid, period_end: NaiveDate) -> Result<HostPayout> {
        let earnings = self.settlements.list_unattached(host_id, period_end).await?;
        if earnings.is_empty() {
            return Err(AppError::NothingToPayout);
        }

        let total_cents: i64 = earnings.iter().map(|e| e.net_cents).sum();
        let earning_ids: Vec<Uuid> = earnings.iter().map(|e| e.id).collect();

        let now = Utc::now();
        let payout = self
            .settlements
            .create_payout(
                HostPayout {
                    id: Uuid::new_v4(),
                    host_id,
                    total_cents,
                    status: PayoutStatus::Pending,
                    period_end,
                    created_at: now,
                    updated_at: now,
                },
                &earning_ids,
            )
            .await?;

        tracing::info!(
            payout_id = %payout.id,
            host_id = %host_id,
            total_cents,
            earnings = earning_ids.len(),
            "payout batch created"
        );

        Ok(payout)
    }

    /// The external disbursement channel confirmed the transfer.
    pub async fn confirm_payout(&self, payout_id: Uuid) -> Result<HostPayout> {
        let payout = self.require_pending(payout_id).await?;
        let updated = self
            .settlements
            .update_payout_status(payout.id, PayoutStatus::Paid)
            .await?;

        self.notifier
            .dispatch(DomainEvent::PayoutPaid(updated.clone()))
            .await;

        Ok(updated)
    }

    /// Disbursement failed: the earnings are detached so the next batch
    /// picks them up again.
    pub async fn fail_payout(&self, payout_id: Uuid) -> Result<HostPayout> {
        let payout = self.require_pending(payout_id).await?;
        let updated = self
            .settlements
            .update_payout_status(payout.id, PayoutStatus::Failed)
            .await?;
        self.settlements.detach_earnings(payout.id).await?;

        tracing::warn!(payout_id = %payout.id, "payout failed, earnings released for retry");
        self.notifier
            .dispatch(DomainEvent::PayoutFailed(updated.clone()))
            .await;

        Ok(updated)
    }

    async fn require_pending(&self, payout_id: Uuid) -> Result<HostPayout> {
        let payout = self
            .settlements
            .find_payout(payout_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payout not found".to_string()))?;

        if payout.status != PayoutStatus::Pending {
            return Err(AppError::Conflict(
                "Payout is not in pending state".to_string(),
            ));
        }

        Ok(payout)
    }
}
