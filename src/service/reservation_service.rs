use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    calendar::InventoryCalendar,
    config::BookingConfig,
    domain::{
        Booking, BookingStatus, HoldToken, Identity, PaymentMethod,
    },
    error::{AppError, Result},
    integrations::{DomainEvent, NotifierManager},
    repository::{BookingRepository, CouponRepository, RefundRepository},
    service::ledger_service::PaymentLedger,
    service::pricing_service::pct_of,
    service::refund_service::RefundService,
    service::settlement_service::SettlementService,
};

/// The booking state machine: quoted -> held -> confirmed -> completed,
/// with held -> expired on TTL timeout and held|confirmed -> cancelled.
/// Owns the hold/commit/release dance against the calendar.
pub struct ReservationService {
    bookings: Arc<dyn BookingRepository>,
    coupons: Arc<dyn CouponRepository>,
    refund_tickets: Arc<dyn RefundRepository>,
    calendar: Arc<InventoryCalendar>,
    ledger: Arc<PaymentLedger>,
    refund_service: Arc<RefundService>,
    settlement: Arc<SettlementService>,
    notifier: Arc<NotifierManager>,
    policy: BookingConfig,
}

impl ReservationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        coupons: Arc<dyn CouponRepository>,
        refund_tickets: Arc<dyn RefundRepository>,
        calendar: Arc<InventoryCalendar>,
        ledger: Arc<PaymentLedger>,
        refund_service: Arc<RefundService>,
        settlement: Arc<SettlementService>,
        notifier: Arc<NotifierManager>,
        policy: BookingConfig,
    ) -> Self {
        Self {
            bookings,
            coupons,
            refund_tickets,
            calendar,
            ledger,
            refund_service,
            settlement,
            notifier,
            policy,
        }
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        self.bookings.find_by_id(id).await
    }

    pub async fn list_guest_bookings(&self, guest_id: Uuid) -> Result<Vec<Booking>> {
        self.bookings.list_by_guest(guest_id).await
    }

    /// Turns a quote into a confirmed booking: hold the dates, charge the
    /// frozen total, commit the hold. A calendar conflict means the caller
    /// must re-quote — there is no silent retry with a stale price. A
    /// declined payment releases the hold and cancels the booking (not
    /// expired: the distinction matters to support).
    pub async fn confirm_booking(
        &self,
        booking_id: Uuid,
        method: PaymentMethod,
        identity: &Identity,
    ) -> Result<Booking> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if !identity.can_act_for(booking.guest_id) {
            return Err(AppError::Forbidden);
        }
        if booking.status != BookingStatus::Quoted {
            return Err(AppError::Conflict(
                "Booking is not awaiting confirmation".to_string(),
            ));
        }

        // A limited coupon may have been exhausted by other confirmations
        // since this quote was issued. Re-check before taking the guest's
        // money; a quote that lost the last slot must be re-issued without
        // the coupon.
        let application = self.coupons.find_application(booking.id).await?;
        if let Some(app) = &application {
            self.check_coupon_capacity(app.coupon_id, booking.guest_id)
                .await?;
        }

        let token = self.calendar.try_hold(&booking).await?;

        let payment = match self
            .ledger
            .record_attempt(&booking, booking.total_cents, method)
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                // Gateway unreachable or ledger failure: free the dates
                // before surfacing the error.
                self.calendar
                    .release(&token, BookingStatus::Cancelled)
                    .await?;
                return Err(e);
            }
        };

        if !payment.succeeded() {
            self.calendar
                .release(&token, BookingStatus::Cancelled)
                .await?;
            return Err(AppError::PaymentDeclined(
                payment
                    .decline_reason
                    .unwrap_or_else(|| "Payment was declined".to_string()),
            ));
        }

        let confirmed = match self.calendar.commit(&token).await {
            Ok(confirmed) => confirmed,
            Err(err @ AppError::HoldExpired(_)) => {
                // The sweeper reclaimed the hold while the charge was in
                // flight: the guest has paid for dates they no longer
                // hold. Open a full-refund ticket immediately instead of
                // waiting for support to notice the charged Expired
                // booking.
                self.refund_service
                    .raise_ticket(
                        booking.id,
                        payment.amount_cents,
                        "Hold expired during payment".to_string(),
                        identity,
                    )
                    .await?;
                tracing::warn!(
                    booking_id = %booking.id,
                    "hold lost after charge, refund ticket opened"
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        // Redemption counts at confirmation, not at quote time, so
        // abandoned quotes never consume a limited coupon.
        if let Some(app) = application {
            self.coupons
                .record_usage(app.coupon_id, confirmed.guest_id)
                .await?;
        }

        tracing::info!(booking_id = %confirmed.id, "booking confirmed");
        self.notifier
            .dispatch(DomainEvent::BookingConfirmed(confirmed.clone()))
            .await;

        Ok(confirmed)
    }

    /// Explicit guest/host/admin cancellation. A held booking's inventory
    /// is released before the cancellation is acknowledged, so a follow-up
    /// hold on the freed range cannot see a phantom conflict. Cancelling a
    /// paid confirmed booking opens a refund ticket per the
    /// cancellation-fee policy.
    pub async fn cancel_booking(&self, booking_id: Uuid, identity: &Identity) -> Result<Booking> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if !identity.can_act_for(booking.guest_id) {
            return Err(AppError::Forbidden);
        }

        let cancelled = match booking.status {
            BookingStatus::Quoted => {
                self.bookings
                    .update_status(booking.id, BookingStatus::Cancelled)
                    .await?
            }
            BookingStatus::Held => {
                let token = HoldToken {
                    booking_id: booking.id,
                    room_type_id: booking.room_type_id,
                    expires_at: booking.hold_expires_at.unwrap_or_else(Utc::now),
                };
                self.calendar
                    .release(&token, BookingStatus::Cancelled)
                    .await?
            }
            BookingStatus::Confirmed => {
                let cancelled = self
                    .bookings
                    .update_status(booking.id, BookingStatus::Cancelled)
                    .await?;
                self.open_cancellation_ticket(&cancelled, identity).await?;
                cancelled
            }
            _ => {
                return Err(AppError::Conflict(
                    "Booking can no longer be cancelled".to_string(),
                ))
            }
        };

        tracing::info!(booking_id = %cancelled.id, "booking cancelled");
        self.notifier
            .dispatch(DomainEvent::BookingCancelled(cancelled.clone()))
            .await;

        Ok(cancelled)
    }

    /// Usage limits are enforced twice: at quote time for early feedback
    /// and again at confirmation, so two live quotes cannot both redeem
    /// the last slot of a limited coupon.
    async fn check_coupon_capacity(&self, coupon_id: Uuid, guest_id: Uuid) -> Result<()> {
        let Some(coupon) = self.coupons.find_by_id(coupon_id).await? else {
            return Ok(());
        };

        if let Some(limit) = coupon.global_limit {
            if self.coupons.global_usage(coupon.id).await? >= limit {
                return Err(AppError::QuoteRejected(format!(
                    "Coupon '{}' usage limit reached; re-quote without it",
                    coupon.code
                )));
            }
        }

        if let Some(limit) = coupon.per_user_limit {
            if self.coupons.user_usage(coupon.id, guest_id).await? >= limit {
                return Err(AppError::QuoteRejected(format!(
                    "Coupon '{}' usage limit reached for this account; re-quote without it",
                    coupon.code
                )));
            }
        }

        Ok(())
    }

    /// Cancellation-fee policy: free up to `free_cancellation_days` before
    /// check-in, afterwards a percentage of the total is withheld. The
    /// refundable remainder goes through the normal refund workflow.
    async fn open_cancellation_ticket(
        &self,
        booking: &Booking,
        identity: &Identity,
    ) -> Result<()> {
        let net = self.ledger.net_received(booking.id).await?;
        if net <= 0 {
            return Ok(());
        }

        let days_until_check_in = (booking.check_in - Utc::now().date_naive()).num_days();
        let fee_cents = if days_until_check_in >= self.policy.free_cancellation_days {
            0
        } else {
            pct_of(booking.total_cents, self.policy.late_cancellation_fee_pct)
        };

        let refundable = (net - fee_cents).max(0);
        if refundable == 0 {
            return Ok(());
        }

        self.refund_service
            .raise_ticket(
                booking.id,
                refundable,
                "Cancellation refund".to_string(),
                identity,
            )
            .await?;

        Ok(())
    }

    /// Sweeper entry point: expire every hold whose TTL lapsed. The TTL is
    /// a hard wall-clock deadline enforced here, not by the client.
    pub async fn expire_stale_holds(&self) -> Result<Vec<Booking>> {
        let expired = self.calendar.sweep_expired(Utc::now()).await?;
        for booking in &expired {
            self.notifier
                .dispatch(DomainEvent::BookingExpired(booking.clone()))
                .await;
        }
        Ok(expired)
    }

    /// Sweeper entry point: confirmed bookings whose checkout has passed
    /// become completed, unless an open refund ticket blocks settlement.
    /// Completion accrues the host earning best-effort; the repository
    /// keeps handing back completed bookings without an earning row, so a
    /// failed accrual is retried on the next sweep.
    pub async fn complete_past_checkouts(&self, today: NaiveDate) -> Result<Vec<Booking>> {
        let due = self.bookings.list_past_checkout(today).await?;
        let mut completed = Vec::with_capacity(due.len());

        for booking in due {
            if self.refund_tickets.has_open_ticket(booking.id).await? {
                tracing::debug!(
                    booking_id = %booking.id,
                    "completion deferred, open refund ticket"
                );
                continue;
            }

            let newly_completed = booking.status != BookingStatus::Completed;
            let done = if newly_completed {
                self.bookings
                    .update_status(booking.id, BookingStatus::Completed)
                    .await?
            } else {
                booking
            };

            if let Err(e) = self.settlement.accrue(done.id).await {
                tracing::warn!(booking_id = %done.id, "earning accrual deferred: {}", e);
            }

            if newly_completed {
                completed.push(done);
            }
        }

        Ok(completed)
    }
}
