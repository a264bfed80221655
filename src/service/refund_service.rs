use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{
        BookingStatus, Identity, Refund, RefundTicket, TicketStatus,
    },
    error::{AppError, Result},
    integrations::{DomainEvent, NotifierManager},
    repository::{BookingRepository, RefundRepository},
    service::ledger_service::PaymentLedger,
    service::settlement_service::SettlementService,
};

/// Ticket workflow: open -> approved -> executed, or open -> rejected.
/// Money only moves at execution, and never more than the booking's
/// refundable balance.
pub struct RefundService {
    refunds: Arc<dyn RefundRepository>,
    bookings: Arc<dyn BookingRepository>,
    ledger: Arc<PaymentLedger>,
    settlement: Arc<SettlementService>,
    notifier: Arc<NotifierManager>,
}

impl RefundService {
    pub fn new(
        refunds: Arc<dyn RefundRepository>,
        bookings: Arc<dyn BookingRepository>,
        ledger: Arc<PaymentLedger>,
        settlement: Arc<SettlementService>,
        notifier: Arc<NotifierManager>,
    ) -> Self {
        Self {
            refunds,
            bookings,
            ledger,
            settlement,
            notifier,
        }
    }

    pub async fn raise_ticket(
        &self,
        booking_id: Uuid,
        requested_cents: i64,
        reason: String,
        identity: &Identity,
    ) -> Result<RefundTicket> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if !identity.can_act_for(booking.guest_id) {
            return Err(AppError::Forbidden);
        }
        if requested_cents <= 0 {
            return Err(AppError::BadRequest(
                "Refund amount must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        self.refunds
            .create_ticket(RefundTicket {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                raised_by: identity.user_id,
                reason,
                requested_cents,
                approved_cents: None,
                status: TicketStatus::Open,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// The approved amount must fit inside the booking's current
    /// refundable balance (successful payments minus refunds already
    /// executed); anything larger is an over-refund.
    pub async fn approve(
        &self,
        ticket_id: Uuid,
        amount_cents: i64,
        identity: &Identity,
    ) -> Result<RefundTicket> {
        if !identity.role.is_staff() {
            return Err(AppError::Forbidden);
        }

        let ticket = self.require_ticket(ticket_id, TicketStatus::Open).await?;

        if amount_cents <= 0 {
            return Err(AppError::BadRequest(
                "Approved amount must be positive".to_string(),
            ));
        }

        let refundable_cents = self.ledger.net_received(ticket.booking_id).await?;
        if amount_cents > refundable_cents {
            return Err(AppError::OverRefund {
                requested_cents: amount_cents,
                refundable_cents,
            });
        }

        let updated = self
            .refunds
            .update_ticket(ticket.id, TicketStatus::Approved, Some(amount_cents))
            .await?;

        self.notifier
            .dispatch(DomainEvent::RefundApproved(updated.clone()))
            .await;

        Ok(updated)
    }

    pub async fn reject(&self, ticket_id: Uuid, identity: &Identity) -> Result<RefundTicket> {
        if !identity.role.is_staff() {
            return Err(AppError::Forbidden);
        }

        let ticket = self.require_ticket(ticket_id, TicketStatus::Open).await?;
        self.refunds
            .update_ticket(ticket.id, TicketStatus::Rejected, None)
            .await
    }

    /// Moves the money and closes the ticket. A full refund pushes a
    /// not-yet-completed booking to cancelled; a refund against a booking
    /// that already accrued a host earning recomputes that earning.
    pub async fn execute(&self, ticket_id: Uuid, identity: &Identity) -> Result<Refund> {
        if !identity.role.is_staff() {
            return Err(AppError::Forbidden);
        }

        let ticket = self
            .require_ticket(ticket_id, TicketStatus::Approved)
            .await?;
        let amount_cents = ticket
            .approved_cents
            .ok_or_else(|| AppError::Internal("Approved ticket without amount".to_string()))?;

        // Re-check against the live balance; another ticket may have
        // executed between approval and now.
        let refundable_cents = self.ledger.net_received(ticket.booking_id).await?;
        if amount_cents > refundable_cents {
            return Err(AppError::OverRefund {
                requested_cents: amount_cents,
                refundable_cents,
            });
        }

        let refund = self.ledger.issue_refund(&ticket, amount_cents).await?;
        self.refunds
            .update_ticket(ticket.id, TicketStatus::Executed, None)
            .await?;

        let booking = self
            .bookings
            .find_by_id(ticket.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if self.ledger.net_received(booking.id).await? == 0
            && booking.status != BookingStatus::Completed
            && booking.status != BookingStatus::Cancelled
        {
            self.bookings
                .update_status(booking.id, BookingStatus::Cancelled)
                .await?;
        }

        self.settlement.recompute(booking.id).await?;

        tracing::info!(
            ticket_id = %ticket.id,
            booking_id = %booking.id,
            amount_cents,
            "refund executed"
        );
        self.notifier
            .dispatch(DomainEvent::RefundExecuted(refund.clone()))
            .await;

        Ok(refund)
    }

    /// Ticket history is visible to the booking's guest and to staff;
    /// amounts and dispute reasons are not public.
    pub async fn list_tickets(
        &self,
        booking_id: Uuid,
        identity: &Identity,
    ) -> Result<Vec<RefundTicket>> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if !identity.can_act_for(booking.guest_id) {
            return Err(AppError::Forbidden);
        }

        self.refunds.list_tickets_by_booking(booking_id).await
    }

    async fn require_ticket(&self, ticket_id: Uuid, expected: TicketStatus) -> Result<RefundTicket> {
        let ticket = self
            .refunds
            .find_ticket(ticket_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Refund ticket not found".to_string()))?;

        if ticket.status != expected {
            return Err(AppError::Conflict(format!(
                "Ticket is {:?}, expected {:?}",
                ticket.status, expected
            )));
        }

        Ok(ticket)
    }
}
