use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    Approved,
    Rejected,
    /// Terminal: the refund has been issued and the ticket is closed.
    Executed,
}

/// A guest- or host-initiated refund request against a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundTicket {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub raised_by: Uuid,
    pub reason: String,
    pub requested_cents: i64,
    pub approved_cents: Option<i64>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable monetary transaction executed against an approved ticket.
/// Decrements the booking's net-received amount in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub gateway_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}
