use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The host's net share for one completed, settled booking. One row per
/// booking; refunds recompute the row in place rather than deleting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEarning {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub host_id: Uuid,
    pub gross_cents: i64,
    pub platform_fee_cents: i64,
    pub refunded_cents: i64,
    pub net_cents: i64,
    pub payout_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PayoutStatus {
    Pending,
    Paid,
    Failed,
}

/// One disbursement batching a host's unattached earnings up to a cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostPayout {
    pub id: Uuid,
    pub host_id: Uuid,
    pub total_cents: i64,
    pub status: PayoutStatus,
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
