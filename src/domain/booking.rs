use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Half-open stay interval `[check_in, check_out)`. A checkout day equals
/// the next booking's check-in day without conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    /// Returns `None` for zero-or-negative ranges.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        if check_out > check_in {
            Some(Self {
                check_in,
                check_out,
            })
        } else {
            None
        }
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// `[a,b)` and `[c,d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Quoted,
    Held,
    Confirmed,
    Completed,
    Expired,
    Cancelled,
}

impl BookingStatus {
    /// Statuses that occupy inventory.
    pub fn blocks_calendar(&self) -> bool {
        matches!(self, BookingStatus::Held | BookingStatus::Confirmed)
    }
}

/// A booking is created at quote time and only ever moves through status
/// transitions; rows are never deleted, so the audit trail is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub room_type_id: Uuid,
    pub guest_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupancy: i32,
    pub status: BookingStatus,
    pub base_cents: i64,
    pub discount_cents: i64,
    pub fees_cents: i64,
    pub total_cents: i64,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn stay(&self) -> StayRange {
        StayRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    pub fn nights(&self) -> i64 {
        self.stay().nights()
    }
}

/// Proof of a live inventory hold, returned by the calendar and consumed
/// by `commit`/`release`.
#[derive(Debug, Clone)]
pub struct HoldToken {
    pub booking_id: Uuid,
    pub room_type_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(StayRange::new(d("2026-09-10"), d("2026-09-10")).is_none());
        assert!(StayRange::new(d("2026-09-10"), d("2026-09-08")).is_none());
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        let first = StayRange::new(d("2026-09-01"), d("2026-09-04")).unwrap();
        let second = StayRange::new(d("2026-09-04"), d("2026-09-07")).unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn one_shared_night_overlaps() {
        let first = StayRange::new(d("2026-09-01"), d("2026-09-04")).unwrap();
        let second = StayRange::new(d("2026-09-03"), d("2026-09-06")).unwrap();
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));
    }
}
