use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStatus, HoldToken},
    error::{AppError, Result},
    repository::BookingRepository,
};

/// Tracks which date ranges are held or booked per room type.
///
/// All read-then-write work for one room type runs under that room type's
/// mutex, so the overlap check in `try_hold` is atomic with respect to
/// concurrent holds on the same inventory. This is the single place that
/// prevents the double-booking race; naive check-then-insert without the
/// lock loses it.
pub struct InventoryCalendar {
    bookings: Arc<dyn BookingRepository>,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    hold_ttl: Duration,
}

impl InventoryCalendar {
    pub fn new(bookings: Arc<dyn BookingRepository>, hold_ttl_minutes: i64) -> Self {
        Self {
            bookings,
            locks: Mutex::new(HashMap::new()),
            hold_ttl: Duration::minutes(hold_ttl_minutes),
        }
    }

    async fn lock_for(&self, room_type_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(room_type_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Places a short-lived hold on the booking's date range. Returns a
    /// typed conflict (never a panic) when an overlapping hold or
    /// confirmed booking exists; the caller must re-quote. Holds whose
    /// TTL lapsed do not block.
    pub async fn try_hold(&self, booking: &Booking) -> Result<HoldToken> {
        let lock = self.lock_for(booking.room_type_id).await;
        let _guard = lock.lock().await;

        let now = Utc::now();
        let range = booking.stay();
        let blocking = self
            .bookings
            .find_blocking(booking.room_type_id, &range, booking.id, now)
            .await?;

        if !blocking.is_empty() {
            tracing::debug!(
                booking_id = %booking.id,
                room_type_id = %booking.room_type_id,
                "hold rejected, {} overlapping booking(s)",
                blocking.len()
            );
            return Err(AppError::DatesUnavailable(
                "Dates are no longer available for this room type".to_string(),
            ));
        }

        let expires_at = now + self.hold_ttl;
        self.bookings.mark_held(booking.id, expires_at).await?;

        tracing::debug!(booking_id = %booking.id, %expires_at, "hold placed");

        Ok(HoldToken {
            booking_id: booking.id,
            room_type_id: booking.room_type_id,
            expires_at,
        })
    }

    /// Converts a live hold into a confirmed booking. Fails with
    /// `HoldExpired` if the sweeper already reclaimed the hold (e.g. the
    /// payment took longer than the TTL).
    pub async fn commit(&self, token: &HoldToken) -> Result<Booking> {
        let lock = self.lock_for(token.room_type_id).await;
        let _guard = lock.lock().await;

        let booking = self
            .bookings
            .find_by_id(token.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.status != BookingStatus::Held {
            return Err(AppError::HoldExpired(
                "Hold is no longer live; re-quote and try again".to_string(),
            ));
        }

        self.bookings
            .update_status(token.booking_id, BookingStatus::Confirmed)
            .await
    }

    /// Frees a held range. `to` distinguishes why: `Cancelled` for payment
    /// failure or explicit cancellation, `Expired` for TTL timeout.
    pub async fn release(&self, token: &HoldToken, to: BookingStatus) -> Result<Booking> {
        let lock = self.lock_for(token.room_type_id).await;
        let _guard = lock.lock().await;

        self.bookings.update_status(token.booking_id, to).await
    }

    /// Expires every hold whose TTL has lapsed and returns the expired
    /// bookings. Run by the periodic sweeper; clients cannot block
    /// inventory indefinitely by never paying.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let stale = self.bookings.list_expired_holds(now).await?;
        let mut expired = Vec::with_capacity(stale.len());

        for booking in stale {
            let lock = self.lock_for(booking.room_type_id).await;
            let _guard = lock.lock().await;

            // Re-read under the lock; a concurrent commit may have won.
            let current = match self.bookings.find_by_id(booking.id).await? {
                Some(b) if b.status == BookingStatus::Held => b,
                _ => continue,
            };

            let updated = self
                .bookings
                .update_status(current.id, BookingStatus::Expired)
                .await?;
            tracing::info!(booking_id = %updated.id, "hold expired, inventory released");
            expired.push(updated);
        }

        Ok(expired)
    }
}
