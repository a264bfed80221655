use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStatus, StayRange},
    error::{AppError, Result},
    repository::BookingRepository,
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    room_type_id: String,
    guest_id: String,
    check_in: String,
    check_out: String,
    occupancy: i32,
    status: String,
    base_cents: i64,
    discount_cents: i64,
    fees_cents: i64,
    total_cents: i64,
    hold_expires_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const BOOKING_COLUMNS: &str = r#"
    id, room_type_id, guest_id, check_in, check_out, occupancy, status,
    base_cents, discount_cents, fees_cents, total_cents,
    hold_expires_at, created_at, updated_at
"#;

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
    }

    fn parse_date(s: &str) -> Result<NaiveDate> {
        s.parse()
            .map_err(|e: chrono::ParseError| AppError::Database(e.to_string()))
    }

    fn parse_status(s: &str) -> Result<BookingStatus> {
        match s {
            "Quoted" => Ok(BookingStatus::Quoted),
            "Held" => Ok(BookingStatus::Held),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Completed" => Ok(BookingStatus::Completed),
            "Expired" => Ok(BookingStatus::Expired),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(AppError::Database(format!("Invalid booking status: {}", s))),
        }
    }

    fn status_to_str(status: &BookingStatus) -> &'static str {
        match status {
            BookingStatus::Quoted => "Quoted",
            BookingStatus::Held => "Held",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
            BookingStatus::Expired => "Expired",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: Self::parse_uuid(&row.id)?,
            room_type_id: Self::parse_uuid(&row.room_type_id)?,
            guest_id: Self::parse_uuid(&row.guest_id)?,
            check_in: Self::parse_date(&row.check_in)?,
            check_out: Self::parse_date(&row.check_out)?,
            occupancy: row.occupancy,
            status: Self::parse_status(&row.status)?,
            base_cents: row.base_cents,
            discount_cents: row.discount_cents,
            fees_cents: row.fees_cents,
            total_cents: row.total_cents,
            hold_expires_at: row
                .hold_expires_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, room_type_id, guest_id, check_in, check_out, occupancy,
                status, base_cents, discount_cents, fees_cents, total_cents,
                hold_expires_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.id.to_string())
        .bind(booking.room_type_id.to_string())
        .bind(booking.guest_id.to_string())
        .bind(booking.check_in.to_string())
        .bind(booking.check_out.to_string())
        .bind(booking.occupancy)
        .bind(Self::status_to_str(&booking.status))
        .bind(booking.base_cents)
        .bind(booking.discount_cents)
        .bind(booking.fees_cents)
        .bind(booking.total_cents)
        .bind(booking.hold_expires_at.map(|dt| dt.naive_utc()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(booking.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created booking".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            BOOKING_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_guest(&self, guest_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE guest_id = ? ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(guest_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn find_blocking(
        &self,
        room_type_id: Uuid,
        range: &StayRange,
        exclude: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        // Half-open overlap: [a,b) clashes with [c,d) iff a < d AND c < b.
        // Holds whose TTL has lapsed stop blocking even before the sweep
        // flips them to Expired.
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE room_type_id = ?
              AND id != ?
              AND check_in < ?
              AND ? < check_out
              AND (
                    status = 'Confirmed'
                 OR (status = 'Held' AND hold_expires_at > ?)
              )
            "#,
            BOOKING_COLUMNS
        ))
        .bind(room_type_id.to_string())
        .bind(exclude.to_string())
        .bind(range.check_out.to_string())
        .bind(range.check_in.to_string())
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Self::status_to_str(&status))
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    async fn mark_held(&self, id: Uuid, hold_expires_at: DateTime<Utc>) -> Result<Booking> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'Held', hold_expires_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(hold_expires_at.naive_utc())
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    async fn list_expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE status = 'Held' AND hold_expires_at <= ?
            "#,
            BOOKING_COLUMNS
        ))
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_past_checkout(&self, today: NaiveDate) -> Result<Vec<Booking>> {
        // Completed rows without an earning are handed back too, so an
        // accrual that failed after the status flip is retried instead of
        // silently dropped.
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE check_out <= ?
              AND (
                    status = 'Confirmed'
                 OR (status = 'Completed'
                     AND id NOT IN (SELECT booking_id FROM host_earnings))
              )
            "#,
            BOOKING_COLUMNS
        ))
        .bind(today.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}
