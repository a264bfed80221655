use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{HostEarning, HostPayout, PayoutStatus},
    error::{AppError, Result},
    repository::SettlementRepository,
};

#[derive(FromRow)]
struct EarningRow {
    id: String,
    booking_id: String,
    host_id: String,
    gross_cents: i64,
    platform_fee_cents: i64,
    refunded_cents: i64,
    net_cents: i64,
    payout_id: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PayoutRow {
    id: String,
    host_id: String,
    total_cents: i64,
    status: String,
    period_end: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const EARNING_COLUMNS: &str = r#"
    id, booking_id, host_id, gross_cents, platform_fee_cents,
    refunded_cents, net_cents, payout_id, created_at, updated_at
"#;

pub struct SqliteSettlementRepository {
    pool: SqlitePool,
}

impl SqliteSettlementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
    }

    fn parse_payout_status(s: &str) -> Result<PayoutStatus> {
        match s {
            "Pending" => Ok(PayoutStatus::Pending),
            "Paid" => Ok(PayoutStatus::Paid),
            "Failed" => Ok(PayoutStatus::Failed),
            _ => Err(AppError::Database(format!("Invalid payout status: {}", s))),
        }
    }

    fn payout_status_to_str(status: &PayoutStatus) -> &'static str {
        match status {
            PayoutStatus::Pending => "Pending",
            PayoutStatus::Paid => "Paid",
            PayoutStatus::Failed => "Failed",
        }
    }

    fn row_to_earning(row: EarningRow) -> Result<HostEarning> {
        Ok(HostEarning {
            id: Self::parse_uuid(&row.id)?,
            booking_id: Self::parse_uuid(&row.booking_id)?,
            host_id: Self::parse_uuid(&row.host_id)?,
            gross_cents: row.gross_cents,
            platform_fee_cents: row.platform_fee_cents,
            refunded_cents: row.refunded_cents,
            net_cents: row.net_cents,
            payout_id: row.payout_id.as_deref().map(Self::parse_uuid).transpose()?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_payout(row: PayoutRow) -> Result<HostPayout> {
        Ok(HostPayout {
            id: Self::parse_uuid(&row.id)?,
            host_id: Self::parse_uuid(&row.host_id)?,
            total_cents: row.total_cents,
            status: Self::parse_payout_status(&row.status)?,
            period_end: row
                .period_end
                .parse::<NaiveDate>()
                .map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl SettlementRepository for SqliteSettlementRepository {
    async fn upsert_earning(&self, earning: HostEarning) -> Result<HostEarning> {
        let now = Utc::now().naive_utc();

        // Accrual idempotency lives here: booking_id is UNIQUE, so a second
        // accrue refreshes the amounts instead of adding a row. payout_id is
        // left untouched on conflict.
        sqlx::query(
            r#"
            INSERT INTO host_earnings (
                id, booking_id, host_id, gross_cents, platform_fee_cents,
                refunded_cents, net_cents, payout_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            ON CONFLICT(booking_id) DO UPDATE SET
                gross_cents = excluded.gross_cents,
                platform_fee_cents = excluded.platform_fee_cents,
                refunded_cents = excluded.refunded_cents,
                net_cents = excluded.net_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(earning.id.to_string())
        .bind(earning.booking_id.to_string())
        .bind(earning.host_id.to_string())
        .bind(earning.gross_cents)
        .bind(earning.platform_fee_cents)
        .bind(earning.refunded_cents)
        .bind(earning.net_cents)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_earning_by_booking(earning.booking_id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve accrued earning".to_string()))
    }

    async fn find_earning_by_booking(&self, booking_id: Uuid) -> Result<Option<HostEarning>> {
        let row = sqlx::query_as::<_, EarningRow>(&format!(
            "SELECT {} FROM host_earnings WHERE booking_id = ?",
            EARNING_COLUMNS
        ))
        .bind(booking_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_earning(r)?)),
            None => Ok(None),
        }
    }

    async fn update_earning_amounts(
        &self,
        booking_id: Uuid,
        refunded_cents: i64,
        net_cents: i64,
    ) -> Result<HostEarning> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE host_earnings
            SET refunded_cents = ?, net_cents = ?, updated_at = ?
            WHERE booking_id = ?
            "#,
        )
        .bind(refunded_cents)
        .bind(net_cents)
        .bind(now)
        .bind(booking_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_earning_by_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Host earning not found".to_string()))
    }

    async fn list_earnings_by_host(&self, host_id: Uuid) -> Result<Vec<HostEarning>> {
        let rows = sqlx::query_as::<_, EarningRow>(&format!(
            "SELECT {} FROM host_earnings WHERE host_id = ? ORDER BY created_at DESC",
            EARNING_COLUMNS
        ))
        .bind(host_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_earning).collect()
    }

    async fn list_unattached(&self, host_id: Uuid, cutoff: NaiveDate) -> Result<Vec<HostEarning>> {
        let rows = sqlx::query_as::<_, EarningRow>(&format!(
            r#"
            SELECT {}
            FROM host_earnings
            WHERE host_id = ? AND payout_id IS NULL AND DATE(created_at) <= ?
            ORDER BY created_at ASC
            "#,
            EARNING_COLUMNS
        ))
        .bind(host_id.to_string())
        .bind(cutoff.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_earning).collect()
    }

    async fn create_payout(&self, payout: HostPayout, earning_ids: &[Uuid]) -> Result<HostPayout> {
        let now = Utc::now().naive_utc();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO host_payouts (
                id, host_id, total_cents, status, period_end, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payout.id.to_string())
        .bind(payout.host_id.to_string())
        .bind(payout.total_cents)
        .bind(Self::payout_status_to_str(&payout.status))
        .bind(payout.period_end.to_string())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        for earning_id in earning_ids {
            sqlx::query(
                "UPDATE host_earnings SET payout_id = ?, updated_at = ? WHERE id = ?",
            )
            .bind(payout.id.to_string())
            .bind(now)
            .bind(earning_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_payout(payout.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created payout".to_string()))
    }

    async fn find_payout(&self, id: Uuid) -> Result<Option<HostPayout>> {
        let row = sqlx::query_as::<_, PayoutRow>(
            r#"
            SELECT id, host_id, total_cents, status, period_end, created_at, updated_at
            FROM host_payouts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payout(r)?)),
            None => Ok(None),
        }
    }

    async fn update_payout_status(&self, id: Uuid, status: PayoutStatus) -> Result<HostPayout> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            "UPDATE host_payouts SET status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(Self::payout_status_to_str(&status))
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_payout(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payout not found".to_string()))
    }

    async fn detach_earnings(&self, payout_id: Uuid) -> Result<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            "UPDATE host_earnings SET payout_id = NULL, updated_at = ? WHERE payout_id = ?",
        )
        .bind(now)
        .bind(payout_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
