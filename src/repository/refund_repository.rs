use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Refund, RefundTicket, TicketStatus},
    error::{AppError, Result},
    repository::RefundRepository,
};

#[derive(FromRow)]
struct TicketRow {
    id: String,
    booking_id: String,
    raised_by: String,
    reason: String,
    requested_cents: i64,
    approved_cents: Option<i64>,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RefundRow {
    id: String,
    ticket_id: String,
    booking_id: String,
    amount_cents: i64,
    gateway_ref: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteRefundRepository {
    pool: SqlitePool,
}

impl SqliteRefundRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_status(s: &str) -> Result<TicketStatus> {
        match s {
            "Open" => Ok(TicketStatus::Open),
            "Approved" => Ok(TicketStatus::Approved),
            "Rejected" => Ok(TicketStatus::Rejected),
            "Executed" => Ok(TicketStatus::Executed),
            _ => Err(AppError::Database(format!("Invalid ticket status: {}", s))),
        }
    }

    fn status_to_str(status: &TicketStatus) -> &'static str {
        match status {
            TicketStatus::Open => "Open",
            TicketStatus::Approved => "Approved",
            TicketStatus::Rejected => "Rejected",
            TicketStatus::Executed => "Executed",
        }
    }

    fn row_to_ticket(row: TicketRow) -> Result<RefundTicket> {
        Ok(RefundTicket {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            raised_by: Uuid::parse_str(&row.raised_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            reason: row.reason,
            requested_cents: row.requested_cents,
            approved_cents: row.approved_cents,
            status: Self::parse_status(&row.status)?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_refund(row: RefundRow) -> Result<Refund> {
        Ok(Refund {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            ticket_id: Uuid::parse_str(&row.ticket_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount_cents: row.amount_cents,
            gateway_ref: row.gateway_ref,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl RefundRepository for SqliteRefundRepository {
    async fn create_ticket(&self, ticket: RefundTicket) -> Result<RefundTicket> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO refund_tickets (
                id, booking_id, raised_by, reason, requested_cents,
                approved_cents, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(ticket.booking_id.to_string())
        .bind(ticket.raised_by.to_string())
        .bind(&ticket.reason)
        .bind(ticket.requested_cents)
        .bind(ticket.approved_cents)
        .bind(Self::status_to_str(&ticket.status))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_ticket(ticket.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created ticket".to_string()))
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<RefundTicket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, booking_id, raised_by, reason, requested_cents,
                   approved_cents, status, created_at, updated_at
            FROM refund_tickets
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_ticket(r)?)),
            None => Ok(None),
        }
    }

    async fn update_ticket(
        &self,
        id: Uuid,
        status: TicketStatus,
        approved_cents: Option<i64>,
    ) -> Result<RefundTicket> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE refund_tickets
            SET status = ?,
                approved_cents = COALESCE(?, approved_cents),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Self::status_to_str(&status))
        .bind(approved_cents)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Refund ticket not found".to_string()))
    }

    async fn list_tickets_by_booking(&self, booking_id: Uuid) -> Result<Vec<RefundTicket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, booking_id, raised_by, reason, requested_cents,
                   approved_cents, status, created_at, updated_at
            FROM refund_tickets
            WHERE booking_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn has_open_ticket(&self, booking_id: Uuid) -> Result<bool> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM refund_tickets
            WHERE booking_id = ? AND status IN ('Open', 'Approved')
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn create_refund(&self, refund: Refund) -> Result<Refund> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO refunds (
                id, ticket_id, booking_id, amount_cents, gateway_ref, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(refund.id.to_string())
        .bind(refund.ticket_id.to_string())
        .bind(refund.booking_id.to_string())
        .bind(refund.amount_cents)
        .bind(&refund.gateway_ref)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Refund {
            created_at: DateTime::from_naive_utc_and_offset(now, Utc),
            ..refund
        })
    }

    async fn list_refunds_by_booking(&self, booking_id: Uuid) -> Result<Vec<Refund>> {
        let rows = sqlx::query_as::<_, RefundRow>(
            r#"
            SELECT id, ticket_id, booking_id, amount_cents, gateway_ref, created_at
            FROM refunds
            WHERE booking_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_refund).collect()
    }

    async fn sum_refunded(&self, booking_id: Uuid) -> Result<i64> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM refunds WHERE booking_id = ?",
        )
        .bind(booking_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(total.0)
    }
}
