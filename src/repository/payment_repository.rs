use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Payment, PaymentMethod, PaymentStatus},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    booking_id: String,
    amount_cents: i64,
    method: String,
    status: String,
    gateway_ref: Option<String>,
    decline_reason: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount_cents: row.amount_cents,
            method: Self::parse_method(&row.method)?,
            status: Self::parse_status(&row.status)?,
            gateway_ref: row.gateway_ref,
            decline_reason: row.decline_reason,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "Succeeded" => Ok(PaymentStatus::Succeeded),
            "Failed" => Ok(PaymentStatus::Failed),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn status_to_str(status: &PaymentStatus) -> &'static str {
        match status {
            PaymentStatus::Succeeded => "Succeeded",
            PaymentStatus::Failed => "Failed",
        }
    }

    fn parse_method(s: &str) -> Result<PaymentMethod> {
        match s {
            "Card" => Ok(PaymentMethod::Card),
            "Manual" => Ok(PaymentMethod::Manual),
            _ => Err(AppError::Database(format!("Invalid payment method: {}", s))),
        }
    }

    fn method_to_str(method: &PaymentMethod) -> &'static str {
        match method {
            PaymentMethod::Card => "Card",
            PaymentMethod::Manual => "Manual",
        }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, booking_id, amount_cents, method, status,
                gateway_ref, decline_reason, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(payment.booking_id.to_string())
        .bind(payment.amount_cents)
        .bind(Self::method_to_str(&payment.method))
        .bind(Self::status_to_str(&payment.status))
        .bind(&payment.gateway_ref)
        .bind(&payment.decline_reason)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Payment {
            created_at: DateTime::from_naive_utc_and_offset(now, Utc),
            ..payment
        })
    }

    async fn list_by_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, amount_cents, method, status,
                   gateway_ref, decline_reason, created_at
            FROM payments
            WHERE booking_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn sum_succeeded(&self, booking_id: Uuid) -> Result<i64> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM payments
            WHERE booking_id = ? AND status = 'Succeeded'
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(total.0)
    }
}
