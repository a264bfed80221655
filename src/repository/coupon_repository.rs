use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        Coupon, CouponApplication, CreateCouponRequest, DiscountType, UpdateCouponRequest,
    },
    error::{AppError, Result},
    repository::CouponRepository,
};

#[derive(FromRow)]
struct CouponRow {
    id: String,
    code: String,
    discount_type: String,
    value: i64,
    min_spend_cents: i64,
    global_limit: Option<i64>,
    per_user_limit: Option<i64>,
    valid_from: NaiveDateTime,
    valid_until: NaiveDateTime,
    active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct ApplicationRow {
    id: String,
    booking_id: String,
    coupon_id: String,
    code: String,
    discount_cents: i64,
    applied_at: NaiveDateTime,
}

const COUPON_COLUMNS: &str = r#"
    id, code, discount_type, value, min_spend_cents,
    global_limit, per_user_limit, valid_from, valid_until, active,
    created_at, updated_at
"#;

pub struct SqliteCouponRepository {
    pool: SqlitePool,
}

impl SqliteCouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_discount_type(s: &str) -> Result<DiscountType> {
        match s {
            "Percentage" => Ok(DiscountType::Percentage),
            "Fixed" => Ok(DiscountType::Fixed),
            _ => Err(AppError::Database(format!("Invalid discount type: {}", s))),
        }
    }

    fn discount_type_to_str(t: &DiscountType) -> &'static str {
        match t {
            DiscountType::Percentage => "Percentage",
            DiscountType::Fixed => "Fixed",
        }
    }

    fn row_to_coupon(row: CouponRow) -> Result<Coupon> {
        Ok(Coupon {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            code: row.code,
            discount_type: Self::parse_discount_type(&row.discount_type)?,
            value: row.value,
            min_spend_cents: row.min_spend_cents,
            global_limit: row.global_limit,
            per_user_limit: row.per_user_limit,
            valid_from: DateTime::from_naive_utc_and_offset(row.valid_from, Utc),
            valid_until: DateTime::from_naive_utc_and_offset(row.valid_until, Utc),
            active: row.active,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_application(row: ApplicationRow) -> Result<CouponApplication> {
        Ok(CouponApplication {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            booking_id: Uuid::parse_str(&row.booking_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            coupon_id: Uuid::parse_str(&row.coupon_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            code: row.code,
            discount_cents: row.discount_cents,
            applied_at: DateTime::from_naive_utc_and_offset(row.applied_at, Utc),
        })
    }
}

#[async_trait]
impl CouponRepository for SqliteCouponRepository {
    async fn create(&self, req: CreateCouponRequest) -> Result<Coupon> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, value, min_spend_cents,
                global_limit, per_user_limit, valid_from, valid_until,
                active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&req.code)
        .bind(Self::discount_type_to_str(&req.discount_type))
        .bind(req.value)
        .bind(req.min_spend_cents)
        .bind(req.global_limit)
        .bind(req.per_user_limit)
        .bind(req.valid_from.naive_utc())
        .bind(req.valid_until.naive_utc())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created coupon".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {} FROM coupons WHERE id = ?",
            COUPON_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_coupon(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {} FROM coupons WHERE code = ?",
            COUPON_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_coupon(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, req: UpdateCouponRequest) -> Result<Coupon> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

        let value = req.value.unwrap_or(existing.value);
        let min_spend = req.min_spend_cents.unwrap_or(existing.min_spend_cents);
        let global_limit = req.global_limit.unwrap_or(existing.global_limit);
        let per_user_limit = req.per_user_limit.unwrap_or(existing.per_user_limit);
        let valid_until = req.valid_until.unwrap_or(existing.valid_until);
        let active = req.active.unwrap_or(existing.active);
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE coupons
            SET value = ?, min_spend_cents = ?, global_limit = ?,
                per_user_limit = ?, valid_until = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(value)
        .bind(min_spend)
        .bind(global_limit)
        .bind(per_user_limit)
        .bind(valid_until.naive_utc())
        .bind(active)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated coupon".to_string()))
    }

    async fn global_usage(&self, coupon_id: Uuid) -> Result<i64> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(uses), 0) FROM coupon_usages WHERE coupon_id = ?",
        )
        .bind(coupon_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(total.0)
    }

    async fn user_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<i64> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(uses), 0) FROM coupon_usages WHERE coupon_id = ? AND user_id = ?",
        )
        .bind(coupon_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(total.0)
    }

    async fn record_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO coupon_usages (coupon_id, user_id, uses, updated_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(coupon_id, user_id)
            DO UPDATE SET uses = uses + 1, updated_at = excluded.updated_at
            "#,
        )
        .bind(coupon_id.to_string())
        .bind(user_id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn create_application(&self, app: CouponApplication) -> Result<CouponApplication> {
        sqlx::query(
            r#"
            INSERT INTO coupon_applications (
                id, booking_id, coupon_id, code, discount_cents, applied_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(app.id.to_string())
        .bind(app.booking_id.to_string())
        .bind(app.coupon_id.to_string())
        .bind(&app.code)
        .bind(app.discount_cents)
        .bind(app.applied_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(app)
    }

    async fn find_application(&self, booking_id: Uuid) -> Result<Option<CouponApplication>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, booking_id, coupon_id, code, discount_cents, applied_at
            FROM coupon_applications
            WHERE booking_id = ?
            "#,
        )
        .bind(booking_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_application(r)?)),
            None => Ok(None),
        }
    }
}
