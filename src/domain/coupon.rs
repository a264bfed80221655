use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiscountType {
    /// `value` is a whole percentage of the base amount.
    Percentage,
    /// `value` is an absolute amount in cents.
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    pub min_spend_cents: i64,
    pub global_limit: Option<i64>,
    pub per_user_limit: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn window_covers(&self, at: DateTime<Utc>) -> bool {
        self.active && self.valid_from <= at && at <= self.valid_until
    }
}

/// The discount actually applied to a booking, frozen at quote time.
/// Editing the coupon afterwards never changes an existing application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponApplication {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_cents: i64,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 40))]
    pub code: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 1))]
    pub value: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub min_spend_cents: i64,
    pub global_limit: Option<i64>,
    pub per_user_limit: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCouponRequest {
    pub value: Option<i64>,
    pub min_spend_cents: Option<i64>,
    pub global_limit: Option<Option<i64>>,
    pub per_user_limit: Option<Option<i64>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub active: Option<bool>,
}
