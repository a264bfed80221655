use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{
        Booking, BookingStatus, Coupon, CouponApplication, DiscountType, StayRange,
    },
    error::{AppError, Result},
    repository::{BookingRepository, CouponRepository, PropertyRepository},
};

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub room_type_id: Uuid,
    pub guest_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupancy: i32,
    pub coupon_code: Option<String>,
}

/// A priced stay, persisted as a booking in status `Quoted`. The coupon
/// discount is frozen into the application row at this point; later coupon
/// edits never reach it.
#[derive(Debug, Clone)]
pub struct Quote {
    pub booking: Booking,
    pub coupon: Option<CouponApplication>,
}

pub struct PricingService {
    properties: Arc<dyn PropertyRepository>,
    bookings: Arc<dyn BookingRepository>,
    coupons: Arc<dyn CouponRepository>,
}

/// Percent of an amount, rounded half-up to the smallest currency unit.
pub(crate) fn pct_of(amount_cents: i64, percent: i64) -> i64 {
    (amount_cents * percent + 50) / 100
}

impl PricingService {
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        bookings: Arc<dyn BookingRepository>,
        coupons: Arc<dyn CouponRepository>,
    ) -> Self {
        Self {
            properties,
            bookings,
            coupons,
        }
    }

    pub async fn quote(&self, req: QuoteRequest) -> Result<Quote> {
        let room_type = self
            .properties
            .find_room_type(req.room_type_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Room type not found".to_string()))?;

        let range = StayRange::new(req.check_in, req.check_out).ok_or_else(|| {
            AppError::QuoteRejected("Check-out must be after check-in".to_string())
        })?;

        if req.occupancy < 1 {
            return Err(AppError::QuoteRejected(
                "Occupancy must be at least 1".to_string(),
            ));
        }
        if req.occupancy > room_type.capacity {
            return Err(AppError::QuoteRejected(format!(
                "Room type sleeps at most {}",
                room_type.capacity
            )));
        }

        let base_cents = room_type.base_rate_cents * range.nights();
        let fees_cents = room_type.cleaning_fee_cents;

        let evaluated = match req.coupon_code.as_deref() {
            Some(code) => Some(
                self.evaluate_coupon(code, req.guest_id, base_cents)
                    .await?,
            ),
            None => None,
        };

        // Discount clamps against the base so the total can never go
        // negative; fees are charged on top of the discounted base.
        let discount_cents = evaluated
            .as_ref()
            .map(|(_, d)| (*d).min(base_cents))
            .unwrap_or(0);
        let total_cents = base_cents - discount_cents + fees_cents;

        let now = Utc::now();
        let booking = self
            .bookings
            .create(Booking {
                id: Uuid::new_v4(),
                room_type_id: room_type.id,
                guest_id: req.guest_id,
                check_in: range.check_in,
                check_out: range.check_out,
                occupancy: req.occupancy,
                status: BookingStatus::Quoted,
                base_cents,
                discount_cents,
                fees_cents,
                total_cents,
                hold_expires_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        let coupon = match evaluated {
            Some((coupon, _)) => Some(
                self.coupons
                    .create_application(CouponApplication {
                        id: Uuid::new_v4(),
                        booking_id: booking.id,
                        coupon_id: coupon.id,
                        code: coupon.code.clone(),
                        discount_cents,
                        applied_at: now,
                    })
                    .await?,
            ),
            None => None,
        };

        tracing::debug!(
            booking_id = %booking.id,
            total_cents,
            discount_cents,
            "quote issued"
        );

        Ok(Quote { booking, coupon })
    }

    /// Validation order is fixed: existence, validity window, global limit,
    /// per-user limit, minimum spend. The first failing check names the
    /// rejection so the UI can render an actionable message.
    async fn evaluate_coupon(
        &self,
        code: &str,
        guest_id: Uuid,
        base_cents: i64,
    ) -> Result<(Coupon, i64)> {
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::QuoteRejected(format!("Coupon '{}' does not exist", code)))?;

        if !coupon.window_covers(Utc::now()) {
            return Err(AppError::QuoteRejected(format!(
                "Coupon '{}' is not currently active",
                code
            )));
        }

        if let Some(limit) = coupon.global_limit {
            if self.coupons.global_usage(coupon.id).await? >= limit {
                return Err(AppError::QuoteRejected(format!(
                    "Coupon '{}' usage limit reached",
                    code
                )));
            }
        }

        if let Some(limit) = coupon.per_user_limit {
            if self.coupons.user_usage(coupon.id, guest_id).await? >= limit {
                return Err(AppError::QuoteRejected(format!(
                    "Coupon '{}' usage limit reached for this account",
                    code
                )));
            }
        }

        if base_cents < coupon.min_spend_cents {
            return Err(AppError::QuoteRejected(format!(
                "Coupon '{}' requires a minimum spend of {} cents",
                code, coupon.min_spend_cents
            )));
        }

        let discount = match coupon.discount_type {
            DiscountType::Percentage => pct_of(base_cents, coupon.value),
            DiscountType::Fixed => coupon.value,
        };

        Ok((coupon, discount))
    }
}

#[cfg(test)]
mod tests {
    use super::pct_of;

    #[test]
    fn percentage_rounds_half_up_to_the_cent() {
        assert_eq!(pct_of(30_000, 10), 3_000);
        // 13% of 999 = 129.87 -> 130
        assert_eq!(pct_of(999, 13), 130);
        // exact half rounds up: 15% of 30 = 4.5 -> 5
        assert_eq!(pct_of(30, 15), 5);
        // just under half rounds down: 11% of 31 = 3.41 -> 3
        assert_eq!(pct_of(31, 11), 3);
    }
}
