use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod coupon_repository;
pub mod payment_repository;
pub mod property_repository;
pub mod refund_repository;
pub mod settlement_repository;

pub use booking_repository::SqliteBookingRepository;
pub use coupon_repository::SqliteCouponRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use property_repository::SqlitePropertyRepository;
pub use refund_repository::SqliteRefundRepository;
pub use settlement_repository::SqliteSettlementRepository;

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create_property(&self, req: CreatePropertyRequest) -> Result<Property>;
    async fn find_property(&self, id: Uuid) -> Result<Option<Property>>;
    /// Deletes the property and everything it owns (room types, amenity
    /// links) in one transaction.
    async fn delete_property(&self, id: Uuid) -> Result<()>;
    async fn create_room_type(&self, req: CreateRoomTypeRequest) -> Result<RoomType>;
    async fn find_room_type(&self, id: Uuid) -> Result<Option<RoomType>>;
    async fn list_room_types(&self, property_id: Uuid) -> Result<Vec<RoomType>>;
    async fn create_amenity(&self, name: &str) -> Result<Amenity>;
    async fn attach_amenity(&self, room_type_id: Uuid, amenity_id: Uuid) -> Result<()>;
    /// Blocked with a conflict while any room type still references it.
    async fn delete_amenity(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: Booking) -> Result<Booking>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn list_by_guest(&self, guest_id: Uuid) -> Result<Vec<Booking>>;
    /// Bookings that occupy the calendar for an overlapping range:
    /// confirmed, or held with an unexpired hold. `exclude` skips the
    /// booking being held itself.
    async fn find_blocking(
        &self,
        room_type_id: Uuid,
        range: &StayRange,
        exclude: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
    async fn mark_held(&self, id: Uuid, hold_expires_at: DateTime<Utc>) -> Result<Booking>;
    async fn list_expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Booking>>;
    async fn list_past_checkout(&self, today: NaiveDate) -> Result<Vec<Booking>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Append-only; there is deliberately no update.
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn list_by_booking(&self, booking_id: Uuid) -> Result<Vec<Payment>>;
    async fn sum_succeeded(&self, booking_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn create(&self, req: CreateCouponRequest) -> Result<Coupon>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Coupon>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>>;
    async fn update(&self, id: Uuid, req: UpdateCouponRequest) -> Result<Coupon>;
    async fn global_usage(&self, coupon_id: Uuid) -> Result<i64>;
    async fn user_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<i64>;
    async fn record_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<()>;
    async fn create_application(&self, app: CouponApplication) -> Result<CouponApplication>;
    async fn find_application(&self, booking_id: Uuid) -> Result<Option<CouponApplication>>;
}

#[async_trait]
pub trait RefundRepository: Send + Sync {
    async fn create_ticket(&self, ticket: RefundTicket) -> Result<RefundTicket>;
    async fn find_ticket(&self, id: Uuid) -> Result<Option<RefundTicket>>;
    async fn update_ticket(
        &self,
        id: Uuid,
        status: TicketStatus,
        approved_cents: Option<i64>,
    ) -> Result<RefundTicket>;
    async fn list_tickets_by_booking(&self, booking_id: Uuid) -> Result<Vec<RefundTicket>>;
    async fn has_open_ticket(&self, booking_id: Uuid) -> Result<bool>;
    /// Append-only, like payments.
    async fn create_refund(&self, refund: Refund) -> Result<Refund>;
    async fn list_refunds_by_booking(&self, booking_id: Uuid) -> Result<Vec<Refund>>;
    async fn sum_refunded(&self, booking_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Keyed by booking id; a second accrual for the same booking updates
    /// the existing row instead of inserting a duplicate.
    async fn upsert_earning(&self, earning: HostEarning) -> Result<HostEarning>;
    async fn find_earning_by_booking(&self, booking_id: Uuid) -> Result<Option<HostEarning>>;
    async fn update_earning_amounts(
        &self,
        booking_id: Uuid,
        refunded_cents: i64,
        net_cents: i64,
    ) -> Result<HostEarning>;
    async fn list_earnings_by_host(&self, host_id: Uuid) -> Result<Vec<HostEarning>>;
    async fn list_unattached(&self, host_id: Uuid, cutoff: NaiveDate) -> Result<Vec<HostEarning>>;
    /// Creates the payout and attaches the given earnings to it atomically.
    async fn create_payout(&self, payout: HostPayout, earning_ids: &[Uuid]) -> Result<HostPayout>;
    async fn find_payout(&self, id: Uuid) -> Result<Option<HostPayout>>;
    async fn update_payout_status(&self, id: Uuid, status: PayoutStatus) -> Result<HostPayout>;
    /// Frees a failed payout's earnings so the next batch retries them.
    async fn detach_earnings(&self, payout_id: Uuid) -> Result<()>;
}
