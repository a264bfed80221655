pub mod ledger_service;
pub mod pricing_service;
pub mod refund_service;
pub mod reservation_service;
pub mod settlement_service;
pub mod sweep;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::calendar::InventoryCalendar;
use crate::config::Settings;
use crate::integrations::NotifierManager;
use crate::payments::PaymentGateway;
use crate::repository::*;

pub use ledger_service::PaymentLedger;
pub use pricing_service::{PricingService, Quote, QuoteRequest};
pub use refund_service::RefundService;
pub use reservation_service::ReservationService;
pub use settlement_service::SettlementService;

pub struct ServiceContext {
    pub property_repo: Arc<dyn PropertyRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub coupon_repo: Arc<dyn CouponRepository>,
    pub refund_repo: Arc<dyn RefundRepository>,
    pub settlement_repo: Arc<dyn SettlementRepository>,
    pub calendar: Arc<InventoryCalendar>,
    pub notifier_manager: Arc<NotifierManager>,
    pub pricing_service: Arc<PricingService>,
    pub ledger: Arc<PaymentLedger>,
    pub settlement_service: Arc<SettlementService>,
    pub refund_service: Arc<RefundService>,
    pub reservation_service: Arc<ReservationService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        gateway: Arc<dyn PaymentGateway>,
        notifier_manager: Arc<NotifierManager>,
        settings: &Settings,
    ) -> Self {
        let property_repo: Arc<dyn PropertyRepository> =
            Arc::new(SqlitePropertyRepository::new(db_pool.clone()));
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let coupon_repo: Arc<dyn CouponRepository> =
            Arc::new(SqliteCouponRepository::new(db_pool.clone()));
        let refund_repo: Arc<dyn RefundRepository> =
            Arc::new(SqliteRefundRepository::new(db_pool.clone()));
        let settlement_repo: Arc<dyn SettlementRepository> =
            Arc::new(SqliteSettlementRepository::new(db_pool.clone()));

        let calendar = Arc::new(InventoryCalendar::new(
            booking_repo.clone(),
            settings.booking.hold_ttl_minutes,
        ));

        let pricing_service = Arc::new(PricingService::new(
            property_repo.clone(),
            booking_repo.clone(),
            coupon_repo.clone(),
        ));

        let ledger = Arc::new(PaymentLedger::new(
            payment_repo.clone(),
            refund_repo.clone(),
            gateway,
        ));

        let settlement_service = Arc::new(SettlementService::new(
            settlement_repo.clone(),
            booking_repo.clone(),
            property_repo.clone(),
            ledger.clone(),
            notifier_manager.clone(),
            settings.settlement.platform_fee_pct,
        ));

        let refund_service = Arc::new(RefundService::new(
            refund_repo.clone(),
            booking_repo.clone(),
            ledger.clone(),
            settlement_service.clone(),
            notifier_manager.clone(),
        ));

        let reservation_service = Arc::new(ReservationService::new(
            booking_repo.clone(),
            coupon_repo.clone(),
            refund_repo.clone(),
            calendar.clone(),
            ledger.clone(),
            refund_service.clone(),
            settlement_service.clone(),
            notifier_manager.clone(),
            settings.booking.clone(),
        ));

        Self {
            property_repo,
            booking_repo,
            payment_repo,
            coupon_repo,
            refund_repo,
            settlement_repo,
            calendar,
            notifier_manager,
            pricing_service,
            ledger,
            settlement_service,
            refund_service,
            reservation_service,
            db_pool,
        }
    }
}
